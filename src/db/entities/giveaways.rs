use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One timed prize draw. Read-only after creation except the terminal
/// `ended` flag, which the giveaway sweep sets exactly once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "giveaways")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub message_id: i64,
    pub channel_id: i64,
    pub guild_id: i64,
    pub host_id: i64,
    pub prize: String,
    pub winner_count: i32,
    pub role_id: Option<i64>,
    pub ends_at: DateTime,
    pub ended: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
