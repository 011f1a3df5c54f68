use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A restriction on a user opening new tickets in a guild.
/// `ends_at = None` means permanent; a past `ends_at` is "due" and the
/// expiry sweep deletes the row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "application_bans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    pub ends_at: Option<DateTime>,
    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
