use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One open support conversation, keyed by its channel.
/// `close_at` non-null means the ticket is scheduled for automatic archival.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: String,
    pub category_id: Option<i32>,
    pub user_id: String,
    pub assignee_id: Option<String>,
    pub archived: bool,
    pub created_at: DateTime,
    pub close_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
