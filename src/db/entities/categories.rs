use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named ticket category: emoji tag, optional role allow-list and an
/// ordered list of intake questions. Both lists are stored as JSON.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub emoji: Option<String>,
    pub allowed_roles: Json,
    pub questions: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
