use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operator-tunable key/value constants (archive destination, giveaway
/// reaction emoji, ...). Absence of a key is a value, not an error.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "constants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
