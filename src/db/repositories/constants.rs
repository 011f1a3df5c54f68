use crate::db::entities::constants;
use crate::db::error::RepoError;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::str::FromStr;

/// Key/value constants with typed accessors. A missing key is `Ok(None)`;
/// a present value that fails to parse for a typed accessor is a data
/// error, never a silent fallback.
#[derive(Clone)]
pub struct ConstantRepo {
    db: DatabaseConnection,
}

impl ConstantRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepoError> {
        let constant = constants::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };
        constants::Entity::insert(constant)
            .on_conflict(
                OnConflict::column(constants::Column::Key)
                    .update_column(constants::Column::Value)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, RepoError> {
        Ok(constants::Entity::find_by_id(key)
            .one(&self.db)
            .await?
            .map(|c| c.value))
    }

    pub async fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, RepoError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| {
                RepoError::Corrupt(format!("constant {key:?} holds unparsable value {raw:?}: {e}"))
            }),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), RepoError> {
        constants::Entity::delete_by_id(key).exec(&self.db).await?;
        Ok(())
    }
}
