use crate::db::entities::categories;
use crate::db::error::RepoError;
use crate::db::repositories::{invalid_field, FieldValue, TicketRepo};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::json;

const MUTABLE_FIELDS: [&str; 4] = ["name", "emoji", "allowed_roles", "questions"];

/// A category with its JSON list columns decoded into real types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub emoji: Option<String>,
    pub allowed_roles: Vec<i64>,
    pub questions: Vec<String>,
}

impl Category {
    fn from_model(model: categories::Model) -> Result<Self, RepoError> {
        if model.name.trim().is_empty() {
            return Err(RepoError::Corrupt(format!(
                "category {} has a blank name",
                model.id
            )));
        }
        let allowed_roles = serde_json::from_value(model.allowed_roles).map_err(|e| {
            RepoError::Corrupt(format!("category {}: bad allowed_roles: {e}", model.id))
        })?;
        let questions = serde_json::from_value(model.questions).map_err(|e| {
            RepoError::Corrupt(format!("category {}: bad questions: {e}", model.id))
        })?;
        Ok(Self {
            id: model.id,
            name: model.name,
            emoji: model.emoji,
            allowed_roles,
            questions,
        })
    }
}

#[derive(Clone)]
pub struct CategoryRepo {
    db: DatabaseConnection,
}

impl CategoryRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: &str,
        emoji: Option<String>,
        allowed_roles: Vec<i64>,
        questions: Vec<String>,
    ) -> Result<Category, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::Validation("category name must not be blank".into()));
        }

        let category = categories::ActiveModel {
            name: Set(name.to_string()),
            emoji: Set(emoji),
            allowed_roles: Set(json!(allowed_roles)),
            questions: Set(json!(questions)),
            ..Default::default()
        };
        Category::from_model(category.insert(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Category>, RepoError> {
        match categories::Entity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(Category::from_model(model)?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Category>, RepoError> {
        categories::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::from_model)
            .collect()
    }

    pub async fn update(&self, id: i32, fields: &[(&str, FieldValue)]) -> Result<(), RepoError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut update =
            categories::Entity::update_many().filter(categories::Column::Id.eq(id));

        for (name, value) in fields {
            if !MUTABLE_FIELDS.contains(name) {
                return Err(invalid_field(name));
            }
            match (*name, value) {
                ("name", FieldValue::Text(Some(v))) => {
                    if v.trim().is_empty() {
                        return Err(RepoError::Validation(
                            "category name must not be blank".into(),
                        ));
                    }
                    update = update.col_expr(categories::Column::Name, Expr::value(v.clone()));
                }
                ("emoji", FieldValue::Text(v)) => {
                    update = update.col_expr(categories::Column::Emoji, Expr::value(v.clone()));
                }
                ("allowed_roles", FieldValue::Text(Some(v))) => {
                    let roles: Vec<i64> = serde_json::from_str(v)
                        .map_err(|e| RepoError::Validation(format!("bad allowed_roles: {e}")))?;
                    update = update
                        .col_expr(categories::Column::AllowedRoles, Expr::value(json!(roles)));
                }
                ("questions", FieldValue::Text(Some(v))) => {
                    let questions: Vec<String> = serde_json::from_str(v)
                        .map_err(|e| RepoError::Validation(format!("bad questions: {e}")))?;
                    update = update
                        .col_expr(categories::Column::Questions, Expr::value(json!(questions)));
                }
                (other, _) => return Err(invalid_field(other)),
            }
        }

        update.exec(&self.db).await?;
        Ok(())
    }

    /// Deletion is blocked while open tickets still reference the category.
    pub async fn delete(&self, id: i32, tickets: &TicketRepo) -> Result<(), RepoError> {
        let active = tickets.count_active_in_category(id).await?;
        if active > 0 {
            return Err(RepoError::Validation(format!(
                "category {id} still has {active} active ticket(s)"
            )));
        }
        categories::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, migrations};
    use chrono::Utc;

    async fn repos() -> (CategoryRepo, TicketRepo) {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        migrations::migrate(&db, -1, migrations::TARGET_VERSION, false, None)
            .await
            .unwrap();
        (CategoryRepo::new(db.clone()), TicketRepo::new(db))
    }

    #[tokio::test]
    async fn test_round_trip_with_json_lists() {
        let (categories, _) = repos().await;
        let created = categories
            .create(
                "Appeals",
                Some("⚖️".into()),
                vec![1, 2, 3],
                vec!["Why?".into(), "Evidence?".into()],
            )
            .await
            .unwrap();
        let fetched = categories.get(created.id).await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.questions.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (categories, _) = repos().await;
        assert!(matches!(
            categories.create(" ", None, vec![], vec![]).await.unwrap_err(),
            RepoError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_active_ticket() {
        let (categories, tickets) = repos().await;
        let category = categories.create("Support", None, vec![], vec![]).await.unwrap();
        tickets
            .create("123", Some(category.id), "456", Utc::now().naive_utc())
            .await
            .unwrap();

        let err = categories.delete(category.id, &tickets).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(categories.get(category.id).await.unwrap().is_some());

        // Archiving the ticket unblocks deletion.
        tickets
            .update("123", &[("archived", FieldValue::Bool(true))])
            .await
            .unwrap();
        categories.delete(category.id, &tickets).await.unwrap();
        assert!(categories.get(category.id).await.unwrap().is_none());
    }
}
