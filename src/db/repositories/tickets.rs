use crate::db::entities::tickets;
use crate::db::error::RepoError;
use crate::db::repositories::{check_numeric_id, invalid_field, FieldValue};
use chrono::NaiveDateTime;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    Value,
};

/// Mutable columns. `channel_id`, `user_id` and `created_at` are immutable;
/// naming them in an update is an `InvalidField` error.
const MUTABLE_FIELDS: [&str; 4] = ["category_id", "assignee_id", "archived", "close_at"];

#[derive(Clone)]
pub struct TicketRepo {
    db: DatabaseConnection,
}

impl TicketRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn validate(ticket: &tickets::Model) -> Result<(), RepoError> {
        check_numeric_id("channel_id", &ticket.channel_id)?;
        check_numeric_id("user_id", &ticket.user_id)?;
        if let Some(assignee) = &ticket.assignee_id {
            check_numeric_id("assignee_id", assignee)?;
        }
        Ok(())
    }

    pub async fn create(
        &self,
        channel_id: &str,
        category_id: Option<i32>,
        user_id: &str,
        now: NaiveDateTime,
    ) -> Result<tickets::Model, RepoError> {
        check_numeric_id("channel_id", channel_id)?;
        check_numeric_id("user_id", user_id)?;

        let ticket = tickets::ActiveModel {
            channel_id: Set(channel_id.to_string()),
            category_id: Set(category_id),
            user_id: Set(user_id.to_string()),
            assignee_id: Set(None),
            archived: Set(false),
            created_at: Set(now),
            close_at: Set(None),
        };
        Ok(ticket.insert(&self.db).await?)
    }

    pub async fn get(&self, channel_id: &str) -> Result<Option<tickets::Model>, RepoError> {
        let found = tickets::Entity::find_by_id(channel_id).one(&self.db).await?;
        if let Some(ticket) = &found {
            Self::validate(ticket).map_err(|e| RepoError::Corrupt(e.to_string()))?;
        }
        Ok(found)
    }

    /// Applies the named field values to one ticket. Every name is checked
    /// against the allow-list (and its value shape) before anything is
    /// written.
    pub async fn update(
        &self,
        channel_id: &str,
        fields: &[(&str, FieldValue)],
    ) -> Result<(), RepoError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut update =
            tickets::Entity::update_many().filter(tickets::Column::ChannelId.eq(channel_id));

        for (name, value) in fields {
            if !MUTABLE_FIELDS.contains(name) {
                return Err(invalid_field(name));
            }
            let (column, value): (tickets::Column, Value) = match (*name, value) {
                ("category_id", FieldValue::Int(v)) => (
                    tickets::Column::CategoryId,
                    v.map(|x| x as i32).into(),
                ),
                ("assignee_id", FieldValue::Text(v)) => {
                    if let Some(assignee) = v {
                        check_numeric_id("assignee_id", assignee)?;
                    }
                    (tickets::Column::AssigneeId, v.clone().into())
                }
                ("archived", FieldValue::Bool(v)) => (tickets::Column::Archived, (*v).into()),
                ("close_at", FieldValue::Time(v)) => (tickets::Column::CloseAt, (*v).into()),
                // Unknown/immutable name, or a known name with a value of
                // the wrong shape. Either way the caller is broken.
                (other, _) => return Err(invalid_field(other)),
            };
            update = update.col_expr(column, Expr::value(value));
        }

        update.exec(&self.db).await?;
        Ok(())
    }

    /// Explicit moderator action; tickets are never deleted automatically.
    pub async fn delete(&self, channel_id: &str) -> Result<(), RepoError> {
        tickets::Entity::delete_by_id(channel_id).exec(&self.db).await?;
        Ok(())
    }

    /// Tickets whose scheduled close has passed and that are still open.
    /// Runs every sweep tick, backed by the `(archived, close_at)` index.
    pub async fn find_due(&self, now: NaiveDateTime) -> Result<Vec<tickets::Model>, RepoError> {
        Ok(tickets::Entity::find()
            .filter(tickets::Column::Archived.eq(false))
            .filter(tickets::Column::CloseAt.lt(now))
            .order_by_asc(tickets::Column::CloseAt)
            .all(&self.db)
            .await?)
    }

    /// Open tickets referencing a category; used to block category deletion.
    pub async fn count_active_in_category(&self, category_id: i32) -> Result<u64, RepoError> {
        use sea_orm::PaginatorTrait;
        Ok(tickets::Entity::find()
            .filter(tickets::Column::CategoryId.eq(category_id))
            .filter(tickets::Column::Archived.eq(false))
            .count(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, migrations};
    use chrono::{Duration, Utc};

    async fn repo() -> TicketRepo {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        migrations::migrate(&db, -1, migrations::TARGET_VERSION, false, None)
            .await
            .unwrap();
        TicketRepo::new(db)
    }

    fn now() -> chrono::NaiveDateTime {
        use chrono::Timelike;
        // Whole seconds so timestamps survive the TEXT column round trip.
        Utc::now().naive_utc().with_nanosecond(0).unwrap()
    }

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let repo = repo().await;
        let created = repo.create("111222333", Some(1), "444555666", now()).await.unwrap();
        let fetched = repo.get("111222333").await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert!(!fetched.archived);
        assert_eq!(fetched.close_at, None);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let repo = repo().await;
        assert!(repo.get("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_user_id_rejected_without_write() {
        let repo = repo().await;
        let err = repo.create("12345", None, "not-a-number", now()).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(repo.get("12345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_immutable_field_rejected() {
        let repo = repo().await;
        repo.create("12345", None, "67890", now()).await.unwrap();

        let err = repo
            .update("12345", &[("created_at", FieldValue::Time(None))])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(name) if name == "created_at"));

        let err = repo
            .update("12345", &[("user_id", FieldValue::Text(Some("1".into())))])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
    }

    #[tokio::test]
    async fn test_invalid_field_writes_nothing() {
        let repo = repo().await;
        repo.create("12345", None, "67890", now()).await.unwrap();

        // A valid assignment paired with an invalid one must not apply.
        let err = repo
            .update(
                "12345",
                &[
                    ("assignee_id", FieldValue::Text(Some("777".into()))),
                    ("created_at", FieldValue::Time(None)),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
        assert_eq!(repo.get("12345").await.unwrap().unwrap().assignee_id, None);
    }

    #[tokio::test]
    async fn test_assign_and_unassign() {
        let repo = repo().await;
        repo.create("12345", None, "67890", now()).await.unwrap();

        repo.update("12345", &[("assignee_id", FieldValue::Text(Some("777".into())))])
            .await
            .unwrap();
        assert_eq!(
            repo.get("12345").await.unwrap().unwrap().assignee_id.as_deref(),
            Some("777")
        );

        repo.update("12345", &[("assignee_id", FieldValue::Text(None))])
            .await
            .unwrap();
        assert_eq!(repo.get("12345").await.unwrap().unwrap().assignee_id, None);
    }

    #[tokio::test]
    async fn test_due_query_selects_only_open_overdue() {
        let repo = repo().await;
        let t0 = now();

        repo.create("1", None, "10", t0).await.unwrap();
        repo.create("2", None, "10", t0).await.unwrap();
        repo.create("3", None, "10", t0).await.unwrap();

        let past = t0 - Duration::seconds(10);
        let future = t0 + Duration::seconds(10);
        repo.update("1", &[("close_at", FieldValue::Time(Some(past)))]).await.unwrap();
        repo.update(
            "2",
            &[
                ("close_at", FieldValue::Time(Some(past))),
                ("archived", FieldValue::Bool(true)),
            ],
        )
        .await
        .unwrap();
        repo.update("3", &[("close_at", FieldValue::Time(Some(future)))]).await.unwrap();

        let due = repo.find_due(t0).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].channel_id, "1");
    }
}
