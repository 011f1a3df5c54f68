use crate::db::entities::application_bans;
use crate::db::error::RepoError;
use crate::db::repositories::{invalid_field, FieldValue};
use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

const MUTABLE_FIELDS: [&str; 2] = ["ends_at", "reason"];

#[derive(Clone)]
pub struct ApplicationBanRepo {
    db: DatabaseConnection,
}

impl ApplicationBanRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert-or-ignore: returns `false` when a ban for `(user_id,
    /// guild_id)` already exists, leaving the existing row untouched.
    pub async fn create(
        &self,
        user_id: i64,
        guild_id: i64,
        ends_at: Option<NaiveDateTime>,
        reason: Option<String>,
    ) -> Result<bool, RepoError> {
        let ban = application_bans::ActiveModel {
            user_id: Set(user_id),
            guild_id: Set(guild_id),
            ends_at: Set(ends_at),
            reason: Set(reason),
        };

        let res = application_bans::Entity::insert(ban)
            .on_conflict(
                OnConflict::columns([
                    application_bans::Column::UserId,
                    application_bans::Column::GuildId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.db)
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Option<application_bans::Model>, RepoError> {
        Ok(application_bans::Entity::find_by_id((user_id, guild_id))
            .one(&self.db)
            .await?)
    }

    pub async fn update(
        &self,
        user_id: i64,
        guild_id: i64,
        fields: &[(&str, FieldValue)],
    ) -> Result<(), RepoError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut update = application_bans::Entity::update_many()
            .filter(application_bans::Column::UserId.eq(user_id))
            .filter(application_bans::Column::GuildId.eq(guild_id));

        for (name, value) in fields {
            if !MUTABLE_FIELDS.contains(name) {
                return Err(invalid_field(name));
            }
            match (*name, value) {
                ("ends_at", FieldValue::Time(v)) => {
                    update = update.col_expr(application_bans::Column::EndsAt, Expr::value(*v));
                }
                ("reason", FieldValue::Text(v)) => {
                    update =
                        update.col_expr(application_bans::Column::Reason, Expr::value(v.clone()));
                }
                (other, _) => return Err(invalid_field(other)),
            }
        }

        update.exec(&self.db).await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: i64, guild_id: i64) -> Result<(), RepoError> {
        application_bans::Entity::delete_by_id((user_id, guild_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Timed bans whose end has passed. Permanent bans (`ends_at IS NULL`)
    /// are never due.
    pub async fn find_expired(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<application_bans::Model>, RepoError> {
        Ok(application_bans::Entity::find()
            .filter(application_bans::Column::EndsAt.is_not_null())
            .filter(application_bans::Column::EndsAt.lt(now))
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, migrations};
    use chrono::{Duration, Utc};

    async fn repo() -> ApplicationBanRepo {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        migrations::migrate(&db, -1, migrations::TARGET_VERSION, false, None)
            .await
            .unwrap();
        ApplicationBanRepo::new(db)
    }

    #[tokio::test]
    async fn test_insert_or_ignore() {
        let repo = repo().await;
        assert!(repo.create(1, 2, None, Some("spam".into())).await.unwrap());
        // Second insert for the same (user, guild) is ignored.
        assert!(!repo.create(1, 2, None, None).await.unwrap());

        let ban = repo.get(1, 2).await.unwrap().unwrap();
        assert_eq!(ban.reason.as_deref(), Some("spam"));
    }

    #[tokio::test]
    async fn test_expiry_query_skips_permanent_bans() {
        let repo = repo().await;
        let now = Utc::now().naive_utc();

        repo.create(1, 10, Some(now - Duration::seconds(1)), None).await.unwrap();
        repo.create(2, 10, None, None).await.unwrap();
        repo.create(3, 10, Some(now + Duration::hours(1)), None).await.unwrap();

        let expired = repo.find_expired(now).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].user_id, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let repo = repo().await;
        repo.create(1, 2, None, None).await.unwrap();
        repo.delete(1, 2).await.unwrap();
        assert!(repo.get(1, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_allow_list() {
        use chrono::Timelike;
        let repo = repo().await;
        let now = Utc::now().naive_utc().with_nanosecond(0).unwrap();
        repo.create(1, 2, None, None).await.unwrap();

        repo.update(1, 2, &[("ends_at", FieldValue::Time(Some(now)))]).await.unwrap();
        assert_eq!(repo.get(1, 2).await.unwrap().unwrap().ends_at, Some(now));

        let err = repo
            .update(1, 2, &[("user_id", FieldValue::Int(Some(9)))])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidField(_)));
    }
}
