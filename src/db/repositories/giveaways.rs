use crate::db::entities::giveaways;
use crate::db::error::RepoError;
use crate::db::repositories::{invalid_field, FieldValue};
use chrono::NaiveDateTime;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Everything but the terminal flag is immutable after creation.
const MUTABLE_FIELDS: [&str; 1] = ["ended"];

pub struct NewGiveaway {
    pub message_id: i64,
    pub channel_id: i64,
    pub guild_id: i64,
    pub host_id: i64,
    pub prize: String,
    pub winner_count: i32,
    pub role_id: Option<i64>,
    pub ends_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct GiveawayRepo {
    db: DatabaseConnection,
}

impl GiveawayRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn validate(prize: &str, winner_count: i32) -> Result<(), RepoError> {
        if prize.trim().is_empty() {
            return Err(RepoError::Validation("prize must not be blank".into()));
        }
        if winner_count < 1 {
            return Err(RepoError::Validation(format!(
                "winner_count must be at least 1, got {winner_count}"
            )));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        new: NewGiveaway,
        now: NaiveDateTime,
    ) -> Result<giveaways::Model, RepoError> {
        Self::validate(&new.prize, new.winner_count)?;

        let giveaway = giveaways::ActiveModel {
            message_id: Set(new.message_id),
            channel_id: Set(new.channel_id),
            guild_id: Set(new.guild_id),
            host_id: Set(new.host_id),
            prize: Set(new.prize),
            winner_count: Set(new.winner_count),
            role_id: Set(new.role_id),
            ends_at: Set(new.ends_at),
            ended: Set(false),
            created_at: Set(now),
        };
        Ok(giveaway.insert(&self.db).await?)
    }

    pub async fn get(&self, message_id: i64) -> Result<Option<giveaways::Model>, RepoError> {
        let found = giveaways::Entity::find_by_id(message_id).one(&self.db).await?;
        if let Some(giveaway) = &found {
            Self::validate(&giveaway.prize, giveaway.winner_count)
                .map_err(|e| RepoError::Corrupt(e.to_string()))?;
        }
        Ok(found)
    }

    pub async fn update(
        &self,
        message_id: i64,
        fields: &[(&str, FieldValue)],
    ) -> Result<(), RepoError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut update =
            giveaways::Entity::update_many().filter(giveaways::Column::MessageId.eq(message_id));

        for (name, value) in fields {
            if !MUTABLE_FIELDS.contains(name) {
                return Err(invalid_field(name));
            }
            match (*name, value) {
                ("ended", FieldValue::Bool(v)) => {
                    update = update.col_expr(giveaways::Column::Ended, Expr::value(*v));
                }
                (other, _) => return Err(invalid_field(other)),
            }
        }

        update.exec(&self.db).await?;
        Ok(())
    }

    /// The one legal mutation: `Scheduled -> Ended`, set exactly once.
    pub async fn mark_ended(&self, message_id: i64) -> Result<(), RepoError> {
        self.update(message_id, &[("ended", FieldValue::Bool(true))]).await
    }

    pub async fn delete(&self, message_id: i64) -> Result<(), RepoError> {
        giveaways::Entity::delete_by_id(message_id).exec(&self.db).await?;
        Ok(())
    }

    /// Giveaways whose end time has arrived and that are not yet ended.
    /// Runs every sweep tick, backed by the `(ended, ends_at)` index.
    pub async fn find_due(&self, now: NaiveDateTime) -> Result<Vec<giveaways::Model>, RepoError> {
        Ok(giveaways::Entity::find()
            .filter(giveaways::Column::Ended.eq(false))
            .filter(giveaways::Column::EndsAt.lte(now))
            .order_by_asc(giveaways::Column::EndsAt)
            .all(&self.db)
            .await?)
    }
}
