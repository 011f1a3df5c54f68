use crate::db::error::RepoError;
use crate::db::repositories::ApplicationBanRepo;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

/// Deletes timed application bans once `ends_at` has passed. There is no
/// partial state to protect, so the sweep is naturally idempotent;
/// a deletion failure is only logged and the row comes back next tick.
pub struct BanExpiryService {
    bans: ApplicationBanRepo,
    interval: Duration,
}

impl BanExpiryService {
    pub fn new(bans: ApplicationBanRepo, interval: Duration) -> Self {
        Self { bans, interval }
    }

    pub fn start_runner(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Ban-expiry sweep started.");
            loop {
                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = shutdown.changed() => {
                        info!("Ban-expiry sweep stopped.");
                        break;
                    }
                }
                if let Err(e) = self.run_tick(Utc::now().naive_utc()).await {
                    error!("Ban-expiry sweep tick failed: {e:?}");
                }
            }
        })
    }

    pub async fn run_tick(&self, now: NaiveDateTime) -> Result<(), RepoError> {
        let expired = self.bans.find_expired(now).await?;
        for ban in expired {
            info!(
                "Application ban for user {} in guild {} expired",
                ban.user_id, ban.guild_id
            );
            if let Err(e) = self.bans.delete(ban.user_id, ban.guild_id).await {
                error!(
                    "Failed to delete expired ban ({}, {}): {e:?}",
                    ban.user_id, ban.guild_id
                );
            }
        }
        Ok(())
    }
}
