use crate::db::entities::tickets;
use crate::db::error::RepoError;
use crate::db::repositories::{ConstantRepo, TicketRepo};
use crate::interaction::{ChannelRef, InteractionLayer, UserRef};
use crate::lifecycle::ticket::{decide, state_of, TicketAction, TicketState};
use crate::services::constant_keys;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Archives tickets whose `close_at` has passed.
///
/// The one sweep where failure is retried: the post-condition is "the
/// channel really moved", so nothing commits until the interaction layer
/// succeeded, and a failed ticket keeps its `close_at` for the next tick.
pub struct TicketSweepService {
    tickets: TicketRepo,
    constants: ConstantRepo,
    interaction: Arc<dyn InteractionLayer>,
    interval: Duration,
}

impl TicketSweepService {
    pub fn new(
        tickets: TicketRepo,
        constants: ConstantRepo,
        interaction: Arc<dyn InteractionLayer>,
        interval: Duration,
    ) -> Self {
        Self {
            tickets,
            constants,
            interaction,
            interval,
        }
    }

    pub fn start_runner(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Overdue-ticket sweep started.");
            loop {
                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = shutdown.changed() => {
                        info!("Overdue-ticket sweep stopped.");
                        break;
                    }
                }
                if let Err(e) = self.run_tick(Utc::now().naive_utc()).await {
                    error!("Overdue-ticket sweep tick failed: {e:?}");
                }
            }
        })
    }

    /// One tick. Errors here mean the due-query itself failed; per-item
    /// failures are handled (and logged) inside.
    pub async fn run_tick(&self, now: NaiveDateTime) -> Result<(), RepoError> {
        let due = self.tickets.find_due(now).await?;
        for ticket in due {
            if let Err(e) = self.sweep_one(&ticket, now).await {
                // Leave close_at untouched; the ticket comes back next tick.
                warn!(
                    "Could not archive overdue ticket {}: {e:?}; will retry",
                    ticket.channel_id
                );
            }
        }
        Ok(())
    }

    async fn sweep_one(
        &self,
        due: &tickets::Model,
        now: NaiveDateTime,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Re-check right before acting; the ticket may have been closed,
        // cancelled or archived manually since the fetch.
        let Some(current) = self.tickets.get(&due.channel_id).await? else {
            return Ok(());
        };
        if state_of(&current) != TicketState::PendingClose
            || current.close_at.is_none_or(|at| at >= now)
        {
            return Ok(());
        }

        let decision = decide(&current, TicketAction::Close, now)?;

        let destination = self
            .constants
            .get_parsed::<u64>(constant_keys::ARCHIVE_CATEGORY)
            .await?
            .ok_or("no archive_category constant configured")?;
        let channel = ChannelRef(current.channel_id.parse::<u64>()?);
        let creator = UserRef(current.user_id.parse::<u64>()?);

        // Effects first; the archived flag only commits once the channel
        // actually moved out of sight.
        self.interaction
            .move_channel(channel, ChannelRef(destination))
            .await?;
        self.interaction
            .set_channel_visibility(channel, creator, false)
            .await?;

        self.tickets.update(&current.channel_id, &decision.writes).await?;
        info!("Archived overdue ticket {}", current.channel_id);
        Ok(())
    }
}
