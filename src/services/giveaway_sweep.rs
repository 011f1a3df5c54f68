use crate::db::entities::giveaways;
use crate::db::error::RepoError;
use crate::db::repositories::{ConstantRepo, GiveawayRepo};
use crate::interaction::{ChannelRef, GuildRef, InteractionLayer, MessageRef, RoleRef, UserRef};
use crate::lifecycle::giveaway::{decide, Outcome};
use crate::services::{constant_keys, DEFAULT_GIVEAWAY_EMOJI};
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Ends giveaways whose `ends_at` has passed.
///
/// Failure policy is the opposite of the ticket sweep: drawing a giveaway
/// again is not meaningful once attempted, so every side-effect failure is
/// logged and swallowed and `ended` commits unconditionally — even when
/// the channel or message has vanished.
pub struct GiveawaySweepService {
    giveaways: GiveawayRepo,
    constants: ConstantRepo,
    interaction: Arc<dyn InteractionLayer>,
    interval: Duration,
}

impl GiveawaySweepService {
    pub fn new(
        giveaways: GiveawayRepo,
        constants: ConstantRepo,
        interaction: Arc<dyn InteractionLayer>,
        interval: Duration,
    ) -> Self {
        Self {
            giveaways,
            constants,
            interaction,
            interval,
        }
    }

    pub fn start_runner(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Giveaway-end sweep started.");
            loop {
                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = shutdown.changed() => {
                        info!("Giveaway-end sweep stopped.");
                        break;
                    }
                }
                if let Err(e) = self.run_tick(Utc::now().naive_utc()).await {
                    error!("Giveaway-end sweep tick failed: {e:?}");
                }
            }
        })
    }

    pub async fn run_tick(&self, now: NaiveDateTime) -> Result<(), RepoError> {
        let due = self.giveaways.find_due(now).await?;
        for giveaway in due {
            if let Err(e) = self.end_one(&giveaway).await {
                error!("Failed to end giveaway {}: {e:?}", giveaway.message_id);
            }
        }
        Ok(())
    }

    async fn end_one(&self, due: &giveaways::Model) -> Result<(), RepoError> {
        // Someone may have ended it between fetch and action.
        let Some(giveaway) = self.giveaways.get(due.message_id).await? else {
            return Ok(());
        };
        if giveaway.ended {
            return Ok(());
        }

        self.announce_result(&giveaway).await;

        // Terminal, exactly once, no matter what the announcement did.
        self.giveaways.mark_ended(giveaway.message_id).await?;
        info!("Giveaway {} ended", giveaway.message_id);
        Ok(())
    }

    /// Best-effort half of the transition: draw and announce winners and
    /// grant the configured role. Nothing in here blocks `ended`.
    async fn announce_result(&self, giveaway: &giveaways::Model) {
        let channel = ChannelRef(giveaway.channel_id as u64);
        let message_ref = MessageRef(giveaway.message_id as u64);

        let message = match self.interaction.fetch_message(channel, message_ref).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                warn!(
                    "Giveaway {} message is gone; ending without announcement",
                    giveaway.message_id
                );
                return;
            }
            Err(e) => {
                warn!("Could not fetch giveaway {} message: {e}", giveaway.message_id);
                return;
            }
        };

        let emoji = match self.constants.get(constant_keys::GIVEAWAY_EMOJI).await {
            Ok(Some(emoji)) => emoji,
            Ok(None) => DEFAULT_GIVEAWAY_EMOJI.to_string(),
            Err(e) => {
                warn!("Could not read giveaway emoji constant: {e}");
                DEFAULT_GIVEAWAY_EMOJI.to_string()
            }
        };

        let participants = match self.interaction.list_reactors(&message, &emoji).await {
            Ok(participants) => participants,
            Err(e) => {
                warn!("Could not list giveaway {} entrants: {e}", giveaway.message_id);
                return;
            }
        };

        let outcome = decide(&participants, giveaway.winner_count, &mut rand::thread_rng());
        match outcome {
            Outcome::NoParticipants => {
                let text = format!(
                    "No one entered the giveaway for **{}**; no winner could be drawn.",
                    giveaway.prize
                );
                if let Err(e) = self.interaction.send_message(channel, &text).await {
                    warn!("Could not announce empty giveaway {}: {e}", giveaway.message_id);
                }
            }
            Outcome::Winners(winners) => {
                if let Some(role_id) = giveaway.role_id {
                    self.grant_winner_roles(giveaway, role_id, &winners).await;
                }

                let mentions = winners
                    .iter()
                    .map(|w| format!("<@{w}>"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let text = format!(
                    "{emoji} The giveaway for **{}** is over! Congratulations {mentions}!",
                    giveaway.prize
                );
                if let Err(e) = self.interaction.send_message(channel, &text).await {
                    warn!("Could not announce giveaway {} winners: {e}", giveaway.message_id);
                }
            }
        }
    }

    /// Per-winner and best-effort: one forbidden grant neither blocks the
    /// other winners nor the transition.
    async fn grant_winner_roles(
        &self,
        giveaway: &giveaways::Model,
        role_id: i64,
        winners: &[UserRef],
    ) {
        let guild = GuildRef(giveaway.guild_id as u64);
        let role = RoleRef(role_id as u64);
        for winner in winners {
            if let Err(e) = self.interaction.grant_role(guild, *winner, role).await {
                warn!(
                    "Could not grant giveaway role {role} to {winner} for {}: {e}",
                    giveaway.message_id
                );
            }
        }
    }
}
