//! Contract with the chat front end.
//!
//! Everything user-facing (commands, buttons, embeds, the messaging
//! transport itself) lives outside this process's core; the sweep workers
//! only ever talk to it through this trait. Production wires in the real
//! chat client, tests wire in a recording double.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod component;
pub mod log_only;
#[cfg(test)]
pub mod testing;

macro_rules! id_newtype {
    ($($name:ident),+) => {$(
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    )+};
}

id_newtype!(ChannelRef, UserRef, GuildRef, RoleRef, MessageRef);

/// A fetched message, just enough identity to list reactions on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: ChannelRef,
    pub id: MessageRef,
}

#[derive(Debug, Error)]
pub enum InteractionError {
    /// The channel/message/role no longer exists.
    #[error("target not found")]
    NotFound,
    /// The bot lacks permission for the operation.
    #[error("operation forbidden")]
    Forbidden,
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait InteractionLayer: Send + Sync {
    async fn send_message(
        &self,
        channel: ChannelRef,
        content: &str,
    ) -> Result<(), InteractionError>;

    async fn move_channel(
        &self,
        channel: ChannelRef,
        destination: ChannelRef,
    ) -> Result<(), InteractionError>;

    async fn set_channel_visibility(
        &self,
        channel: ChannelRef,
        user: UserRef,
        visible: bool,
    ) -> Result<(), InteractionError>;

    async fn delete_channel(&self, channel: ChannelRef) -> Result<(), InteractionError>;

    /// `Ok(None)` when the message is gone; that is an expected state, not
    /// an error.
    async fn fetch_message(
        &self,
        channel: ChannelRef,
        message: MessageRef,
    ) -> Result<Option<Message>, InteractionError>;

    /// Users who reacted with `emoji`, deduplicated, bot accounts already
    /// excluded.
    async fn list_reactors(
        &self,
        message: &Message,
        emoji: &str,
    ) -> Result<Vec<UserRef>, InteractionError>;

    async fn grant_role(
        &self,
        guild: GuildRef,
        user: UserRef,
        role: RoleRef,
    ) -> Result<(), InteractionError>;
}
