//! Standalone adapter: logs every requested effect instead of performing
//! it. This is what the shipped binary wires in; an embedding application
//! replaces it with its real chat-client adapter.
//!
//! Sends, moves and grants report success so state transitions proceed;
//! `fetch_message` reports the message as gone, which keeps giveaway
//! endings side-effect free in this mode.

use crate::interaction::{
    ChannelRef, GuildRef, InteractionError, InteractionLayer, Message, MessageRef, RoleRef, UserRef,
};
use async_trait::async_trait;
use tracing::info;

pub struct LogOnlyInteraction;

#[async_trait]
impl InteractionLayer for LogOnlyInteraction {
    async fn send_message(
        &self,
        channel: ChannelRef,
        content: &str,
    ) -> Result<(), InteractionError> {
        info!("[log-only] send to {channel}: {content}");
        Ok(())
    }

    async fn move_channel(
        &self,
        channel: ChannelRef,
        destination: ChannelRef,
    ) -> Result<(), InteractionError> {
        info!("[log-only] move {channel} -> {destination}");
        Ok(())
    }

    async fn set_channel_visibility(
        &self,
        channel: ChannelRef,
        user: UserRef,
        visible: bool,
    ) -> Result<(), InteractionError> {
        info!("[log-only] visibility of {channel} for {user}: {visible}");
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelRef) -> Result<(), InteractionError> {
        info!("[log-only] delete {channel}");
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: ChannelRef,
        message: MessageRef,
    ) -> Result<Option<Message>, InteractionError> {
        info!("[log-only] fetch {message} in {channel}: reporting gone");
        Ok(None)
    }

    async fn list_reactors(
        &self,
        message: &Message,
        _emoji: &str,
    ) -> Result<Vec<UserRef>, InteractionError> {
        info!("[log-only] list reactors on {}", message.id);
        Ok(vec![])
    }

    async fn grant_role(
        &self,
        guild: GuildRef,
        user: UserRef,
        role: RoleRef,
    ) -> Result<(), InteractionError> {
        info!("[log-only] grant {role} to {user} in {guild}");
        Ok(())
    }
}
