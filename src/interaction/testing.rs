//! Recording test double for the interaction layer.

use crate::interaction::{
    ChannelRef, GuildRef, InteractionError, InteractionLayer, Message, MessageRef, RoleRef, UserRef,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendMessage { channel: ChannelRef, content: String },
    MoveChannel { channel: ChannelRef, destination: ChannelRef },
    SetVisibility { channel: ChannelRef, user: UserRef, visible: bool },
    DeleteChannel { channel: ChannelRef },
    FetchMessage { channel: ChannelRef, message: MessageRef },
    ListReactors { message: MessageRef, emoji: String },
    GrantRole { guild: GuildRef, user: UserRef, role: RoleRef },
}

#[derive(Default)]
pub struct MockInteraction {
    calls: Mutex<Vec<Call>>,
    fail_move_all: AtomicBool,
    fail_move_channels: Mutex<HashSet<ChannelRef>>,
    fail_send: AtomicBool,
    fail_grant_role: AtomicBool,
    missing_messages: Mutex<HashSet<MessageRef>>,
    reactors: Mutex<HashMap<MessageRef, Vec<UserRef>>>,
}

impl MockInteraction {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendMessage { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn fail_move_channel(&self, fail: bool) {
        self.fail_move_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_move_channel_for(&self, channel: ChannelRef) {
        self.fail_move_channels.lock().unwrap().insert(channel);
    }

    pub fn fail_send_message(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn fail_grant_role(&self, fail: bool) {
        self.fail_grant_role.store(fail, Ordering::SeqCst);
    }

    pub fn set_message_missing(&self, message: MessageRef) {
        self.missing_messages.lock().unwrap().insert(message);
    }

    pub fn set_reactors(&self, message: MessageRef, users: Vec<UserRef>) {
        self.reactors.lock().unwrap().insert(message, users);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InteractionLayer for MockInteraction {
    async fn send_message(
        &self,
        channel: ChannelRef,
        content: &str,
    ) -> Result<(), InteractionError> {
        self.record(Call::SendMessage {
            channel,
            content: content.to_string(),
        });
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(InteractionError::Transport("send failed".into()));
        }
        Ok(())
    }

    async fn move_channel(
        &self,
        channel: ChannelRef,
        destination: ChannelRef,
    ) -> Result<(), InteractionError> {
        self.record(Call::MoveChannel { channel, destination });
        if self.fail_move_all.load(Ordering::SeqCst)
            || self.fail_move_channels.lock().unwrap().contains(&channel)
        {
            return Err(InteractionError::Forbidden);
        }
        Ok(())
    }

    async fn set_channel_visibility(
        &self,
        channel: ChannelRef,
        user: UserRef,
        visible: bool,
    ) -> Result<(), InteractionError> {
        self.record(Call::SetVisibility { channel, user, visible });
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelRef) -> Result<(), InteractionError> {
        self.record(Call::DeleteChannel { channel });
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: ChannelRef,
        message: MessageRef,
    ) -> Result<Option<Message>, InteractionError> {
        self.record(Call::FetchMessage { channel, message });
        if self.missing_messages.lock().unwrap().contains(&message) {
            return Ok(None);
        }
        Ok(Some(Message { channel, id: message }))
    }

    async fn list_reactors(
        &self,
        message: &Message,
        emoji: &str,
    ) -> Result<Vec<UserRef>, InteractionError> {
        self.record(Call::ListReactors {
            message: message.id,
            emoji: emoji.to_string(),
        });
        Ok(self
            .reactors
            .lock()
            .unwrap()
            .get(&message.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn grant_role(
        &self,
        guild: GuildRef,
        user: UserRef,
        role: RoleRef,
    ) -> Result<(), InteractionError> {
        self.record(Call::GrantRole { guild, user, role });
        if self.fail_grant_role.load(Ordering::SeqCst) {
            return Err(InteractionError::Forbidden);
        }
        Ok(())
    }
}
