use crate::db::entities::tickets;
use crate::db::repositories::FieldValue;
use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Open { assigned: bool },
    PendingClose,
    Archived,
}

pub fn state_of(ticket: &tickets::Model) -> TicketState {
    if ticket.archived {
        TicketState::Archived
    } else if ticket.close_at.is_some() {
        TicketState::PendingClose
    } else {
        TicketState::Open {
            assigned: ticket.assignee_id.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    Assign(String),
    Unassign,
    /// Final warning: schedule automatic archival after the window.
    WarnClose { warning_window: Duration },
    /// Creator responded; the scheduled close is off.
    CancelClose,
    /// Creator confirmed, or the sweep found `close_at` due.
    Close,
    Reopen,
}

impl TicketAction {
    fn name(&self) -> &'static str {
        match self {
            TicketAction::Assign(_) => "assign",
            TicketAction::Unassign => "unassign",
            TicketAction::WarnClose { .. } => "warn-close",
            TicketAction::CancelClose => "cancel-close",
            TicketAction::Close => "close",
            TicketAction::Reopen => "reopen",
        }
    }
}

/// Interaction-layer work a transition requires. Effects run before the
/// writes commit: a ticket only becomes `archived` once its channel really
/// moved, and a reopen only commits once the creator can see the channel
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Relocate the channel to the archive destination and hide it from
    /// the creator.
    ArchiveChannel,
    /// Re-establish creator visibility.
    RestoreVisibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub writes: Vec<(&'static str, FieldValue)>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Error)]
#[error("cannot {action} a ticket in state {state:?}")]
pub struct IllegalTransition {
    pub action: &'static str,
    pub state: TicketState,
}

/// Decides what `action` means for `ticket` right now.
///
/// Callers re-check the entity immediately before committing the writes;
/// between decision and commit another actor may have moved the ticket.
pub fn decide(
    ticket: &tickets::Model,
    action: TicketAction,
    now: NaiveDateTime,
) -> Result<Decision, IllegalTransition> {
    let state = state_of(ticket);
    let illegal = |action: &TicketAction| IllegalTransition {
        action: action.name(),
        state,
    };

    match (&action, state) {
        // Staff can (re)assign any ticket that is not archived.
        (TicketAction::Assign(assignee), TicketState::Open { .. } | TicketState::PendingClose) => {
            Ok(Decision {
                writes: vec![("assignee_id", FieldValue::Text(Some(assignee.clone())))],
                effects: vec![],
            })
        }
        (TicketAction::Unassign, TicketState::Open { .. } | TicketState::PendingClose) => {
            Ok(Decision {
                writes: vec![("assignee_id", FieldValue::Text(None))],
                effects: vec![],
            })
        }
        (TicketAction::WarnClose { warning_window }, TicketState::Open { .. }) => Ok(Decision {
            writes: vec![("close_at", FieldValue::Time(Some(now + *warning_window)))],
            effects: vec![],
        }),
        (TicketAction::CancelClose, TicketState::PendingClose) => Ok(Decision {
            writes: vec![("close_at", FieldValue::Time(None))],
            effects: vec![],
        }),
        (TicketAction::Close, TicketState::PendingClose) => Ok(Decision {
            writes: vec![
                ("archived", FieldValue::Bool(true)),
                ("close_at", FieldValue::Time(None)),
            ],
            effects: vec![Effect::ArchiveChannel],
        }),
        (TicketAction::Reopen, TicketState::Archived) => Ok(Decision {
            writes: vec![("archived", FieldValue::Bool(false))],
            effects: vec![Effect::RestoreVisibility],
        }),
        _ => Err(illegal(&action)),
    }
}
