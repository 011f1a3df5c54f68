//! Component identity tokens.
//!
//! Interactive components (buttons on a close warning, a reroll button
//! under a giveaway result) outlive the process: after a restart the only
//! thing that comes back with a click is the token the component was
//! created with. The token is therefore a tagged kind plus its constructor
//! arguments, serialized as one compact JSON value, decoded through this
//! one registry. No string concatenation, no positional splitting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    /// "No more questions" on a close warning; archives the ticket.
    CloseConfirm { channel_id: String },
    /// Creator response on a close warning; cancels the scheduled close.
    CloseCancel { channel_id: String },
    /// Reopens an archived ticket.
    Reopen { channel_id: String },
    /// Redraws winners for an ended giveaway.
    GiveawayReroll { message_id: i64 },
}

#[derive(Debug, Error)]
#[error("unrecognized component token: {0}")]
pub struct BadToken(String);

impl Component {
    pub fn encode(&self) -> String {
        // Infallible: the enum has no non-serializable payloads.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(token: &str) -> Result<Self, BadToken> {
        serde_json::from_str(token).map_err(|e| BadToken(format!("{token:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let all = [
            Component::CloseConfirm { channel_id: "123".into() },
            Component::CloseCancel { channel_id: "123".into() },
            Component::Reopen { channel_id: "123".into() },
            Component::GiveawayReroll { message_id: 42 },
        ];
        for component in all {
            assert_eq!(Component::decode(&component.encode()).unwrap(), component);
        }
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(Component::decode("close_confirm:123").is_err());
        assert!(Component::decode("{\"kind\":\"warp_core\"}").is_err());
        assert!(Component::decode("").is_err());
    }
}
