//! Sweep workers: independently scheduled loops that poll the store for
//! due records and drive their lifecycle transitions. One failing item
//! never stops the rest of a tick, and a failing tick never stops the
//! loop; loops stop only at shutdown, after the in-flight tick finishes.

pub mod ban_expiry;
pub mod giveaway_sweep;
pub mod ticket_sweep;

/// Constant keys the sweeps read from the store.
pub mod constant_keys {
    /// Destination category tickets get relocated to on archival.
    pub const ARCHIVE_CATEGORY: &str = "archive_category";
    /// Reaction that counts as a giveaway entry.
    pub const GIVEAWAY_EMOJI: &str = "giveaway_emoji";
}

/// Default entry reaction when no `giveaway_emoji` constant is set.
pub const DEFAULT_GIVEAWAY_EMOJI: &str = "🎉";
