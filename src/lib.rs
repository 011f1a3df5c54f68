//! Persistence and lifecycle engine for community-management records.
//!
//! Support tickets, giveaways and timed application bans all have moments
//! where they must change state with nobody at the keyboard: a warned
//! ticket archives itself, a giveaway draws its winners, a temporary ban
//! lapses. This crate owns the versioned store those records live in, the
//! repositories that guard their invariants, the pure state machines that
//! describe their legal transitions, and the sweep workers that apply due
//! transitions on a clock. The chat front end is a collaborator behind
//! [`interaction::InteractionLayer`], never implemented here.

pub mod config;
pub mod db;
pub mod interaction;
pub mod lifecycle;
pub mod services;
