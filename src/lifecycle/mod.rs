//! Pure transition logic. Nothing in here touches the database or the
//! interaction layer; the sweep workers and the front end feed entities in
//! and get back the field writes to commit and the side effects to run.

pub mod giveaway;
pub mod ticket;
