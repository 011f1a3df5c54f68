//! Typed CRUD over the store, one repository per entity.
//!
//! Updates go through a per-repository allow-list of mutable columns;
//! naming any other column is a loud caller error and nothing is written.
//! `get` re-validates invariants on the way out so a row corrupted by
//! out-of-band tooling is reported instead of returned.

use crate::db::error::RepoError;
use chrono::NaiveDateTime;

pub mod application_bans;
pub mod categories;
pub mod constants;
pub mod giveaways;
pub mod tickets;

pub use application_bans::ApplicationBanRepo;
pub use categories::CategoryRepo;
pub use constants::ConstantRepo;
pub use giveaways::GiveawayRepo;
pub use tickets::TicketRepo;

/// A value for one named field in an `update` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(Option<i64>),
    Text(Option<String>),
    Time(Option<NaiveDateTime>),
}

/// Identifiers in this system are decimal snowflake strings.
pub(crate) fn check_numeric_id(field: &str, value: &str) -> Result<(), RepoError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RepoError::Validation(format!(
            "{field} must be a non-empty numeric string, got {value:?}"
        )));
    }
    Ok(())
}

pub(crate) fn invalid_field(name: &str) -> RepoError {
    RepoError::InvalidField(name.to_string())
}
