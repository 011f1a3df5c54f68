use thiserror::Error;

/// Errors surfaced by the entity repositories.
///
/// Absence of a row is never an error; `get` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum RepoError {
    /// An entity invariant was violated before any write happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller tried to update a field outside the repository's
    /// allow-list of mutable columns (or supplied a value of the wrong
    /// shape for a known field). Programmer error, fail loudly.
    #[error("field {0:?} is not updatable")]
    InvalidField(String),

    /// A stored row no longer satisfies its own invariants (out-of-band
    /// tooling wrote garbage). The malformed row is never returned.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database is at version {current}, newer than target {target}; downgrade is not supported")]
    Downgrade { current: i32, target: i32 },

    #[error("no migration script registered for version {0}")]
    MissingScript(i32),

    #[error("pre-migration backup failed: {0}")]
    Backup(#[source] std::io::Error),

    #[error("migration script v{version} failed")]
    Script {
        version: i32,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}
