use thiserror::Error;

/// Typed failures from the persistence layer. Business-rule violations get
/// their own variants so the HTTP layer can map them to distinct responses.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("that's yourself")]
    SelfReference,

    #[error("user is already your friend")]
    AlreadyFriends,

    #[error("user is already in chat")]
    AlreadyMember,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
