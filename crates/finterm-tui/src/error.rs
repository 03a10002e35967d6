//! Error taxonomy. Every variant degrades to a status line or log entry;
//! nothing here is allowed to take the process down.

/// Failures on the worker file protocol.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("worker file error: {0}")]
    Io(#[from] std::io::Error),

    /// A response file existed but did not decode. Malformed responses are
    /// treated as permanent: the watcher that hit one stops polling.
    #[error("malformed worker payload: {0}")]
    Decode(String),
}

/// Rejections from the allocation ledger. These never mutate ledger state.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("category {0:?} already exists")]
    DuplicateCategory(String),

    #[error("enter a value between 1 and {remaining}")]
    OutOfRange { pct: i64, remaining: u8 },
}
