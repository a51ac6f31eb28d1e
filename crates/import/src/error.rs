use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (zero display limit, empty ignore entry, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Commit requested before any preview was built.
    #[error("no preview session; run a preview first")]
    NoSession,
    /// Commit requested while the current preview still has blocking or advisory issues.
    #[error("preview is not committable: {0}")]
    NotCommittable(String),
    /// A second commit was started while one is still pending.
    #[error("a commit is already in progress")]
    CommitInProgress,
    /// `finish_commit` called without a matching `begin_commit`.
    #[error("no commit is pending")]
    NoPendingCommit,
    /// Transport or server failure reported by the persistence collaborator.
    #[error("commit failed: {0}")]
    Commit(String),
}
