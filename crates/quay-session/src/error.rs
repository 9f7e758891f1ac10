use quay_types::ObjectId;
use thiserror::Error;

use crate::session::SessionMode;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing or contradictory construction arguments.
    #[error("invalid session configuration: {0}")]
    Configuration(String),

    /// An operation of one session kind was invoked on the other.
    #[error("{operation} is not available on a {mode} session")]
    ModeMismatch {
        operation: &'static str,
        mode: SessionMode,
    },

    #[error("commit not found: {0}")]
    CommitNotFound(ObjectId),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("repository error: {0}")]
    Repo(#[from] quay_repo::RepoError),

    #[error("index error: {0}")]
    Index(#[from] quay_index::IndexError),

    #[error("diff error: {0}")]
    Diff(#[from] quay_diff::DiffError),

    #[error("store error: {0}")]
    Store(#[from] quay_store::StoreError),

    #[error("pack error: {0}")]
    Pack(#[from] quay_pack::PackError),

    #[error("ref error: {0}")]
    Ref(#[from] quay_refs::RefError),
}

impl SessionError {
    /// Whether a requested commit or branch failed to resolve.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::CommitNotFound(_) | Self::BranchNotFound(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
