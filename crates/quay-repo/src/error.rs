use std::path::PathBuf;

use quay_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a quay repository: {0}")]
    NotARepository(PathBuf),

    #[error("repository already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("store error: {0}")]
    Store(#[from] quay_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] quay_refs::RefError),

    #[error("pack error: {0}")]
    Pack(#[from] quay_pack::PackError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
