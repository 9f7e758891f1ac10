//! Foundation types for Quay.
//!
//! Every other Quay crate depends on `quay-types`. It holds the identifiers
//! and small value types shared by the object store, the ref store, and the
//! session layer.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Signature`] -- Author/committer identity plus timestamp

pub mod error;
pub mod object;
pub mod signature;

pub use error::TypeError;
pub use object::ObjectId;
pub use signature::Signature;
