//! Session orchestration over a Quay repository.
//!
//! A [`WriterSession`] owns a staging index for one branch. Writes are staged
//! in memory, [`WriterSession::commit`] turns them into a commit only when
//! the tree actually changed, and [`WriterSession::flush_pack`] writes every
//! pending object as one pack and moves the branch ref.
//!
//! A [`ReaderSession`] pins one commit at construction and answers reads,
//! recursive walks, and incremental diffs against it.
//!
//! [`SessionOptions`] opens either kind; [`ObjectStoreSession`] holds a
//! session whose kind was chosen at runtime.

pub mod error;
pub mod options;
pub mod reader;
pub mod session;
pub mod writer;

pub use error::{SessionError, SessionResult};
pub use options::SessionOptions;
pub use reader::{CommitSummary, ReaderSession};
pub use session::{ObjectSession, ObjectStoreSession, SessionCore, SessionMode};
pub use writer::WriterSession;

pub use quay_types::ObjectId;
