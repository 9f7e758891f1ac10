//! Behaviour shared by writer and reader sessions.

use std::fmt;
use std::path::Path;

use quay_repo::Repository;
use quay_types::ObjectId;

use crate::error::{SessionError, SessionResult};
use crate::reader::{CommitSummary, ReaderSession};
use crate::writer::WriterSession;

/// Which kind of session was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Writer,
    Reader,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Writer => f.write_str("writer"),
            Self::Reader => f.write_str("reader"),
        }
    }
}

/// State every session carries: the repository, the branch, and the commit
/// the session is anchored to.
pub struct SessionCore {
    repo: Repository,
    branch: String,
    commit_id: ObjectId,
}

impl SessionCore {
    pub(crate) fn new(repo: Repository, branch: &str, commit_id: ObjectId) -> Self {
        Self {
            repo,
            branch: branch.to_string(),
            commit_id,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn commit_id(&self) -> ObjectId {
        self.commit_id
    }

    pub(crate) fn set_commit_id(&mut self, id: ObjectId) {
        self.commit_id = id;
    }

    /// Root tree of commit `id`.
    pub(crate) fn commit_tree(&self, id: &ObjectId) -> SessionResult<ObjectId> {
        self.repo
            .lookup_commit(id)?
            .map(|c| c.tree)
            .ok_or(SessionError::CommitNotFound(*id))
    }
}

impl fmt::Debug for SessionCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCore")
            .field("location", &self.repo.path())
            .field("branch", &self.branch)
            .field("commit_id", &self.commit_id)
            .finish()
    }
}

/// Validate `branch` and open (or create) the repository at `location`.
pub(crate) fn open_repository(location: &Path, branch: &str) -> SessionResult<Repository> {
    quay_refs::validate_branch_name(branch)
        .map_err(|e| SessionError::Configuration(e.to_string()))?;
    Ok(Repository::open_or_init(location)?)
}

/// Operations common to both session kinds.
pub trait ObjectSession {
    fn core(&self) -> &SessionCore;

    fn mode(&self) -> SessionMode;

    /// Content of the file at `path`, or `Ok(None)` if there is none.
    fn read_file(&self, path: &str) -> SessionResult<Option<Vec<u8>>>;

    /// Whether `path` names a file. Directories do not count.
    fn file_exists(&self, path: &str) -> SessionResult<bool>;

    fn branch(&self) -> &str {
        self.core().branch()
    }

    /// The commit this session is anchored to.
    fn current_commit_id(&self) -> ObjectId {
        self.core().commit_id()
    }

    fn location(&self) -> &Path {
        self.core().repository().path()
    }
}

/// A session whose kind is chosen at runtime.
///
/// Every operation of either kind is available; calling one that belongs to
/// the other kind fails with [`SessionError::ModeMismatch`].
#[derive(Debug)]
pub enum ObjectStoreSession {
    Writer(WriterSession),
    Reader(ReaderSession),
}

impl ObjectStoreSession {
    pub fn as_writer(&self) -> Option<&WriterSession> {
        match self {
            Self::Writer(w) => Some(w),
            Self::Reader(_) => None,
        }
    }

    pub fn as_reader(&self) -> Option<&ReaderSession> {
        match self {
            Self::Reader(r) => Some(r),
            Self::Writer(_) => None,
        }
    }

    fn writer(&mut self, operation: &'static str) -> SessionResult<&mut WriterSession> {
        match self {
            Self::Writer(w) => Ok(w),
            Self::Reader(_) => Err(SessionError::ModeMismatch {
                operation,
                mode: SessionMode::Reader,
            }),
        }
    }

    fn reader(&self, operation: &'static str) -> SessionResult<&ReaderSession> {
        match self {
            Self::Reader(r) => Ok(r),
            Self::Writer(_) => Err(SessionError::ModeMismatch {
                operation,
                mode: SessionMode::Writer,
            }),
        }
    }

    pub fn write_checked(&mut self, path: &str, data: &[u8]) -> SessionResult<bool> {
        self.writer("write_checked")?.write_checked(path, data)
    }

    pub fn write_unchecked(&mut self, path: &str, data: &[u8]) -> SessionResult<()> {
        self.writer("write_unchecked")?.write_unchecked(path, data)
    }

    pub fn remove_file(&mut self, path: &str) -> SessionResult<bool> {
        self.writer("remove_file")?.remove_file(path)
    }

    pub fn commit(&mut self, message: Option<&str>) -> SessionResult<bool> {
        self.writer("commit")?.commit(message)
    }

    pub fn flush_pack(&mut self) -> SessionResult<()> {
        self.writer("flush_pack")?.flush_pack()
    }

    pub fn commit_and_flush(&mut self, message: Option<&str>) -> SessionResult<bool> {
        self.writer("commit_and_flush")?.commit_and_flush(message)
    }

    pub fn recursive_read<F>(&self, root: &str, visit: F) -> SessionResult<()>
    where
        F: FnMut(&str, &[u8]),
    {
        self.reader("recursive_read")?.recursive_read(root, visit)
    }

    pub fn diff_since<C, D>(&self, old_commit: &ObjectId, on_changed: C, on_deleted: D) -> SessionResult<()>
    where
        C: FnMut(&str, &[u8]),
        D: FnMut(&str),
    {
        self.reader("diff_since")?.diff_since(old_commit, on_changed, on_deleted)
    }

    pub fn history(&self, limit: usize) -> SessionResult<Vec<CommitSummary>> {
        self.reader("history")?.history(limit)
    }
}

impl ObjectSession for ObjectStoreSession {
    fn core(&self) -> &SessionCore {
        match self {
            Self::Writer(w) => w.core(),
            Self::Reader(r) => r.core(),
        }
    }

    fn mode(&self) -> SessionMode {
        match self {
            Self::Writer(_) => SessionMode::Writer,
            Self::Reader(_) => SessionMode::Reader,
        }
    }

    fn read_file(&self, path: &str) -> SessionResult<Option<Vec<u8>>> {
        match self {
            Self::Writer(w) => w.read_file(path),
            Self::Reader(r) => r.read_file(path),
        }
    }

    fn file_exists(&self, path: &str) -> SessionResult<bool> {
        match self {
            Self::Writer(w) => w.file_exists(path),
            Self::Reader(r) => r.file_exists(path),
        }
    }
}

impl From<WriterSession> for ObjectStoreSession {
    fn from(writer: WriterSession) -> Self {
        Self::Writer(writer)
    }
}

impl From<ReaderSession> for ObjectStoreSession {
    fn from(reader: ReaderSession) -> Self {
        Self::Reader(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SessionOptions;

    #[test]
    fn writer_operations_fail_on_reader() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionOptions::new()
            .location(dir.path())
            .branch("main")
            .writer(true)
            .open()
            .unwrap();
        assert_eq!(writer.mode(), SessionMode::Writer);
        assert!(writer.write_checked("a", b"1").unwrap());
        assert!(writer.commit_and_flush(None).unwrap());
        let head = writer.current_commit_id();

        let mut reader = SessionOptions::new()
            .location(dir.path())
            .branch("main")
            .open()
            .unwrap();
        assert_eq!(reader.mode(), SessionMode::Reader);
        assert_eq!(reader.current_commit_id(), head);
        assert_eq!(reader.read_file("a").unwrap().as_deref(), Some(&b"1"[..]));

        let err = reader.write_checked("b", b"2").unwrap_err();
        assert!(matches!(
            err,
            SessionError::ModeMismatch { operation: "write_checked", mode: SessionMode::Reader }
        ));
        assert!(matches!(reader.commit(None), Err(SessionError::ModeMismatch { .. })));
        assert!(matches!(reader.flush_pack(), Err(SessionError::ModeMismatch { .. })));
        assert!(reader.history(5).is_ok());
    }

    #[test]
    fn reader_operations_fail_on_writer() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SessionOptions::new()
            .location(dir.path())
            .branch("main")
            .writer(true)
            .open()
            .unwrap();

        let err = writer.recursive_read("", |_, _| {}).unwrap_err();
        assert_eq!(
            err.to_string(),
            "recursive_read is not available on a writer session"
        );
        let head = writer.current_commit_id();
        assert!(matches!(
            writer.diff_since(&head, |_, _| {}, |_| {}),
            Err(SessionError::ModeMismatch { mode: SessionMode::Writer, .. })
        ));
        assert!(writer.as_writer().is_some());
        assert!(writer.as_reader().is_none());
        assert_eq!(writer.branch(), "main");
        assert_eq!(writer.location(), dir.path());
    }
}
