use std::path::PathBuf;

use quay_types::ObjectId;

use crate::error::{SessionError, SessionResult};
use crate::reader::ReaderSession;
use crate::session::ObjectStoreSession;
use crate::writer::WriterSession;

/// Builder for sessions.
///
/// ```no_run
/// use quay_session::{ObjectSession, SessionOptions};
///
/// let mut writer = SessionOptions::new()
///     .location("/tmp/store")
///     .branch("main")
///     .open_writer()?;
/// writer.write_checked("docs/readme", b"hello")?;
/// writer.commit_and_flush(Some("add readme"))?;
///
/// let reader = SessionOptions::new()
///     .location("/tmp/store")
///     .branch("main")
///     .open_reader()?;
/// assert!(reader.file_exists("docs/readme")?);
/// # Ok::<(), quay_session::SessionError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    location: Option<PathBuf>,
    branch: Option<String>,
    writer: bool,
    at_commit: Option<ObjectId>,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository directory. Created if it holds no repository yet.
    pub fn location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn writer(mut self, writer: bool) -> Self {
        self.writer = writer;
        self
    }

    /// Anchor a reader to a historical commit instead of the branch head.
    pub fn at_commit(mut self, commit: ObjectId) -> Self {
        self.at_commit = Some(commit);
        self
    }

    /// Open a session of whichever kind was requested.
    pub fn open(self) -> SessionResult<ObjectStoreSession> {
        if self.writer {
            self.open_writer().map(ObjectStoreSession::Writer)
        } else {
            self.open_reader().map(ObjectStoreSession::Reader)
        }
    }

    /// Open a writer. Fails if a historical commit was requested.
    pub fn open_writer(self) -> SessionResult<WriterSession> {
        if let Some(commit) = self.at_commit {
            return Err(SessionError::Configuration(format!(
                "writer sessions cannot be anchored to commit {commit}"
            )));
        }
        let (location, branch) = self.required()?;
        WriterSession::open(location, &branch)
    }

    /// Open a reader. Fails if writer mode was requested.
    pub fn open_reader(self) -> SessionResult<ReaderSession> {
        if self.writer {
            return Err(SessionError::Configuration(
                "writer mode requested for a reader session".into(),
            ));
        }
        let at_commit = self.at_commit;
        let (location, branch) = self.required()?;
        match at_commit {
            Some(commit) => ReaderSession::open_at(location, &branch, commit),
            None => ReaderSession::open(location, &branch),
        }
    }

    fn required(self) -> SessionResult<(PathBuf, String)> {
        let location = self
            .location
            .ok_or_else(|| SessionError::Configuration("store location is required".into()))?;
        let branch = self
            .branch
            .ok_or_else(|| SessionError::Configuration("branch name is required".into()))?;
        Ok((location, branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ObjectSession;

    fn config_error<T: std::fmt::Debug>(result: SessionResult<T>) -> String {
        match result {
            Err(SessionError::Configuration(msg)) => msg,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn location_and_branch_are_required() {
        let dir = tempfile::tempdir().unwrap();
        let msg = config_error(SessionOptions::new().branch("main").open());
        assert!(msg.contains("location"));
        let msg = config_error(SessionOptions::new().location(dir.path()).open());
        assert!(msg.contains("branch"));
    }

    #[test]
    fn writer_and_historical_commit_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let options = SessionOptions::new()
            .location(dir.path())
            .branch("main")
            .writer(true)
            .at_commit(ObjectId::digest(b"old"));
        config_error(options.clone().open());
        config_error(options.clone().open_writer());
        config_error(options.open_reader());
    }

    #[test]
    fn invalid_branch_name_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        config_error(
            SessionOptions::new()
                .location(dir.path())
                .branch("bad..name")
                .writer(true)
                .open(),
        );
    }

    #[test]
    fn missing_store_is_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("fresh");
        let writer = SessionOptions::new()
            .location(&location)
            .branch("main")
            .open_writer()
            .unwrap();
        assert!(location.join("config").is_file());
        assert!(!writer.current_commit_id().is_null());
    }

    #[test]
    fn reader_on_unknown_branch_is_lookup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionOptions::new()
            .location(dir.path())
            .branch("nowhere")
            .open_reader()
            .unwrap_err();
        assert!(err.is_lookup());
        assert!(matches!(err, SessionError::BranchNotFound(name) if name == "nowhere"));
    }
}
