//! The read side: a fixed snapshot and queries against it.

use std::path::Path;

use quay_diff::{diff_trees, ChangeStatus, DiffOptions};
use quay_index::path::join;
use quay_types::ObjectId;
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::session::{open_repository, ObjectSession, SessionCore, SessionMode};

/// One entry of [`ReaderSession::history`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub id: ObjectId,
    pub message: String,
    pub author: String,
    pub timestamp_ms: u64,
    pub tree_id: ObjectId,
}

/// Read-only view of one commit.
///
/// The snapshot is resolved once, at construction. Later commits on the
/// branch, by this process or any other, are not visible through it.
pub struct ReaderSession {
    core: SessionCore,
    tree: ObjectId,
}

impl ReaderSession {
    /// Open the current head of `branch`.
    pub fn open(location: impl AsRef<Path>, branch: &str) -> SessionResult<Self> {
        let repo = open_repository(location.as_ref(), branch)?;
        let head = repo
            .lookup_branch(branch)?
            .ok_or_else(|| SessionError::BranchNotFound(branch.to_string()))?;
        Self::anchored(SessionCore::new(repo, branch, head))
    }

    /// Open a historical commit. `branch` is recorded but not resolved.
    pub fn open_at(location: impl AsRef<Path>, branch: &str, commit: ObjectId) -> SessionResult<Self> {
        let repo = open_repository(location.as_ref(), branch)?;
        Self::anchored(SessionCore::new(repo, branch, commit))
    }

    fn anchored(core: SessionCore) -> SessionResult<Self> {
        let commit = core.commit_id();
        let tree = match core.commit_tree(&commit) {
            // A writer may have flushed between the pack scan and the ref read.
            Err(SessionError::CommitNotFound(_)) if core.repository().refresh_packs()? > 0 => {
                core.commit_tree(&commit)?
            }
            other => other?,
        };
        debug!(branch = core.branch(), commit = %core.commit_id().short_hex(), "reader opened");
        Ok(Self { core, tree })
    }

    /// Root tree of the snapshot.
    pub fn tree_id(&self) -> ObjectId {
        self.tree
    }

    /// Visit every file under `root`, depth first, siblings in name order.
    ///
    /// An empty `root` walks the whole snapshot, a `root` naming a file visits
    /// just that file, and a missing `root` visits nothing.
    pub fn recursive_read<F>(&self, root: &str, mut visit: F) -> SessionResult<()>
    where
        F: FnMut(&str, &[u8]),
    {
        let root = root.trim_matches('/');
        if root.is_empty() {
            return self.walk(&self.tree, "", &mut visit);
        }

        let repo = self.core.repository();
        match repo.tree_entry_by_path(&self.tree, root)? {
            Some(entry) if entry.is_directory() => self.walk(&entry.object_id, root, &mut visit),
            Some(entry) => {
                visit(root, &repo.read_blob(&entry.object_id)?);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn walk<F>(&self, tree_id: &ObjectId, prefix: &str, visit: &mut F) -> SessionResult<()>
    where
        F: FnMut(&str, &[u8]),
    {
        let repo = self.core.repository();
        let tree = repo.read_tree(tree_id)?;
        for entry in &tree.entries {
            let path = join(prefix, &entry.name);
            if entry.is_directory() {
                self.walk(&entry.object_id, &path, visit)?;
            } else {
                visit(&path, &repo.read_blob(&entry.object_id)?);
            }
        }
        Ok(())
    }

    /// Report what changed between `old_commit` and this snapshot.
    ///
    /// Added and modified files go to `on_changed` with their new content,
    /// deleted files to `on_deleted`. Changes are classified by blob id only.
    pub fn diff_since<C, D>(
        &self,
        old_commit: &ObjectId,
        mut on_changed: C,
        mut on_deleted: D,
    ) -> SessionResult<()>
    where
        C: FnMut(&str, &[u8]),
        D: FnMut(&str),
    {
        let old_tree = self.core.commit_tree(old_commit)?;
        let repo = self.core.repository();
        let options = DiffOptions {
            skip_binary_check: true,
        };
        let diff = diff_trees(repo.odb().as_ref(), Some(&old_tree), Some(&self.tree), options)?;
        debug!(
            from = %old_commit.short_hex(),
            to = %self.core.commit_id().short_hex(),
            changes = diff.len(),
            "diff computed"
        );

        for change in &diff.changes {
            match (change.status, change.new_id) {
                (ChangeStatus::Deleted, _) => on_deleted(&change.path),
                (_, Some(id)) => on_changed(&change.path, &repo.read_blob(&id)?),
                (_, None) => {}
            }
        }
        Ok(())
    }

    /// First-parent history from the snapshot backwards, newest first.
    pub fn history(&self, limit: usize) -> SessionResult<Vec<CommitSummary>> {
        let log = self
            .core
            .repository()
            .first_parent_log(self.core.commit_id(), limit)?;
        Ok(log
            .into_iter()
            .map(|(id, commit)| CommitSummary {
                id,
                author: commit.author.to_string(),
                timestamp_ms: commit.author.timestamp_ms,
                tree_id: commit.tree,
                message: commit.message,
            })
            .collect())
    }
}

impl ObjectSession for ReaderSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Reader
    }

    fn read_file(&self, path: &str) -> SessionResult<Option<Vec<u8>>> {
        let repo = self.core.repository();
        match repo.tree_entry_by_path(&self.tree, path)? {
            Some(entry) if !entry.is_directory() => Ok(Some(repo.read_blob(&entry.object_id)?)),
            _ => Ok(None),
        }
    }

    fn file_exists(&self, path: &str) -> SessionResult<bool> {
        Ok(self
            .core
            .repository()
            .tree_entry_by_path(&self.tree, path)?
            .is_some_and(|e| !e.is_directory()))
    }
}

impl std::fmt::Debug for ReaderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSession")
            .field("core", &self.core)
            .field("tree", &self.tree)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WriterSession;

    /// Commit `files` on `main` in a fresh writer and flush. Returns the head.
    fn commit_files(dir: &Path, files: &[(&str, &[u8])], removals: &[&str]) -> ObjectId {
        let mut w = WriterSession::open(dir, "main").unwrap();
        for (path, data) in files {
            w.write_checked(path, data).unwrap();
        }
        for path in removals {
            w.remove_file(path).unwrap();
        }
        w.commit_and_flush(None).unwrap();
        w.current_commit_id()
    }

    fn collect(reader: &ReaderSession, root: &str) -> Vec<(String, Vec<u8>)> {
        let mut seen = Vec::new();
        reader
            .recursive_read(root, |path, data| seen.push((path.to_string(), data.to_vec())))
            .unwrap();
        seen
    }

    #[test]
    fn flushed_content_is_visible_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let head = commit_files(dir.path(), &[("docs/readme", b"hello")], &[]);

        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        assert_eq!(reader.current_commit_id(), head);
        assert_eq!(reader.branch(), "main");
        assert_eq!(reader.read_file("docs/readme").unwrap().as_deref(), Some(&b"hello"[..]));
        assert!(reader.file_exists("docs/readme").unwrap());
        assert!(!reader.file_exists("docs").unwrap());
        assert_eq!(reader.read_file("docs").unwrap(), None);
        assert_eq!(reader.read_file("missing").unwrap(), None);
    }

    #[test]
    fn recursive_read_visits_leaves_in_order() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(
            dir.path(),
            &[("docs/sub/b", b"B"), ("docs/a", b"A"), ("other", b"O")],
            &[],
        );
        let reader = ReaderSession::open(dir.path(), "main").unwrap();

        let docs = collect(&reader, "docs");
        assert_eq!(
            docs,
            vec![
                ("docs/a".to_string(), b"A".to_vec()),
                ("docs/sub/b".to_string(), b"B".to_vec()),
            ]
        );
        let all: Vec<String> = collect(&reader, "").into_iter().map(|(p, _)| p).collect();
        assert_eq!(all, ["docs/a", "docs/sub/b", "other"]);
        assert_eq!(collect(&reader, "docs/sub/b"), vec![("docs/sub/b".to_string(), b"B".to_vec())]);
        assert!(collect(&reader, "nowhere").is_empty());
        assert_eq!(collect(&reader, "docs/sub/").len(), 1);
    }

    #[test]
    fn diff_since_reports_changed_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let s1 = commit_files(dir.path(), &[("A", b"1"), ("B", b"2"), ("gone/x", b"x")], &[]);
        let s2 = commit_files(dir.path(), &[("B", b"3"), ("C", b"4")], &["gone/x"]);

        let reader = ReaderSession::open_at(dir.path(), "main", s2).unwrap();
        let mut changed = Vec::new();
        let mut deleted = Vec::new();
        reader
            .diff_since(
                &s1,
                |path, data| changed.push((path.to_string(), data.to_vec())),
                |path| deleted.push(path.to_string()),
            )
            .unwrap();

        assert_eq!(
            changed,
            vec![("B".to_string(), b"3".to_vec()), ("C".to_string(), b"4".to_vec())]
        );
        assert_eq!(deleted, ["gone/x"]);
    }

    #[test]
    fn diff_against_self_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let head = commit_files(dir.path(), &[("A", b"1")], &[]);
        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        let mut changed = 0;
        let mut deleted = 0;
        reader
            .diff_since(&head, |_, _| changed += 1, |_| deleted += 1)
            .unwrap();
        assert_eq!((changed, deleted), (0, 0));
    }

    #[test]
    fn diff_since_unknown_commit_is_lookup_error() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(dir.path(), &[("A", b"1")], &[]);
        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        let err = reader
            .diff_since(&ObjectId::digest(b"unknown"), |_, _| {}, |_| {})
            .unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn file_to_directory_change_is_delete_plus_add() {
        let dir = tempfile::tempdir().unwrap();
        let s1 = commit_files(dir.path(), &[("node", b"leaf")], &[]);
        let mut w = WriterSession::open(dir.path(), "main").unwrap();
        w.remove_file("node").unwrap();
        w.write_checked("node/child", b"inner").unwrap();
        w.commit_and_flush(None).unwrap();
        drop(w);

        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        let mut changed = Vec::new();
        let mut deleted = Vec::new();
        reader
            .diff_since(&s1, |p, _| changed.push(p.to_string()), |p| deleted.push(p.to_string()))
            .unwrap();
        assert_eq!(deleted, ["node"]);
        assert_eq!(changed, ["node/child"]);
    }

    #[test]
    fn deletion_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(dir.path(), &[("P", b"payload"), ("Q", b"stays")], &[]);
        commit_files(dir.path(), &[], &["P"]);

        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        assert!(!reader.file_exists("P").unwrap());
        assert!(reader.file_exists("Q").unwrap());
    }

    #[test]
    fn historical_reader_is_pinned() {
        let dir = tempfile::tempdir().unwrap();
        let s1 = commit_files(dir.path(), &[("v", b"1")], &[]);
        commit_files(dir.path(), &[("v", b"2")], &[]);

        let old = ReaderSession::open_at(dir.path(), "main", s1).unwrap();
        assert_eq!(old.current_commit_id(), s1);
        assert_eq!(old.read_file("v").unwrap().as_deref(), Some(&b"1"[..]));

        let missing = ReaderSession::open_at(dir.path(), "main", ObjectId::digest(b"nope"));
        assert!(matches!(missing, Err(SessionError::CommitNotFound(_))));
    }

    #[test]
    fn history_walks_first_parents() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(dir.path(), &[("a", b"1")], &[]);
        let head = commit_files(dir.path(), &[("a", b"2")], &[]);

        let reader = ReaderSession::open(dir.path(), "main").unwrap();
        let history = reader.history(10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, head);
        assert_eq!(history[0].tree_id, reader.tree_id());
        assert_eq!(history[2].message, "initial commit");
        assert_eq!(history[0].author, "quay <quay@localhost>");
        assert_eq!(reader.history(1).unwrap().len(), 1);
    }

    #[test]
    fn head_flushed_after_pack_scan_is_found() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(dir.path(), &[("a", b"1")], &[]);

        let repo = open_repository(dir.path(), "main").unwrap();
        let mut writer = WriterSession::open(dir.path(), "main").unwrap();
        writer.write_checked("a", b"2").unwrap();
        assert!(writer.commit_and_flush(None).unwrap());
        drop(writer);

        let head = repo.lookup_branch("main").unwrap().unwrap();
        let reader = ReaderSession::anchored(SessionCore::new(repo, "main", head)).unwrap();
        assert_eq!(reader.current_commit_id(), head);
        assert_eq!(reader.read_file("a").unwrap().as_deref(), Some(&b"2"[..]));
    }

    #[test]
    fn missing_commit_still_fails_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        commit_files(dir.path(), &[("a", b"1")], &[]);
        let bogus = ObjectId::digest(b"no such commit");
        let err = ReaderSession::open_at(dir.path(), "main", bogus).unwrap_err();
        assert!(matches!(err, SessionError::CommitNotFound(_)));
    }
}
