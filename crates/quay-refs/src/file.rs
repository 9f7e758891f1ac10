//! On-disk ref store: one small file per ref.
//!
//! A ref named `refs/heads/feature/x` lives at `<root>/refs/heads/feature/x`
//! and holds the target commit id as hex followed by a newline. Updates are
//! written to a temporary file in the same directory and renamed into place,
//! so readers never observe a half-written ref.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quay_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::RefStore;
use crate::types::{check_ref_name, Ref};

/// A [`RefStore`] rooted at a repository directory.
#[derive(Debug, Clone)]
pub struct FileRefStore {
    root: PathBuf,
}

impl FileRefStore {
    /// Create a store rooted at `root`. The `refs/` directory is created on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    fn parse(name: &str, content: &str) -> Result<Ref> {
        let target = ObjectId::from_hex(content).map_err(|e| RefError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Ref {
            name: name.to_string(),
            target,
        })
    }

    fn collect(&self, dir: &Path, name: &str, out: &mut Vec<Ref>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            // Leftover temporaries from interrupted writes.
            if file_name.starts_with('.') {
                continue;
            }
            let child = format!("{name}/{file_name}");
            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &child, out)?;
            } else {
                let content = fs::read_to_string(entry.path())?;
                out.push(Self::parse(&child, &content)?);
            }
        }
        Ok(())
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        check_ref_name(name)?;
        match fs::read_to_string(self.ref_path(name)) {
            Ok(content) => Ok(Some(Self::parse(name, &content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            // A directory where a leaf was expected: `refs/heads/a` when only
            // `refs/heads/a/b` exists.
            Err(_) if self.ref_path(name).is_dir() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_ref(&self, reference: &Ref) -> Result<()> {
        check_ref_name(&reference.name)?;
        let path = self.ref_path(&reference.name);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".ref-")
            .tempfile_in(dir)?;
        writeln!(tmp, "{}", reference.target.to_hex())?;
        tmp.as_file().sync_all()?;
        persist(tmp, &path)?;

        debug!(name = %reference.name, target = %reference.target.short_hex(), "ref updated");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        check_ref_name(name)?;
        match fs::remove_file(self.ref_path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>> {
        let mut refs = Vec::new();
        self.collect(&self.root.join("refs"), "refs", &mut refs)?;
        refs.retain(|r| r.name.starts_with(prefix));
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(refs)
    }
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
    Ok(())
}
