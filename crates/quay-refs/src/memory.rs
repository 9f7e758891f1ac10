//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::RefStore;
use crate::types::{check_ref_name, Ref};

/// An in-memory implementation of [`RefStore`].
///
/// All data lives in a `BTreeMap` behind a `RwLock`, so listings come out
/// sorted for free. Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, Ref>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs.get(name).cloned())
    }

    fn write_ref(&self, reference: &Ref) -> Result<()> {
        check_ref_name(&reference.name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        refs.insert(reference.name.clone(), reference.clone());
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        let mut refs = self.refs.write().expect("lock poisoned");
        Ok(refs.remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>> {
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefError;
    use quay_types::ObjectId;

    fn commit(n: u8) -> ObjectId {
        ObjectId::from_hash([n; 32])
    }

    #[test]
    fn create_and_read_branch() {
        let store = InMemoryRefStore::new();
        store.write_branch("main", commit(10)).unwrap();

        let read = store.read_ref("refs/heads/main").unwrap().unwrap();
        assert!(read.is_branch());
        assert_eq!(read.target, commit(10));
        assert_eq!(store.read_branch("main").unwrap(), Some(commit(10)));
    }

    #[test]
    fn read_missing_branch_returns_none() {
        let store = InMemoryRefStore::new();
        assert!(store.read_branch("nope").unwrap().is_none());
    }

    #[test]
    fn branch_advances_in_place() {
        let store = InMemoryRefStore::new();
        store.write_branch("main", commit(1)).unwrap();
        store.write_branch("main", commit(2)).unwrap();
        assert_eq!(store.read_branch("main").unwrap(), Some(commit(2)));
        assert_eq!(store.branches().unwrap().len(), 1);
    }

    #[test]
    fn delete_branch() {
        let store = InMemoryRefStore::new();
        store.write_branch("feature", commit(20)).unwrap();
        assert!(store.delete_ref("refs/heads/feature").unwrap());
        assert!(!store.delete_ref("refs/heads/feature").unwrap());
        assert!(store.read_branch("feature").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_and_prefix_filtered() {
        let store = InMemoryRefStore::new();
        store.write_branch("zeta", commit(1)).unwrap();
        store.write_branch("alpha", commit(2)).unwrap();
        store.write_branch("feature/x", commit(3)).unwrap();

        let names: Vec<String> = store
            .branches()
            .unwrap()
            .into_iter()
            .map(|r| r.short_name().to_string())
            .collect();
        assert_eq!(names, ["alpha", "feature/x", "zeta"]);

        let feature = store.list_refs("refs/heads/feature/").unwrap();
        assert_eq!(feature.len(), 1);
    }

    #[test]
    fn write_rejects_names_outside_namespace() {
        let store = InMemoryRefStore::new();
        let bogus = Ref {
            name: "HEAD".into(),
            target: commit(1),
        };
        assert!(matches!(
            store.write_ref(&bogus),
            Err(RefError::InvalidRefName(_))
        ));
    }
}
