//! Ninja registry: get-or-create upserts over a wholesale-persisted snapshot.
//!
//! Each upsert loads the full snapshot, touches only its own field group and
//! writes the full snapshot back before returning. Inside one process, writers
//! hold the lock exclusively and readers share it, so a read never observes a
//! save in progress. Separate processes sharing a file still race and the
//! last writer wins.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::info;

pub mod record;
pub mod store;
pub mod summary;

pub use record::{Affinity, NinjaRecord, NinjaView, RegistrySnapshot, UnknownAffinity};
pub use store::{
    CorruptStatePolicy, JsonFileStore, MemoryStore, SnapshotStore, StoreError, DEFAULT_DATA_FILE,
};
pub use summary::{summarize, AffinityCount, RegistrySummary, UNALIGNED_TAG};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("registry lock was poisoned")]
    LockPoisoned,
}

pub struct Registry {
    store: Arc<dyn SnapshotStore>,
    lock: RwLock<()>,
}

impl Registry {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            lock: RwLock::new(()),
        }
    }

    /// Overwrite `affinities` and stamp `updated_at = now`; `sealed` is kept.
    pub fn upsert_affinities(
        &self,
        name: &str,
        affinities: &[String],
        now: i64,
    ) -> Result<NinjaRecord, RegistryError> {
        let record = self.mutate(name, |record| {
            record.affinities = affinities.to_vec();
            record.updated_at = Some(now);
        })?;
        info!(ninja = name, affinities = ?record.affinities, "affinities updated");
        Ok(record)
    }

    /// Overwrite `sealed`; affinities and timestamp are kept.
    pub fn upsert_seal(&self, name: &str, sealed: bool) -> Result<NinjaRecord, RegistryError> {
        let record = self.mutate(name, |record| record.sealed = Some(sealed))?;
        info!(ninja = name, sealed, "seal updated");
        Ok(record)
    }

    /// `Ok(None)` when the name is not registered.
    pub fn get(&self, name: &str) -> Result<Option<NinjaRecord>, RegistryError> {
        Ok(self.all()?.get(name).cloned())
    }

    pub fn all(&self) -> Result<RegistrySnapshot, RegistryError> {
        let _guard = self.lock.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(self.store.load()?)
    }

    fn mutate(
        &self,
        name: &str,
        apply: impl FnOnce(&mut NinjaRecord),
    ) -> Result<NinjaRecord, RegistryError> {
        let _guard = self.lock.write().map_err(|_| RegistryError::LockPoisoned)?;
        let mut snapshot = self.store.load()?;
        let record = snapshot.entry(name);
        apply(record);
        let updated = record.clone();
        self.store.save(&snapshot)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Registry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Registry::new(store.clone()), store)
    }

    #[test]
    fn first_upsert_creates_record() {
        let (registry, _) = registry();
        let record = registry
            .upsert_affinities("Naruto", &["Fuuton".to_string()], 100)
            .expect("upsert");
        assert_eq!(record.name, "Naruto");
        assert_eq!(record.affinities, vec!["Fuuton".to_string()]);
        assert_eq!(record.updated_at, Some(100));
        assert_eq!(record.sealed, None);
    }

    #[test]
    fn seal_upsert_keeps_affinities() {
        let (registry, _) = registry();
        registry
            .upsert_affinities("Sasuke", &["Katon".to_string(), "Raiton".to_string()], 7)
            .expect("upsert");
        let sealed = registry.upsert_seal("Sasuke", true).expect("seal");
        assert_eq!(sealed.affinities, vec!["Katon".to_string(), "Raiton".to_string()]);
        assert_eq!(sealed.updated_at, Some(7));
        assert_eq!(sealed.sealed, Some(true));
    }

    #[test]
    fn affinity_upsert_keeps_seal_and_replaces_list() {
        let (registry, _) = registry();
        registry.upsert_seal("Gaara", true).expect("seal");
        registry
            .upsert_affinities("Gaara", &["Doton".to_string()], 1)
            .expect("first");
        let record = registry
            .upsert_affinities("Gaara", &["Fuuton".to_string(), "Fuuton".to_string()], 2)
            .expect("second");
        assert_eq!(record.affinities, vec!["Fuuton".to_string(), "Fuuton".to_string()]);
        assert_eq!(record.updated_at, Some(2));
        assert_eq!(record.sealed, Some(true));
    }

    #[test]
    fn every_upsert_is_persisted() {
        let (registry, store) = registry();
        registry.upsert_seal("Shino", false).expect("seal");
        let raw = store.raw().expect("saved");
        assert!(raw.contains("\"Shino\""));
        assert!(raw.contains("\"sealed\": false"));
    }

    #[test]
    fn unknown_name_is_none() {
        let (registry, _) = registry();
        assert_eq!(registry.get("Nobody").expect("lookup"), None);
        assert!(registry.all().expect("all").is_empty());
    }
}
