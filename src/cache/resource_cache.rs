use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::metrics::CACHE_ENTRIES;
use crate::ChangeEvent;
use crate::Error;
use crate::Resource;
use crate::ResourceKey;
use crate::ResourceKind;
use crate::Result;

/// Indexed snapshot of one resource kind.
///
/// Written only by the informer that owns it; any number of readers. Every
/// read and write takes the lock once, so readers never see a half-applied
/// bulk load.
pub struct ResourceCache {
    kind: ResourceKind,
    entries: RwLock<HashMap<ResourceKey, Resource>>,
}

impl ResourceCache {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Replaces the entire entry set and returns the difference against the
    /// previous contents: `Added` for new keys, `Updated` for keys present in
    /// both, `Deleted` for keys that vanished.
    pub fn bulk_load(
        &self,
        items: Vec<Resource>,
    ) -> Result<Vec<ChangeEvent>> {
        if let Some(stray) = items.iter().find(|item| item.kind != self.kind) {
            return Err(self.mismatch(stray.kind));
        }

        let mut fresh: HashMap<ResourceKey, Resource> = HashMap::with_capacity(items.len());
        for item in items {
            fresh.insert(item.key(), item);
        }

        let mut events = Vec::with_capacity(fresh.len());
        let mut entries = self.entries.write();
        let previous = std::mem::replace(&mut *entries, fresh);

        for (key, resource) in entries.iter() {
            match previous.get(key) {
                Some(old) => events.push(ChangeEvent::Updated {
                    old: old.clone(),
                    new: resource.clone(),
                }),
                None => events.push(ChangeEvent::Added(resource.clone())),
            }
        }
        for (key, old) in previous {
            if !entries.contains_key(&key) {
                events.push(ChangeEvent::Deleted(old));
            }
        }

        self.record_len(entries.len());
        trace!(kind = %self.kind, entries = entries.len(), "bulk load applied");
        Ok(events)
    }

    /// Applies one change. Updates and deletes for unknown keys are ignored:
    /// the watch source is authoritative and late events are already converged.
    pub fn apply(
        &self,
        event: &ChangeEvent,
    ) -> Result<()> {
        if event.kind() != self.kind {
            return Err(self.mismatch(event.kind()));
        }

        let mut entries = self.entries.write();
        match event {
            ChangeEvent::Added(resource) => {
                entries.insert(resource.key(), resource.clone());
            }
            ChangeEvent::Updated { new, .. } => {
                if let Some(entry) = entries.get_mut(&new.key()) {
                    *entry = new.clone();
                } else {
                    trace!(kind = %self.kind, key = %new.key(), "update for unknown key ignored");
                }
            }
            ChangeEvent::Deleted(resource) => {
                if entries.remove(&resource.key()).is_none() {
                    trace!(kind = %self.kind, key = %resource.key(), "delete for unknown key ignored");
                }
            }
        }
        self.record_len(entries.len());
        Ok(())
    }

    pub fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Option<Resource> {
        self.entries.read().get(&ResourceKey::new(namespace, name)).cloned()
    }

    /// Snapshot of every entry; order is unspecified.
    pub fn list_all(&self) -> Vec<Resource> {
        self.entries.read().values().cloned().collect()
    }

    pub fn list_namespace(
        &self,
        namespace: &str,
    ) -> Vec<Resource> {
        self.entries
            .read()
            .values()
            .filter(|resource| resource.namespace == namespace)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mismatch(
        &self,
        actual: ResourceKind,
    ) -> Error {
        Error::KindMismatch {
            expected: self.kind,
            actual,
        }
    }

    fn record_len(
        &self,
        len: usize,
    ) {
        CACHE_ENTRIES.with_label_values(&[self.kind.as_str()]).set(len as i64);
    }
}
