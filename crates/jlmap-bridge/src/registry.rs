//! Id → handle table for created primitives.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use jlmap_core::error::{JlMapError, Result};
use jlmap_core::types::ObjectHandle;

/// Registry slot. A removal in flight keeps its id claimed until the engine
/// answers.
#[derive(Clone)]
enum Entry {
    Live(ObjectHandle),
    Removing(ObjectHandle),
}

impl Entry {
    fn live(&self) -> Option<&ObjectHandle> {
        match self {
            Entry::Live(handle) => Some(handle),
            Entry::Removing(_) => None,
        }
    }
}

/// Every primitive the session has created and not yet removed.
///
/// Clones share the same table.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    objects: Arc<RwLock<HashMap<String, Entry>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle. Fails if the id is taken, including by an object
    /// whose removal has not settled yet.
    pub async fn insert(&self, handle: ObjectHandle) -> Result<()> {
        let mut objects = self.objects.write().await;
        let key = handle.id.as_str().to_string();
        if objects.contains_key(&key) {
            return Err(JlMapError::DuplicateObject(key));
        }
        debug!(id = %handle.id, kind = %handle.kind, "Object registered");
        objects.insert(key, Entry::Live(handle));
        Ok(())
    }

    /// Drop a live handle outright.
    pub async fn remove(&self, id: &str) -> Option<ObjectHandle> {
        let mut objects = self.objects.write().await;
        if objects.get(id).and_then(Entry::live).is_none() {
            return None;
        }
        let removed = objects.remove(id).and_then(|entry| entry.live().cloned());
        debug!(id, "Object unregistered");
        removed
    }

    /// Mark a live handle as being removed and hand it out.
    ///
    /// The id stays claimed: lookups miss it and inserts fail until
    /// [`ObjectRegistry::finish_remove`] or [`ObjectRegistry::abort_remove`].
    pub async fn begin_remove(&self, id: &str) -> Result<ObjectHandle> {
        let mut objects = self.objects.write().await;
        let handle = objects
            .get(id)
            .and_then(Entry::live)
            .cloned()
            .ok_or_else(|| JlMapError::UnknownObject(id.to_string()))?;
        objects.insert(id.to_string(), Entry::Removing(handle.clone()));
        debug!(id, "Object removal started");
        Ok(handle)
    }

    /// The engine removed the object; release its id.
    pub async fn finish_remove(&self, id: &str) -> bool {
        let mut objects = self.objects.write().await;
        if !matches!(objects.get(id), Some(Entry::Removing(_))) {
            return false;
        }
        objects.remove(id);
        debug!(id, "Object unregistered");
        true
    }

    /// The engine kept the object; make it live again.
    pub async fn abort_remove(&self, id: &str) -> bool {
        let mut objects = self.objects.write().await;
        let Some(Entry::Removing(handle)) = objects.get(id).cloned() else {
            return false;
        };
        objects.insert(id.to_string(), Entry::Live(handle));
        debug!(id, "Object removal rolled back");
        true
    }

    pub async fn get(&self, id: &str) -> Option<ObjectHandle> {
        self.objects.read().await.get(id).and_then(Entry::live).cloned()
    }

    /// Like [`ObjectRegistry::get`], but a miss is an `UnknownObject` error.
    pub async fn resolve(&self, id: &str) -> Result<ObjectHandle> {
        self.get(id)
            .await
            .ok_or_else(|| JlMapError::UnknownObject(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.get(id).await.is_some()
    }

    /// All live handles, sorted by id.
    pub async fn handles(&self) -> Vec<ObjectHandle> {
        let mut handles: Vec<_> = self
            .objects
            .read()
            .await
            .values()
            .filter_map(Entry::live)
            .cloned()
            .collect();
        handles.sort_by(|a, b| a.id.cmp(&b.id));
        handles
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.values().filter(|e| e.live().is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use jlmap_core::types::{ObjectId, ObjectKind};

    use super::*;

    fn handle(id: &str, kind: ObjectKind) -> ObjectHandle {
        ObjectHandle::new(ObjectId::new(id).unwrap(), kind)
    }

    #[tokio::test]
    async fn test_insert_and_resolve() {
        let registry = ObjectRegistry::new();
        registry.insert(handle("circle", ObjectKind::Circle)).await.unwrap();
        assert_eq!(registry.resolve("circle").await.unwrap().kind, ObjectKind::Circle);
        assert!(matches!(
            registry.resolve("missing").await,
            Err(JlMapError::UnknownObject(ref id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let registry = ObjectRegistry::new();
        registry.insert(handle("m", ObjectKind::Marker)).await.unwrap();
        let err = registry.insert(handle("m", ObjectKind::Popup)).await.unwrap_err();
        assert!(matches!(err, JlMapError::DuplicateObject(_)));
        assert_eq!(registry.get("m").await.unwrap().kind, ObjectKind::Marker);
    }

    #[tokio::test]
    async fn test_remove_and_clone_share_state() {
        let registry = ObjectRegistry::new();
        let shared = registry.clone();
        registry.insert(handle("b", ObjectKind::Polygon)).await.unwrap();
        registry.insert(handle("a", ObjectKind::Marker)).await.unwrap();

        let ids: Vec<String> = shared
            .handles()
            .await
            .into_iter()
            .map(|h| h.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(shared.remove("a").await.is_some());
        assert!(shared.remove("a").await.is_none());
        assert!(!registry.contains("a").await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_removing_entry_keeps_id_claimed() {
        let registry = ObjectRegistry::new();
        registry.insert(handle("m1", ObjectKind::Marker)).await.unwrap();

        let taken = registry.begin_remove("m1").await.unwrap();
        assert_eq!(taken.kind, ObjectKind::Marker);
        assert!(!registry.contains("m1").await);
        assert!(registry.is_empty().await);
        assert!(matches!(
            registry.begin_remove("m1").await,
            Err(JlMapError::UnknownObject(_))
        ));
        assert!(matches!(
            registry.insert(handle("m1", ObjectKind::Circle)).await,
            Err(JlMapError::DuplicateObject(_))
        ));
        assert!(registry.remove("m1").await.is_none());

        assert!(registry.abort_remove("m1").await);
        assert_eq!(registry.get("m1").await.unwrap().kind, ObjectKind::Marker);
        assert!(!registry.finish_remove("m1").await);

        registry.begin_remove("m1").await.unwrap();
        assert!(registry.finish_remove("m1").await);
        assert!(!registry.abort_remove("m1").await);
        registry.insert(handle("m1", ObjectKind::Circle)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_have_one_winner() {
        let registry = ObjectRegistry::new();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.insert(handle("race", ObjectKind::Circle)).await.is_ok()
            }));
        }
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(registry.len().await, 1);
    }
}
