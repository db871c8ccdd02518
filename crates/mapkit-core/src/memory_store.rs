//! In-memory region store
//!
//! A [`RegionStore`] backed by a map of scenes. Used by the replay binary and
//! by tests, which can script failures and inspect the calls that were made.

use crate::data::{Region, RegionIndex, Scene, SceneId};
use crate::error::{RegionError, Result};
use crate::store::{
    AddRegionRequest, AddedRegion, RegionStore, RemoveRegionRequest, UpdateRegionRequest,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Kind of store operation, used to script failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Add,
    Update,
    Remove,
    Refetch,
}

/// A call received by the store, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Add(AddRegionRequest),
    Update(UpdateRegionRequest),
    Remove(RemoveRegionRequest),
    Refetch(SceneId),
}

#[derive(Default)]
struct StoreInner {
    scenes: HashMap<SceneId, Scene>,
    next_index: HashMap<SceneId, RegionIndex>,
    pending_failures: Vec<StoreOperation>,
    failing_removals: Vec<RegionIndex>,
    calls: Vec<StoreCall>,
}

impl StoreInner {
    fn take_failure(&mut self, operation: StoreOperation) -> Result<()> {
        if let Some(pos) = self.pending_failures.iter().position(|op| *op == operation) {
            self.pending_failures.remove(pos);
            return Err(RegionError::remote(format!("Simulated {:?} failure", operation)));
        }
        Ok(())
    }

    fn scene_mut(&mut self, scene_id: SceneId) -> Result<&mut Scene> {
        self.scenes
            .get_mut(&scene_id)
            .ok_or_else(|| RegionError::SceneNotFound(scene_id.to_string()))
    }
}

/// Thread-safe in-memory [`RegionStore`]
#[derive(Default)]
pub struct InMemoryRegionStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryRegionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with one scene
    pub fn with_scene(scene: Scene) -> Self {
        let store = Self::new();
        store.insert_scene(scene);
        store
    }

    /// Inserts or replaces a scene
    pub fn insert_scene(&self, scene: Scene) {
        let mut inner = self.inner.lock();
        let next = scene.regions.iter().map(|r| r.index + 1).max().unwrap_or(0);
        inner.next_index.insert(scene.id, next);
        inner.scenes.insert(scene.id, scene);
    }

    /// Returns the stored state of a scene without logging a call
    pub fn snapshot(&self, scene_id: SceneId) -> Option<Scene> {
        self.inner.lock().scenes.get(&scene_id).cloned()
    }

    /// Makes the next call of the given kind fail with a remote error
    pub fn fail_next(&self, operation: StoreOperation) {
        self.inner.lock().pending_failures.push(operation);
    }

    /// Makes every removal of the given region fail
    pub fn fail_remove_of(&self, index: RegionIndex) {
        self.inner.lock().failing_removals.push(index);
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of mutating calls (add, update, remove) received so far
    pub fn mutation_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| !matches!(c, StoreCall::Refetch(_)))
            .count()
    }

    /// Forgets the call log
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

#[async_trait]
impl RegionStore for InMemoryRegionStore {
    async fn add_region(&self, request: AddRegionRequest) -> Result<AddedRegion> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Add(request.clone()));
        inner.take_failure(StoreOperation::Add)?;

        let scene_id = request.scene_id;
        inner.scene_mut(scene_id)?;
        let index = inner.next_index.get(&scene_id).copied().unwrap_or(0);
        inner.next_index.insert(scene_id, index + 1);

        let scene = inner.scene_mut(scene_id)?;
        scene.regions.push(Region {
            index,
            name: request.name,
            region_type: request.region_type,
            vertices: request.vertices,
            value: request.value,
            label: request.label,
            color: request.color,
        });
        tracing::trace!(%scene_id, index, "Stored new region");
        Ok(AddedRegion { index })
    }

    async fn update_region(&self, request: UpdateRegionRequest) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Update(request.clone()));
        inner.take_failure(StoreOperation::Update)?;

        let scene = inner.scene_mut(request.scene_id)?;
        let region = scene
            .regions
            .iter_mut()
            .find(|r| r.index == request.region_index)
            .ok_or(RegionError::RegionNotFound {
                index: request.region_index,
            })?;
        request.apply_to(region);
        Ok(())
    }

    async fn remove_region(&self, request: RemoveRegionRequest) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Remove(request));
        inner.take_failure(StoreOperation::Remove)?;
        if inner.failing_removals.contains(&request.region_index) {
            return Err(RegionError::remote(format!(
                "Simulated failure removing region {}",
                request.region_index
            )));
        }

        let scene = inner.scene_mut(request.scene_id)?;
        let before = scene.regions.len();
        scene.regions.retain(|r| r.index != request.region_index);
        if scene.regions.len() == before {
            return Err(RegionError::RegionNotFound {
                index: request.region_index,
            });
        }
        Ok(())
    }

    async fn refetch(&self, scene_id: SceneId) -> Result<Scene> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Refetch(scene_id));
        inner.take_failure(StoreOperation::Refetch)?;
        inner
            .scenes
            .get(&scene_id)
            .cloned()
            .ok_or_else(|| RegionError::SceneNotFound(scene_id.to_string()))
    }
}
