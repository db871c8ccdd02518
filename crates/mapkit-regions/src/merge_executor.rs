//! Merge execution
//!
//! Applies a merge decision to the remote store: the target region receives
//! the union first, then the redundant regions are removed one by one. The
//! whole merge is recorded as a single document-level command and the scene
//! is re-read from the store afterwards.
//!
//! A failure part way through is not unwound. Removals that already went
//! through stay applied and the next refetch brings the local scene back in
//! line with the store.

use std::sync::Arc;

use crate::history::{ActionRecorder, RegionCommand};
use crate::merge::MergeResult;
use mapkit_core::{
    ErrorReporter, Point, Region, RegionError, RegionIndex, RegionStore, RemoveRegionRequest,
    Result, Scene, SceneId, UpdateRegionRequest,
};

const MERGE_FAILED_MESSAGE: &str = "Failed to merge regions. Please try again.";

/// Input to [`MergeExecutor::execute_merge`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    pub target_region_index: RegionIndex,
    /// The target as it was before the merge. Taken from the scene when
    /// absent.
    pub original_target_region: Option<Region>,
    pub merged_vertices: Vec<Point>,
    pub regions_to_delete: Vec<RegionIndex>,
}

impl From<&MergeResult> for MergeRequest {
    fn from(result: &MergeResult) -> Self {
        Self {
            target_region_index: result.target_region_index,
            original_target_region: result.original_target().cloned(),
            merged_vertices: result.merged_vertices.clone(),
            regions_to_delete: result.regions_to_delete.clone(),
        }
    }
}

/// Performs merges against one scene
#[derive(Clone)]
pub struct MergeExecutor {
    scene_id: SceneId,
    store: Arc<dyn RegionStore>,
    recorder: Arc<dyn ActionRecorder>,
    reporter: Arc<dyn ErrorReporter>,
}

impl MergeExecutor {
    pub fn new(
        scene_id: SceneId,
        store: Arc<dyn RegionStore>,
        recorder: Arc<dyn ActionRecorder>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            scene_id,
            store,
            recorder,
            reporter,
        }
    }

    fn fail(&self, message: &str, error: RegionError, on_error: impl FnOnce(&RegionError)) -> Result<Scene> {
        self.reporter.set_error_message(message);
        on_error(&error);
        Err(error)
    }

    /// Executes a merge and returns the refreshed scene.
    ///
    /// `scene` is the caller's current view of the scene. The target and every
    /// region to delete must be present in it, otherwise nothing is sent to
    /// the store. `on_success` receives the refreshed scene, `on_error` the
    /// failure, which has also been reported to the user.
    pub async fn execute_merge(
        &self,
        scene: &Scene,
        request: MergeRequest,
        on_success: impl FnOnce(&Scene),
        on_error: impl FnOnce(&RegionError),
    ) -> Result<Scene> {
        let Some(current_target) = scene.region(request.target_region_index) else {
            tracing::warn!(
                scene_id = %self.scene_id,
                region_index = request.target_region_index,
                "Merge target missing from scene"
            );
            let error = RegionError::MergeTargetNotFound;
            return self.fail(&error.to_string(), error, on_error);
        };

        let mut deleted = Vec::with_capacity(request.regions_to_delete.len());
        for &index in &request.regions_to_delete {
            match scene.region(index) {
                Some(region) => deleted.push(region.clone()),
                None => {
                    tracing::warn!(scene_id = %self.scene_id, region_index = index, "Merge delete target missing from scene");
                    let error = RegionError::RegionNotFound { index };
                    return self.fail(&error.to_string(), error, on_error);
                }
            }
        }

        let original_target = request
            .original_target_region
            .clone()
            .unwrap_or_else(|| current_target.clone());

        let update = UpdateRegionRequest::vertices_only(
            self.scene_id,
            request.target_region_index,
            request.merged_vertices.clone(),
        );
        if let Err(e) = self.store.update_region(update).await {
            tracing::error!(scene_id = %self.scene_id, error = %e, "Merge target update failed");
            return self.fail(MERGE_FAILED_MESSAGE, e, on_error);
        }

        for region in &deleted {
            let remove = RemoveRegionRequest {
                scene_id: self.scene_id,
                region_index: region.index,
            };
            if let Err(e) = self.store.remove_region(remove).await {
                tracing::error!(
                    scene_id = %self.scene_id,
                    region_index = region.index,
                    error = %e,
                    "Merge delete failed, leaving partial merge for refetch"
                );
                return self.fail(MERGE_FAILED_MESSAGE, e, on_error);
            }
        }

        let mut merged_target = original_target.clone();
        merged_target.vertices = request.merged_vertices.clone();

        let mut commands = vec![RegionCommand::Edit {
            scene_id: self.scene_id,
            region_index: request.target_region_index,
            old_region: original_target,
            new_region: merged_target.clone(),
        }];
        commands.extend(deleted.iter().map(|region| RegionCommand::Delete {
            scene_id: self.scene_id,
            region: region.clone(),
        }));
        self.recorder.record(RegionCommand::Batch {
            name: "Merge regions".to_string(),
            commands,
        });

        let refreshed = match self.store.refetch(self.scene_id).await {
            Ok(scene) => scene,
            Err(e) => {
                tracing::warn!(scene_id = %self.scene_id, error = %e, "Refetch after merge failed, using local result");
                deleted
                    .iter()
                    .fold(scene.with_region(merged_target), |s, region| s.without_region(region.index))
            }
        };

        tracing::info!(
            scene_id = %self.scene_id,
            target_region_index = request.target_region_index,
            deleted = deleted.len(),
            "Regions merged"
        );
        on_success(&refreshed);
        Ok(refreshed)
    }
}
