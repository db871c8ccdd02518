//! Clip execution
//!
//! Applies a clip plan to the remote store. Each clipped region keeps its
//! largest remaining piece, gains a new region for every other piece, or is
//! removed when nothing remains. The draft is stored afterwards, or for an
//! erasing draft the edited region is removed. Everything is recorded as one
//! document-level command and the scene is re-read from the store.
//!
//! As with merges, a failure part way through is not unwound.

use std::sync::Arc;

use crate::clip::ClipPlan;
use crate::history::{ActionRecorder, RegionCommand};
use mapkit_core::{
    AddRegionRequest, ErrorReporter, Region, RegionError, RegionIndex, RegionStore,
    RemoveRegionRequest, Result, Scene, SceneId, UpdateRegionRequest,
};

const CLIP_FAILED_MESSAGE: &str = "Failed to clip regions. Please try again.";

/// Result of [`ClipExecutor::execute_clip`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClipOutcome {
    pub scene: Scene,
    /// Index the draft was stored under. `None` for an erasing draft.
    pub region_index: Option<RegionIndex>,
}

/// Performs clips against one scene
#[derive(Clone)]
pub struct ClipExecutor {
    scene_id: SceneId,
    store: Arc<dyn RegionStore>,
    recorder: Arc<dyn ActionRecorder>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ClipExecutor {
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

    fn fail(&self, message: &str, error: RegionError) -> Result<ClipOutcome> {
        self.reporter.set_error_message(message);
        Err(error)
    }

    /// Executes a clip plan and returns the refreshed scene.
    ///
    /// Every clipped region, and the edited region if any, must be present in
    /// `scene`, otherwise nothing is sent to the store.
    pub async fn execute_clip(&self, scene: &Scene, plan: &ClipPlan) -> Result<ClipOutcome> {
        let edited = plan.segment.region_index;
        let missing = plan
            .clips
            .iter()
            .map(|clip| clip.region_index)
            .chain(edited)
            .find(|index| !scene.contains_region(*index));
        if let Some(index) = missing {
            tracing::warn!(scene_id = %self.scene_id, region_index = index, "Clip target missing from scene");
            let error = RegionError::RegionNotFound { index };
            return self.fail(&error.to_string(), error);
        }

        match self.apply(scene, plan).await {
            Ok((local, commands, region_index)) => {
                if !commands.is_empty() {
                    let name = if plan.erases() { "Erase regions" } else { "Clip regions" };
                    self.recorder.record(RegionCommand::Batch {
                        name: name.to_string(),
                        commands,
                    });
                }

                let refreshed = match self.store.refetch(self.scene_id).await {
                    Ok(scene) => scene,
                    Err(e) => {
                        tracing::warn!(scene_id = %self.scene_id, error = %e, "Refetch after clip failed, using local result");
                        local
                    }
                };
                tracing::info!(
                    scene_id = %self.scene_id,
                    clipped = plan.clips.len(),
                    erased = plan.erases(),
                    "Regions clipped"
                );
                Ok(ClipOutcome {
                    scene: refreshed,
                    region_index,
                })
            }
            Err(e) => {
                tracing::error!(scene_id = %self.scene_id, error = %e, "Clip failed, leaving partial clip for refetch");
                self.fail(CLIP_FAILED_MESSAGE, e)
            }
        }
    }

    async fn apply(
        &self,
        scene: &Scene,
        plan: &ClipPlan,
    ) -> Result<(Scene, Vec<RegionCommand>, Option<RegionIndex>)> {
        let scene_id = self.scene_id;
        let mut local = scene.clone();
        let mut commands = Vec::new();

        for clip in &plan.clips {
            let original = &clip.original_region;
            let Some((kept, extra)) = clip.pieces.split_first() else {
                self.store
                    .remove_region(RemoveRegionRequest {
                        scene_id,
                        region_index: clip.region_index,
                    })
                    .await?;
                local = local.without_region(clip.region_index);
                commands.push(RegionCommand::Delete {
                    scene_id,
                    region: original.clone(),
                });
                continue;
            };

            self.store
                .update_region(UpdateRegionRequest::vertices_only(
                    scene_id,
                    clip.region_index,
                    kept.clone(),
                ))
                .await?;
            let reshaped = Region {
                vertices: kept.clone(),
                ..original.clone()
            };
            local = local.with_region(reshaped.clone());
            commands.push(RegionCommand::Edit {
                scene_id,
                region_index: clip.region_index,
                old_region: original.clone(),
                new_region: reshaped,
            });

            for piece in extra {
                let split_off = Region {
                    vertices: piece.clone(),
                    ..original.clone()
                };
                let added = self
                    .store
                    .add_region(AddRegionRequest::from_region(scene_id, &split_off))
                    .await?;
                let split_off = Region {
                    index: added.index,
                    ..split_off
                };
                local = local.with_region(split_off.clone());
                commands.push(RegionCommand::Create {
                    scene_id,
                    region: split_off,
                });
            }
        }

        let segment = &plan.segment;
        let region_index = match (segment.region_index, plan.erases()) {
            (Some(index), true) => {
                self.store
                    .remove_region(RemoveRegionRequest {
                        scene_id,
                        region_index: index,
                    })
                    .await?;
                if let Some(region) = local.region(index).cloned() {
                    commands.push(RegionCommand::Delete {
                        scene_id,
                        region: plan.original.clone().unwrap_or(region),
                    });
                }
                local = local.without_region(index);
                None
            }
            (None, true) => None,
            (Some(index), false) => {
                let region = segment.to_region(index);
                self.store
                    .update_region(UpdateRegionRequest::from_region(scene_id, index, &region))
                    .await?;
                let previous = plan
                    .original
                    .clone()
                    .or_else(|| local.region(index).cloned())
                    .unwrap_or_else(|| region.clone());
                local = local.with_region(region.clone());
                commands.push(RegionCommand::Edit {
                    scene_id,
                    region_index: index,
                    old_region: previous,
                    new_region: region,
                });
                Some(index)
            }
            (None, false) => {
                let draft = segment.to_region(0);
                let added = self
                    .store
                    .add_region(AddRegionRequest::from_region(scene_id, &draft))
                    .await?;
                let region = segment.to_region(added.index);
                local = local.with_region(region.clone());
                commands.push(RegionCommand::Create { scene_id, region });
                Some(added.index)
            }
        };

        Ok((local, commands, region_index))
    }
}
