//! Region command dispatcher
//!
//! Maps UI intents onto the transaction, the merge and clip executors and
//! the store, and keeps the UI-facing indices in step. No geometry happens
//! here.

use std::sync::Arc;

use crate::clip::ClipPlan;
use crate::clip_executor::ClipExecutor;
use crate::history::{ActionRecorder, RegionCommand};
use crate::local_history::LocalAction;
use crate::merge::MergeResult;
use crate::merge_executor::{MergeExecutor, MergeRequest};
use crate::segment::SegmentProperties;
use crate::transaction::{CommitResult, MergeContext, RegionTransaction, TransactionKind};
use mapkit_core::{
    EditorConfig, ErrorReporter, Point, RegionError, RegionIndex, RegionStore,
    RemoveRegionRequest, Result, Scene, UpdateRegionRequest,
};

const DELETE_FAILED_MESSAGE: &str = "Failed to delete region. Please try again.";
const PLACE_FAILED_MESSAGE: &str = "Failed to place region. Please try again.";
const UPDATE_FAILED_MESSAGE: &str = "Failed to update region. Please try again.";

/// Selection and editing indices shown by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionEditorState {
    pub selected_region_index: Option<RegionIndex>,
    pub editing_region_index: Option<RegionIndex>,
    pub is_editing_vertices: bool,
    /// Vertices of the edited region when editing started
    pub original_region_vertices: Option<Vec<Point>>,
    pub is_drawing_region: bool,
}

impl RegionEditorState {
    fn end_editing(&mut self) {
        self.editing_region_index = None;
        self.selected_region_index = None;
        self.is_editing_vertices = false;
        self.original_region_vertices = None;
    }
}

/// Region command dispatcher for one scene
pub struct RegionHandlers {
    scene: Scene,
    state: RegionEditorState,
    transaction: RegionTransaction,
    store: Arc<dyn RegionStore>,
    recorder: Arc<dyn ActionRecorder>,
    reporter: Arc<dyn ErrorReporter>,
    executor: MergeExecutor,
    clipper: ClipExecutor,
}

impl RegionHandlers {
    pub fn new(
        scene: Scene,
        store: Arc<dyn RegionStore>,
        recorder: Arc<dyn ActionRecorder>,
        reporter: Arc<dyn ErrorReporter>,
        config: &EditorConfig,
    ) -> Self {
        let executor = MergeExecutor::new(
            scene.id,
            Arc::clone(&store),
            Arc::clone(&recorder),
            Arc::clone(&reporter),
        );
        let clipper = ClipExecutor::new(
            scene.id,
            Arc::clone(&store),
            Arc::clone(&recorder),
            Arc::clone(&reporter),
        );
        Self {
            scene,
            state: RegionEditorState::default(),
            transaction: RegionTransaction::new(config),
            store,
            recorder,
            reporter,
            executor,
            clipper,
        }
    }

    /// The local view of the scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &RegionEditorState {
        &self.state
    }

    pub fn transaction(&self) -> &RegionTransaction {
        &self.transaction
    }

    /// Replaces the local view of the scene, e.g. after a document undo
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
    }

    pub fn handle_region_select(&mut self, index: Option<RegionIndex>) {
        self.state.selected_region_index = index.filter(|i| self.scene.contains_region(*i));
    }

    /// Deletes a region. A region that is no longer in the scene counts as
    /// already deleted.
    pub async fn handle_region_delete(&mut self, index: RegionIndex) -> Result<()> {
        let Some(region) = self.scene.region(index).cloned() else {
            tracing::debug!(region_index = index, "Region already gone, nothing to delete");
            return Ok(());
        };

        let request = RemoveRegionRequest {
            scene_id: self.scene.id,
            region_index: index,
        };
        if let Err(e) = self.store.remove_region(request).await {
            tracing::error!(region_index = index, error = %e, "Region delete failed");
            self.reporter.set_error_message(DELETE_FAILED_MESSAGE);
            return Err(e);
        }

        self.scene = self.scene.without_region(index);
        self.recorder.record(RegionCommand::Delete {
            scene_id: self.scene.id,
            region,
        });

        if self.state.selected_region_index == Some(index) {
            self.state.selected_region_index = None;
        }
        if self.state.editing_region_index == Some(index) {
            self.transaction.rollback_transaction();
            self.state.end_editing();
        }
        tracing::info!(region_index = index, "Region deleted");
        Ok(())
    }

    /// Starts drawing a new region
    pub fn handle_place_region(&mut self, properties: SegmentProperties) -> Result<()> {
        self.transaction
            .start_transaction(TransactionKind::Placement, None, Some(properties))?;
        self.state.is_drawing_region = true;
        self.state.selected_region_index = None;
        Ok(())
    }

    /// Starts editing the vertices of an existing region
    pub fn handle_edit_region_vertices(&mut self, index: RegionIndex) -> Result<()> {
        let region = self
            .scene
            .region(index)
            .ok_or(RegionError::RegionNotFound { index })?;
        self.transaction
            .start_transaction(TransactionKind::Editing, Some(region), None)?;

        self.state.original_region_vertices = Some(region.vertices.clone());
        self.state.editing_region_index = Some(index);
        self.state.selected_region_index = Some(index);
        self.state.is_editing_vertices = true;
        Ok(())
    }

    /// Appends a vertex to the region being drawn and records it for local
    /// undo
    pub fn handle_place_vertex(&mut self, point: Point) -> Result<()> {
        self.transaction.add_vertex(point)?;
        if let Some(action) = self
            .transaction
            .segment()
            .and_then(|s| LocalAction::place_vertex(&s.vertices))
        {
            self.transaction.push_local_action(action);
        }
        Ok(())
    }

    /// Replaces the draft's vertices, recording `action` for local undo if
    /// given
    pub fn handle_update_vertices(
        &mut self,
        vertices: Vec<Point>,
        action: Option<LocalAction>,
    ) -> Result<()> {
        self.transaction.update_vertices(vertices)?;
        if let Some(action) = action {
            self.transaction.push_local_action(action);
        }
        Ok(())
    }

    pub fn handle_undo_local(&mut self) -> bool {
        self.transaction.undo_local()
    }

    pub fn handle_redo_local(&mut self) -> bool {
        self.transaction.redo_local()
    }

    pub fn handle_cancel_editing_region(&mut self) {
        if self.transaction.kind() == Some(TransactionKind::Editing) {
            self.transaction.rollback_transaction();
        }
        self.state.end_editing();
    }

    pub fn handle_cancel_placement(&mut self) {
        if self.transaction.kind() == Some(TransactionKind::Placement) {
            self.transaction.rollback_transaction();
        }
        self.state.is_drawing_region = false;
    }

    async fn commit(&mut self) -> CommitResult {
        let scene_id = self.scene.id;
        self.transaction
            .commit_transaction(
                scene_id,
                self.store.as_ref(),
                Some(MergeContext::for_scene(&self.scene)),
            )
            .await
    }

    /// Re-reads the scene after a failed multi-step write. Best effort: the
    /// local view is kept when the store cannot be reached either.
    async fn resync(&mut self) {
        match self.store.refetch(self.scene.id).await {
            Ok(scene) => self.scene = scene,
            Err(e) => tracing::warn!(error = %e, "Resync after failed write did not succeed"),
        }
    }

    async fn run_merge(&mut self, merge: &MergeResult) -> Result<Option<RegionIndex>> {
        let target = merge.target_region_index;
        let result = self
            .executor
            .execute_merge(
                &self.scene,
                MergeRequest::from(merge),
                |scene| tracing::debug!(regions = scene.regions.len(), "Merge applied"),
                |error| tracing::debug!(%error, "Merge not applied"),
            )
            .await;
        match result {
            Ok(scene) => {
                self.scene = scene;
                Ok(Some(target))
            }
            Err(e) => {
                if e.is_remote_error() {
                    self.resync().await;
                }
                Err(e)
            }
        }
    }

    async fn run_clip(&mut self, plan: &ClipPlan) -> Result<Option<RegionIndex>> {
        match self.clipper.execute_clip(&self.scene, plan).await {
            Ok(outcome) => {
                self.scene = outcome.scene;
                Ok(outcome.region_index)
            }
            Err(e) => {
                if e.is_remote_error() {
                    self.resync().await;
                }
                Err(e)
            }
        }
    }

    /// Reports a failed store call. Local failures are only returned.
    fn commit_failed(&self, error: RegionError, message: &str) -> Result<Option<RegionIndex>> {
        if error.is_remote_error() || error.is_inconsistency() {
            self.reporter.set_error_message(message);
        }
        Err(error)
    }

    /// Commits the region being drawn.
    ///
    /// Returns the index of the new region, or of the region it was merged
    /// into, or `None` for a null region that only erased. On failure the
    /// drawing stays active.
    pub async fn handle_placement_finish(&mut self) -> Result<Option<RegionIndex>> {
        match self.commit().await {
            CommitResult::Created { region } => {
                let index = region.index;
                self.scene = self.scene.with_region(region.clone());
                self.recorder.record(RegionCommand::Create {
                    scene_id: self.scene.id,
                    region,
                });
                self.state.is_drawing_region = false;
                Ok(Some(index))
            }
            CommitResult::Merge { merge } => {
                self.state.is_drawing_region = false;
                self.run_merge(&merge).await
            }
            CommitResult::Clip { plan } | CommitResult::NullClip { plan } => {
                self.state.is_drawing_region = false;
                self.run_clip(&plan).await
            }
            CommitResult::Edited { region, .. } => {
                tracing::warn!(region_index = region.index, "Placement committed as an edit");
                self.state.is_drawing_region = false;
                Ok(Some(region.index))
            }
            CommitResult::Failed { error } => self.commit_failed(error, PLACE_FAILED_MESSAGE),
        }
    }

    /// Commits the region being edited.
    ///
    /// Returns the index of the edited region, or of the region it was
    /// merged into, or `None` when the edit turned it into a null region and
    /// it was removed. On failure the edit stays active.
    pub async fn handle_finish_editing_region(&mut self) -> Result<Option<RegionIndex>> {
        match self.commit().await {
            CommitResult::Edited { region, previous } => {
                let index = region.index;
                self.scene = self.scene.with_region(region.clone());
                self.recorder.record(RegionCommand::Edit {
                    scene_id: self.scene.id,
                    region_index: index,
                    old_region: previous,
                    new_region: region,
                });
                self.state.end_editing();
                Ok(Some(index))
            }
            CommitResult::Merge { merge } => {
                self.state.end_editing();
                self.run_merge(&merge).await
            }
            CommitResult::Clip { plan } | CommitResult::NullClip { plan } => {
                self.state.end_editing();
                self.run_clip(&plan).await
            }
            CommitResult::Created { region } => {
                tracing::warn!(region_index = region.index, "Edit committed as a create");
                self.state.end_editing();
                Ok(Some(region.index))
            }
            CommitResult::Failed { error } => self.commit_failed(error, UPDATE_FAILED_MESSAGE),
        }
    }

    /// Updates non-geometric attributes of a region outside any transaction.
    ///
    /// The local scene is updated first. If the store rejects the update the
    /// scene is re-read, or restored when that fails too.
    pub async fn handle_region_property_update(
        &mut self,
        index: RegionIndex,
        properties: SegmentProperties,
    ) -> Result<()> {
        let previous = self
            .scene
            .region(index)
            .cloned()
            .ok_or(RegionError::RegionNotFound { index })?;

        let request = UpdateRegionRequest {
            name: properties.name.clone(),
            region_type: properties.region_type.clone(),
            value: properties.value,
            label: properties.label.clone(),
            color: properties.color.clone(),
            ..UpdateRegionRequest::new(self.scene.id, index)
        };
        let mut updated = previous.clone();
        request.apply_to(&mut updated);
        self.scene = self.scene.with_region(updated.clone());

        if let Err(e) = self.store.update_region(request).await {
            tracing::error!(region_index = index, error = %e, "Region property update failed");
            self.reporter.set_error_message(UPDATE_FAILED_MESSAGE);
            self.scene = match self.store.refetch(self.scene.id).await {
                Ok(scene) => scene,
                Err(_) => self.scene.with_region(previous),
            };
            return Err(e);
        }

        if self.state.editing_region_index == Some(index) {
            self.transaction.update_segment_properties(&properties)?;
        }
        self.recorder.record(RegionCommand::Edit {
            scene_id: self.scene.id,
            region_index: index,
            old_region: previous,
            new_region: updated,
        });
        Ok(())
    }

    /// Finishes the current edit, then starts editing `index`.
    ///
    /// A drawing in progress is discarded. If finishing the current edit
    /// fails, nothing switches.
    pub async fn handle_switch_to_region(&mut self, index: RegionIndex) -> Result<()> {
        match self.transaction.kind() {
            Some(TransactionKind::Editing) => {
                if self.state.editing_region_index == Some(index) {
                    return Ok(());
                }
                self.handle_finish_editing_region().await?;
            }
            Some(TransactionKind::Placement) => self.handle_cancel_placement(),
            None => {}
        }
        self.handle_edit_region_vertices(index)
    }
}
