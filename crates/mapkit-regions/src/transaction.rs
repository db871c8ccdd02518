//! Region transaction state machine
//!
//! One transaction owns the draft of the region being placed or edited
//! together with its local undo log. The state is a tagged enum, so an idle
//! transaction cannot hold a segment and an editing transaction always holds
//! the region it started from.
//!
//! ```text
//! Idle ──start(Placement)──▶ Placement ──commit ok / rollback──▶ Idle
//! Idle ──start(Editing)────▶ Editing   ──commit ok / rollback──▶ Idle
//! ```
//!
//! A failed commit leaves the transaction where it was so the user can fix
//! the draft or retry.

use crate::clip::{detect_clip, detect_null_clip, ClipPlan, ClipResult};
use crate::geometry::{clean_polygon_vertices, DEFAULT_TOLERANCE};
use crate::local_history::{LocalAction, LocalHistory};
use crate::merge::{detect_merge, MergeResult};
use crate::segment::{RegionSegment, SegmentProperties};
use mapkit_core::{
    AddRegionRequest, EditorConfig, GridConfig, Point, Region, RegionError, RegionIndex,
    RegionStore, Result, Scene, SceneId, UpdateRegionRequest,
};

/// Which kind of gesture a transaction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Drawing a brand-new region
    Placement,
    /// Reshaping or re-attributing an existing region
    Editing,
}

/// Lifecycle state of a [`RegionTransaction`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Placement {
        segment: RegionSegment,
    },
    Editing {
        segment: RegionSegment,
        /// Snapshot taken when editing started
        original: Region,
    },
}

impl TransactionState {
    pub fn kind(&self) -> Option<TransactionKind> {
        match self {
            TransactionState::Idle => None,
            TransactionState::Placement { .. } => Some(TransactionKind::Placement),
            TransactionState::Editing { .. } => Some(TransactionKind::Editing),
        }
    }

    pub fn segment(&self) -> Option<&RegionSegment> {
        match self {
            TransactionState::Idle => None,
            TransactionState::Placement { segment } | TransactionState::Editing { segment, .. } => {
                Some(segment)
            }
        }
    }

    fn segment_mut(&mut self) -> Option<&mut RegionSegment> {
        match self {
            TransactionState::Idle => None,
            TransactionState::Placement { segment } | TransactionState::Editing { segment, .. } => {
                Some(segment)
            }
        }
    }
}

/// Scene state consulted for merge detection on commit
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub scene: &'a Scene,
    pub grid: &'a GridConfig,
}

impl<'a> MergeContext<'a> {
    pub fn new(scene: &'a Scene, grid: &'a GridConfig) -> Self {
        Self { scene, grid }
    }

    /// Uses the scene's own grid
    pub fn for_scene(scene: &'a Scene) -> Self {
        Self::new(scene, &scene.grid)
    }
}

/// What a commit turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    Create,
    Edit,
    Merge,
    Clip,
    NullClip,
}

/// Result of [`RegionTransaction::commit_transaction`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommitResult {
    /// A new region was stored under a server-assigned index
    Created { region: Region },
    /// An existing region was updated
    Edited { region: Region, previous: Region },
    /// The draft became a merge instruction. Nothing was written; the caller
    /// hands the result to the merge executor.
    Merge { merge: MergeResult },
    /// The draft overlaps regions it does not match and cuts itself out of
    /// them. Nothing was written; the caller hands the plan to the clip
    /// executor, which also stores the draft.
    Clip { plan: ClipPlan },
    /// The draft is a null region. It erases what it covers and is never
    /// stored itself.
    NullClip { plan: ClipPlan },
    /// Nothing was committed and the transaction is still active
    Failed { error: RegionError },
}

impl CommitResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, CommitResult::Failed { .. })
    }

    pub fn action(&self) -> Option<CommitAction> {
        match self {
            CommitResult::Created { .. } => Some(CommitAction::Create),
            CommitResult::Edited { .. } => Some(CommitAction::Edit),
            CommitResult::Merge { .. } => Some(CommitAction::Merge),
            CommitResult::Clip { .. } => Some(CommitAction::Clip),
            CommitResult::NullClip { .. } => Some(CommitAction::NullClip),
            CommitResult::Failed { .. } => None,
        }
    }

    /// Index of the created or edited region, or the merge target. Placement
    /// clips have no index until the executor stores the draft.
    pub fn region_index(&self) -> Option<RegionIndex> {
        match self {
            CommitResult::Created { region } | CommitResult::Edited { region, .. } => {
                Some(region.index)
            }
            CommitResult::Merge { merge } => Some(merge.target_region_index),
            CommitResult::Clip { plan } => plan.segment.region_index,
            CommitResult::NullClip { .. } | CommitResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RegionError> {
        match self {
            CommitResult::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// The single active region transaction of an editing session
#[derive(Debug, Clone)]
pub struct RegionTransaction {
    state: TransactionState,
    local: LocalHistory,
    tolerance_ratio: f64,
    default_region_type: String,
    default_region_color: String,
}

impl RegionTransaction {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: TransactionState::Idle,
            local: LocalHistory::with_depth(config.local_history_depth),
            tolerance_ratio: config.adjacency_tolerance_ratio,
            default_region_type: config.default_region_type.clone(),
            default_region_color: config.default_region_color.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, TransactionState::Idle)
    }

    pub fn kind(&self) -> Option<TransactionKind> {
        self.state.kind()
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn segment(&self) -> Option<&RegionSegment> {
        self.state.segment()
    }

    /// The region an editing transaction started from
    pub fn original_region(&self) -> Option<&Region> {
        match &self.state {
            TransactionState::Editing { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Starts a transaction.
    ///
    /// Editing copies `existing` into the draft and keeps it as the original.
    /// Placement seeds an empty draft from `properties`, falling back to the
    /// configured default type and color.
    pub fn start_transaction(
        &mut self,
        kind: TransactionKind,
        existing: Option<&Region>,
        properties: Option<SegmentProperties>,
    ) -> Result<()> {
        if self.is_active() {
            return Err(RegionError::TransactionAlreadyActive);
        }

        self.state = match kind {
            TransactionKind::Placement => {
                let properties = properties.unwrap_or_default();
                TransactionState::Placement {
                    segment: RegionSegment {
                        region_index: None,
                        name: properties.name.unwrap_or_default(),
                        region_type: properties
                            .region_type
                            .unwrap_or_else(|| self.default_region_type.clone()),
                        vertices: Vec::new(),
                        value: properties.value,
                        label: properties.label,
                        color: Some(
                            properties
                                .color
                                .unwrap_or_else(|| self.default_region_color.clone()),
                        ),
                    },
                }
            }
            TransactionKind::Editing => {
                let original = existing.ok_or(RegionError::MissingRegion)?.clone();
                let mut segment = RegionSegment::from_region(&original);
                if let Some(properties) = &properties {
                    segment.apply(properties);
                }
                TransactionState::Editing { segment, original }
            }
        };
        self.local.clear();

        tracing::debug!(
            ?kind,
            region_index = ?self.segment().and_then(|s| s.region_index),
            "Region transaction started"
        );
        Ok(())
    }

    fn active_segment_mut(&mut self) -> Result<&mut RegionSegment> {
        self.state
            .segment_mut()
            .ok_or(RegionError::NoActiveTransaction)
    }

    /// Appends a vertex to the draft. Recording a local action is up to the
    /// caller.
    pub fn add_vertex(&mut self, point: Point) -> Result<()> {
        let segment = self.active_segment_mut()?;
        segment.vertices.push(point);
        tracing::trace!(vertex_count = segment.vertices.len(), "Vertex added");
        Ok(())
    }

    /// Replaces the draft's vertex list
    pub fn update_vertices(&mut self, vertices: Vec<Point>) -> Result<()> {
        self.active_segment_mut()?.vertices = vertices;
        Ok(())
    }

    /// Merges non-geometric attributes into the draft
    pub fn update_segment_properties(&mut self, properties: &SegmentProperties) -> Result<()> {
        self.active_segment_mut()?.apply(properties);
        Ok(())
    }

    /// Records a vertex edit that has already been applied to the draft
    pub fn push_local_action(&mut self, action: LocalAction) {
        if !self.is_active() {
            tracing::debug!(action = %action.description(), "No active transaction, local action dropped");
            return;
        }
        self.local.push(action);
    }

    /// Reverts the latest local action. Returns false if there was none.
    pub fn undo_local(&mut self) -> bool {
        let Some(segment) = self.state.segment_mut() else {
            return false;
        };
        match self.local.undo(&mut segment.vertices) {
            Some(action) => {
                tracing::debug!(action = %action.description(), "Local undo");
                true
            }
            None => false,
        }
    }

    /// Reapplies the latest undone local action. Returns false if there was
    /// none.
    pub fn redo_local(&mut self) -> bool {
        let Some(segment) = self.state.segment_mut() else {
            return false;
        };
        match self.local.redo(&mut segment.vertices) {
            Some(action) => {
                tracing::debug!(action = %action.description(), "Local redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo_local(&self) -> bool {
        self.is_active() && self.local.can_undo()
    }

    pub fn can_redo_local(&self) -> bool {
        self.is_active() && self.local.can_redo()
    }

    /// Discards the draft and its local history. Safe to call when idle.
    pub fn rollback_transaction(&mut self) {
        if self.is_active() {
            tracing::debug!(kind = ?self.kind(), "Region transaction rolled back");
        }
        self.clear();
    }

    fn clip_plan(&self, clips: Vec<ClipResult>, segment: RegionSegment) -> ClipPlan {
        ClipPlan {
            clips,
            segment,
            original: self.original_region().cloned(),
        }
    }

    fn clear(&mut self) {
        self.state = TransactionState::Idle;
        self.local.clear();
    }

    /// Commits the draft.
    ///
    /// The draft is checked first: it needs at least three vertices, and
    /// still three once duplicate and collinear points are dropped. The
    /// cleaned vertices are what gets stored.
    ///
    /// With a merge context the draft is then matched against the scene, in
    /// this order: a null region turns into a [`CommitResult::NullClip`], a
    /// draft touching matching regions into a [`CommitResult::Merge`], and
    /// one overlapping same-type regions it does not match into a
    /// [`CommitResult::Clip`]. None of these calls the store. Otherwise an
    /// editing draft updates its region and a placement draft creates one.
    /// The transaction is cleared on success and kept as is on failure.
    pub async fn commit_transaction(
        &mut self,
        scene_id: SceneId,
        store: &dyn RegionStore,
        merge_context: Option<MergeContext<'_>>,
    ) -> CommitResult {
        let Some(mut segment) = self.segment().cloned() else {
            return CommitResult::Failed {
                error: RegionError::NoActiveTransaction,
            };
        };

        let tolerance = merge_context
            .map(|ctx| ctx.grid.tolerance(self.tolerance_ratio))
            .unwrap_or(DEFAULT_TOLERANCE);
        let cleaned = clean_polygon_vertices(&segment.vertices, tolerance);
        if segment.vertices.len() < 3 || cleaned.len() < 3 {
            tracing::debug!(vertex_count = segment.vertices.len(), "Commit rejected");
            return CommitResult::Failed {
                error: RegionError::NotEnoughVertices,
            };
        }
        segment.vertices = cleaned;

        let regions = merge_context.map(|ctx| ctx.scene.regions.as_slice()).unwrap_or(&[]);
        if let Some(clips) = detect_null_clip(regions, &segment, tolerance) {
            tracing::info!(%scene_id, clipped = clips.len(), "Commit resolved to null clip");
            let plan = self.clip_plan(clips, segment);
            self.clear();
            return CommitResult::NullClip { plan };
        }

        if merge_context.is_some() {
            if let Some(merge) = detect_merge(regions, &segment, tolerance) {
                tracing::info!(
                    %scene_id,
                    target_region_index = merge.target_region_index,
                    deleted = merge.regions_to_delete.len(),
                    "Commit resolved to merge"
                );
                self.clear();
                return CommitResult::Merge { merge };
            }

            if let Some(clips) = detect_clip(regions, &segment, tolerance) {
                tracing::info!(%scene_id, clipped = clips.len(), "Commit resolved to clip");
                let plan = self.clip_plan(clips, segment);
                self.clear();
                return CommitResult::Clip { plan };
            }
        }

        let result = match &self.state {
            TransactionState::Editing { original, .. } => {
                let region = segment.to_region(original.index);
                let request = UpdateRegionRequest::from_region(scene_id, region.index, &region);
                match store.update_region(request).await {
                    Ok(()) => {
                        tracing::info!(%scene_id, region_index = region.index, "Region updated");
                        CommitResult::Edited {
                            region,
                            previous: original.clone(),
                        }
                    }
                    Err(error) => CommitResult::Failed { error },
                }
            }
            TransactionState::Placement { .. } => {
                let request = AddRegionRequest {
                    scene_id,
                    name: segment.name.clone(),
                    region_type: segment.region_type.clone(),
                    value: segment.value,
                    label: segment.label.clone(),
                    color: segment.color.clone(),
                    vertices: segment.vertices.clone(),
                };
                match store.add_region(request).await {
                    Ok(added) => {
                        tracing::info!(%scene_id, region_index = added.index, "Region created");
                        CommitResult::Created {
                            region: segment.to_region(added.index),
                        }
                    }
                    Err(error) => CommitResult::Failed { error },
                }
            }
            TransactionState::Idle => CommitResult::Failed {
                error: RegionError::NoActiveTransaction,
            },
        };

        match &result {
            CommitResult::Failed { error } => {
                tracing::warn!(%scene_id, %error, "Region commit failed, transaction kept");
            }
            _ => self.clear(),
        }
        result
    }
}

impl Default for RegionTransaction {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
