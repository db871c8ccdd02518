//! # MapKit Regions
//!
//! Drawing, editing and merging of polygonal regions on a scene.
//!
//! ## Components
//!
//! - **Geometry**: polygon area, orientation, shared-edge and overlap tests,
//!   and boolean union and difference through `cavalier_contours`
//! - **Local history**: undo/redo of single vertex edits inside a transaction
//! - **Transaction**: the `Idle | Placement | Editing` state machine owning
//!   the draft region, with commit deciding between create, edit, merge and
//!   clip
//! - **Merge**: detection of matching neighbours and execution of the
//!   update-then-delete sequence against the store
//! - **Clip**: cutting a draft out of overlapped same-type regions, and null
//!   regions that only erase
//! - **History**: document-level commands and their undo/redo log
//! - **Handlers**: the dispatcher that turns UI intents into the above
//!
//! ## Architecture
//!
//! ```text
//! RegionHandlers
//!   ├── RegionTransaction ── LocalHistory
//!   │      ├── merge::detect_merge ── geometry
//!   │      └── clip::detect_clip ──── geometry
//!   ├── MergeExecutor ── RegionStore / ActionRecorder / ErrorReporter
//!   ├── ClipExecutor ─── RegionStore / ActionRecorder / ErrorReporter
//!   └── DocumentHistory (ActionRecorder)
//! ```

pub mod clip;
pub mod clip_executor;
pub mod geometry;
pub mod handlers;
pub mod history;
pub mod local_history;
pub mod merge;
pub mod merge_executor;
pub mod segment;
pub mod transaction;

pub use clip::{detect_clip, detect_null_clip, is_null_region, ClipPlan, ClipResult};
pub use clip_executor::{ClipExecutor, ClipOutcome};
pub use geometry::{
    find_shared_edge, merge_polygons, polygon_area, polygons_adjacent, polygons_overlap,
    subtract_polygon, Difference, SharedEdge,
};
pub use handlers::{RegionEditorState, RegionHandlers};
pub use history::{ActionRecorder, CommandFailure, DocumentHistory, IndexRemap, RegionCommand};
pub use local_history::{LocalAction, LocalHistory, VertexMove};
pub use merge::{detect_merge, find_mergeable_regions, regions_match, MergeResult};
pub use merge_executor::{MergeExecutor, MergeRequest};
pub use segment::{RegionSegment, SegmentProperties};
pub use transaction::{
    CommitAction, CommitResult, MergeContext, RegionTransaction, TransactionKind,
    TransactionState,
};
