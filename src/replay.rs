//! Gesture replay
//!
//! Drives a [`RegionHandlers`] dispatcher with a recorded list of editing
//! gestures against an in-memory store. Used by the `mapkit` binary to
//! reproduce editing sessions outside the editor.

use std::sync::Arc;

use mapkit_core::{EditorConfig, ErrorLog, InMemoryRegionStore, Point, RegionIndex, Scene};
use mapkit_regions::{DocumentHistory, RegionHandlers, SegmentProperties};
use serde::{Deserialize, Serialize};

/// One recorded user gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "camelCase")]
pub enum Gesture {
    Select { index: Option<RegionIndex> },
    Delete { index: RegionIndex },
    StartPlacement { properties: SegmentProperties },
    PlaceVertex { point: Point },
    FinishPlacement,
    CancelPlacement,
    StartEditing { index: RegionIndex },
    MoveVertices { vertices: Vec<Point> },
    FinishEditing,
    CancelEditing,
    SwitchTo { index: RegionIndex },
    UpdateProperties {
        index: RegionIndex,
        properties: SegmentProperties,
    },
    UndoLocal,
    RedoLocal,
    Undo,
    Redo,
}

/// Result of a replay
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub scene: Scene,
    /// Error of every gesture that failed, as `(position, message)`
    pub failures: Vec<(usize, String)>,
    /// Messages that would have been shown to the user
    pub messages: Vec<String>,
}

/// Replays `gestures` on `scene` and returns the final scene.
///
/// A failing gesture is logged and recorded; the replay carries on with the
/// next one.
pub async fn replay(scene: Scene, gestures: &[Gesture], config: &EditorConfig) -> ReplayOutcome {
    let store = Arc::new(InMemoryRegionStore::with_scene(scene.clone()));
    let history = Arc::new(DocumentHistory::new(scene.id, config.document_history_depth));
    let errors = Arc::new(ErrorLog::new());
    let mut handlers = RegionHandlers::new(
        scene,
        store.clone(),
        history.clone(),
        errors.clone(),
        config,
    );

    let mut failures = Vec::new();
    for (position, gesture) in gestures.iter().enumerate() {
        tracing::debug!(position, ?gesture, "Replaying gesture");
        let result = match gesture {
            Gesture::Select { index } => {
                handlers.handle_region_select(*index);
                Ok(())
            }
            Gesture::Delete { index } => handlers.handle_region_delete(*index).await,
            Gesture::StartPlacement { properties } => {
                handlers.handle_place_region(properties.clone())
            }
            Gesture::PlaceVertex { point } => handlers.handle_place_vertex(*point),
            Gesture::FinishPlacement => handlers.handle_placement_finish().await.map(|_| ()),
            Gesture::CancelPlacement => {
                handlers.handle_cancel_placement();
                Ok(())
            }
            Gesture::StartEditing { index } => handlers.handle_edit_region_vertices(*index),
            Gesture::MoveVertices { vertices } => {
                handlers.handle_update_vertices(vertices.clone(), None)
            }
            Gesture::FinishEditing => handlers.handle_finish_editing_region().await.map(|_| ()),
            Gesture::CancelEditing => {
                handlers.handle_cancel_editing_region();
                Ok(())
            }
            Gesture::SwitchTo { index } => handlers.handle_switch_to_region(*index).await,
            Gesture::UpdateProperties { index, properties } => {
                handlers
                    .handle_region_property_update(*index, properties.clone())
                    .await
            }
            Gesture::UndoLocal => {
                handlers.handle_undo_local();
                Ok(())
            }
            Gesture::RedoLocal => {
                handlers.handle_redo_local();
                Ok(())
            }
            Gesture::Undo => history.undo(store.as_ref()).await.map(|scene| {
                if let Some(scene) = scene {
                    handlers.set_scene(scene);
                }
            }),
            Gesture::Redo => history.redo(store.as_ref()).await.map(|scene| {
                if let Some(scene) = scene {
                    handlers.set_scene(scene);
                }
            }),
        };

        if let Err(e) = result {
            tracing::warn!(position, error = %e, "Gesture failed");
            failures.push((position, e.to_string()));
        }
    }

    ReplayOutcome {
        scene: handlers.scene().clone(),
        failures,
        messages: errors.messages(),
    }
}
