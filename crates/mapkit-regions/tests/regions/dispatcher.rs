use crate::support::{difficult, p, square, Fixture};
use mapkit_core::{RegionError, StoreOperation};
use mapkit_regions::{polygon_area, LocalAction, SegmentProperties, TransactionKind};

#[tokio::test]
async fn test_delete_missing_region_is_a_no_op() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();

    handlers.handle_region_delete(7).await.unwrap();

    assert!(fixture.removes().is_empty());
    assert!(fixture.errors.messages().is_empty());
    assert!(!fixture.history.can_undo());
}

#[tokio::test]
async fn test_delete_clears_selection_and_records() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers.handle_region_select(Some(1));
    assert_eq!(handlers.state().selected_region_index, Some(1));

    handlers.handle_region_delete(1).await.unwrap();

    assert_eq!(fixture.removes().len(), 1);
    assert!(handlers.scene().regions.is_empty());
    assert_eq!(handlers.state().selected_region_index, None);
    assert_eq!(fixture.history.undo_description().as_deref(), Some("Delete region \"Region 1\""));

    let restored = fixture.history.undo(fixture.store.as_ref()).await.unwrap().unwrap();
    assert_eq!(restored.regions.len(), 1);
}

#[tokio::test]
async fn test_delete_of_edited_region_ends_editing() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(1).unwrap();

    handlers.handle_region_delete(1).await.unwrap();

    assert!(!handlers.transaction().is_active());
    assert_eq!(handlers.state().editing_region_index, None);
    assert!(!handlers.state().is_editing_vertices);
}

#[tokio::test]
async fn test_delete_failure_is_reported() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    fixture.store.fail_next(StoreOperation::Remove);
    let mut handlers = fixture.handlers();

    assert!(handlers.handle_region_delete(1).await.is_err());
    assert_eq!(
        fixture.errors.last().as_deref(),
        Some("Failed to delete region. Please try again.")
    );
    assert!(handlers.scene().contains_region(1));
}

#[test]
fn test_select_unknown_region_clears_selection() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers.handle_region_select(Some(1));
    handlers.handle_region_select(Some(5));
    assert_eq!(handlers.state().selected_region_index, None);
}

#[tokio::test]
async fn test_placement_finish_creates_and_records() {
    let fixture = Fixture::new(vec![]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Pit", "Difficult"))
        .unwrap();
    assert!(handlers.state().is_drawing_region);
    for v in [p(0.0, 0.0), p(100.0, 0.0), p(50.0, 100.0)] {
        handlers.handle_place_vertex(v).unwrap();
    }

    let index = handlers.handle_placement_finish().await.unwrap().unwrap();

    assert!(!handlers.state().is_drawing_region);
    assert!(!handlers.transaction().is_active());
    assert_eq!(handlers.scene().region(index).unwrap().name, "Pit");
    assert_eq!(fixture.history.undo_description().as_deref(), Some("Create region \"Pit\""));
}

#[tokio::test]
async fn test_placement_finish_merges_with_neighbour() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(20.0, 0.0, 10.0)),
    ]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Bridge", "Difficult").with_value(2.0))
        .unwrap();
    for v in square(10.0, 0.0, 10.0) {
        handlers.handle_place_vertex(v).unwrap();
    }

    let index = handlers.handle_placement_finish().await.unwrap();

    assert_eq!(index, Some(1));
    assert!(fixture.adds().is_empty());
    assert_eq!(handlers.scene().regions.len(), 1);
    let merged = handlers.scene().region(1).unwrap();
    assert!((polygon_area(&merged.vertices) - 300.0).abs() < 1e-6);
    assert_eq!(fixture.history.undo_count(), 1);
}

#[tokio::test]
async fn test_placement_failure_keeps_drawing() {
    let fixture = Fixture::new(vec![]);
    fixture.store.fail_next(StoreOperation::Add);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Pit", "Difficult"))
        .unwrap();
    for v in square(0.0, 0.0, 10.0) {
        handlers.handle_place_vertex(v).unwrap();
    }

    assert!(handlers.handle_placement_finish().await.is_err());
    assert_eq!(
        fixture.errors.last().as_deref(),
        Some("Failed to place region. Please try again.")
    );
    assert!(handlers.state().is_drawing_region);
    assert_eq!(handlers.transaction().segment().unwrap().vertices.len(), 4);

    handlers.handle_placement_finish().await.unwrap();
    assert!(!handlers.transaction().is_active());
}

#[tokio::test]
async fn test_placement_with_too_few_vertices_is_not_reported() {
    let fixture = Fixture::new(vec![]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Pit", "Difficult"))
        .unwrap();
    handlers.handle_place_vertex(p(0.0, 0.0)).unwrap();

    assert_eq!(
        handlers.handle_placement_finish().await,
        Err(RegionError::NotEnoughVertices)
    );
    assert!(fixture.errors.messages().is_empty());
    assert!(handlers.transaction().is_active());
}

#[test]
fn test_local_undo_while_drawing() {
    let fixture = Fixture::new(vec![]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Pit", "Difficult"))
        .unwrap();
    handlers.handle_place_vertex(p(0.0, 0.0)).unwrap();
    handlers.handle_place_vertex(p(5.0, 0.0)).unwrap();

    assert!(handlers.handle_undo_local());
    assert_eq!(handlers.transaction().segment().unwrap().vertices, vec![p(0.0, 0.0)]);
    assert!(handlers.handle_redo_local());
    assert_eq!(handlers.transaction().segment().unwrap().vertices.len(), 2);

    handlers.handle_cancel_placement();
    assert!(!handlers.transaction().is_active());
    assert!(!handlers.state().is_drawing_region);
    assert!(fixture.store.calls().is_empty());
}

#[tokio::test]
async fn test_finish_editing_records_edit() {
    let fixture = Fixture::new(vec![difficult(4, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(4).unwrap();
    assert_eq!(handlers.state().original_region_vertices, Some(square(0.0, 0.0, 10.0)));

    let moved = square(0.0, 0.0, 15.0);
    handlers
        .handle_update_vertices(
            moved.clone(),
            Some(LocalAction::MoveVertex {
                vertex_index: 2,
                old: p(10.0, 10.0),
                new: p(15.0, 15.0),
            }),
        )
        .unwrap();

    let index = handlers.handle_finish_editing_region().await.unwrap();

    assert_eq!(index, Some(4));
    assert_eq!(handlers.scene().region(4).unwrap().vertices, moved);
    assert_eq!(handlers.state().editing_region_index, None);
    assert_eq!(handlers.state().original_region_vertices, None);
    assert!(fixture.adds().is_empty());

    let undone = fixture.history.undo(fixture.store.as_ref()).await.unwrap().unwrap();
    assert_eq!(undone.region(4).unwrap().vertices, square(0.0, 0.0, 10.0));
}

#[tokio::test]
async fn test_finish_editing_failure_keeps_edit() {
    let fixture = Fixture::new(vec![difficult(4, square(0.0, 0.0, 10.0))]);
    fixture.store.fail_next(StoreOperation::Update);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(4).unwrap();

    assert!(handlers.handle_finish_editing_region().await.is_err());
    assert_eq!(
        fixture.errors.last().as_deref(),
        Some("Failed to update region. Please try again.")
    );
    assert_eq!(handlers.state().editing_region_index, Some(4));
    assert_eq!(handlers.transaction().kind(), Some(TransactionKind::Editing));
}

#[tokio::test]
async fn test_editing_into_neighbour_merges_and_deletes_edited() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(40.0, 0.0, 10.0)),
    ]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(2).unwrap();
    handlers
        .handle_update_vertices(square(10.0, 0.0, 10.0), None)
        .unwrap();

    let index = handlers.handle_finish_editing_region().await.unwrap();

    assert_eq!(index, Some(1));
    assert!(!handlers.scene().contains_region(2));
    assert_eq!(fixture.removes().len(), 1);
    assert!(!handlers.transaction().is_active());
}

#[test]
fn test_cancel_editing_restores_idle_state() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(1).unwrap();

    handlers.handle_cancel_editing_region();

    assert!(!handlers.transaction().is_active());
    assert_eq!(handlers.state(), &Default::default());
    assert_eq!(handlers.scene(), &fixture.scene);
}

#[test]
fn test_edit_unknown_region() {
    let fixture = Fixture::new(vec![]);
    let mut handlers = fixture.handlers();
    assert_eq!(
        handlers.handle_edit_region_vertices(3),
        Err(RegionError::RegionNotFound { index: 3 })
    );
}

#[tokio::test]
async fn test_property_update_is_optimistic_and_recorded() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();

    handlers
        .handle_region_property_update(
            1,
            SegmentProperties {
                color: Some("#ff0000".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let region = handlers.scene().region(1).unwrap();
    assert_eq!(region.color.as_deref(), Some("#ff0000"));
    assert_eq!(region.region_type, "Difficult");
    assert_eq!(fixture.stored().region(1).unwrap().color.as_deref(), Some("#ff0000"));
    assert!(fixture.history.can_undo());
}

#[tokio::test]
async fn test_property_update_failure_resyncs() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    fixture.store.fail_next(StoreOperation::Update);
    let mut handlers = fixture.handlers();

    let result = handlers
        .handle_region_property_update(1, SegmentProperties::new("Renamed", "Difficult"))
        .await;

    assert!(result.is_err());
    assert_eq!(handlers.scene().region(1).unwrap().name, "Region 1");
    assert!(!fixture.history.can_undo());
}

#[tokio::test]
async fn test_switch_commits_current_edit() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(50.0, 50.0, 10.0)),
    ]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(1).unwrap();
    handlers
        .handle_update_vertices(square(0.0, 0.0, 12.0), None)
        .unwrap();

    handlers.handle_switch_to_region(2).await.unwrap();

    assert_eq!(fixture.updates().len(), 1);
    assert_eq!(handlers.state().editing_region_index, Some(2));
    assert_eq!(handlers.transaction().original_region().unwrap().index, 2);
    assert_eq!(handlers.scene().region(1).unwrap().vertices, square(0.0, 0.0, 12.0));
}

#[tokio::test]
async fn test_failed_merge_resyncs_scene_from_store() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(8.0, 0.0, 10.0)),
        difficult(3, square(16.0, 0.0, 10.0)),
    ]);
    fixture.store.fail_remove_of(3);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Span", "Difficult").with_value(2.0))
        .unwrap();
    for v in [p(-2.0, 2.0), p(28.0, 2.0), p(28.0, 8.0), p(-2.0, 8.0)] {
        handlers.handle_place_vertex(v).unwrap();
    }

    assert!(handlers.handle_placement_finish().await.is_err());

    let indices: Vec<_> = handlers.scene().regions.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert_eq!(handlers.scene(), &fixture.stored());

    handlers.handle_region_delete(2).await.unwrap();
    assert_eq!(
        fixture.errors.messages(),
        vec!["Failed to merge regions. Please try again.".to_string()]
    );
}

#[tokio::test]
async fn test_overlapping_other_value_clips_neighbour() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Mud", "Difficult").with_value(3.0))
        .unwrap();
    for v in square(5.0, 0.0, 10.0) {
        handlers.handle_place_vertex(v).unwrap();
    }

    let index = handlers.handle_placement_finish().await.unwrap();

    assert_eq!(index, Some(2));
    assert!(!handlers.state().is_drawing_region);
    let clipped = handlers.scene().region(1).unwrap();
    assert!((polygon_area(&clipped.vertices) - 50.0).abs() < 1e-6);
    assert_eq!(handlers.scene().region(2).unwrap().name, "Mud");
    assert_eq!(fixture.history.undo_count(), 1);
    assert_eq!(fixture.history.undo_description().as_deref(), Some("Clip regions"));

    let undone = fixture.history.undo(fixture.store.as_ref()).await.unwrap().unwrap();
    assert_eq!(undone.regions.len(), 1);
    assert_eq!(undone.region(1).unwrap().vertices, square(0.0, 0.0, 10.0));
}

#[tokio::test]
async fn test_null_region_erases_without_storing() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Eraser", "Difficult").with_label("Normal"))
        .unwrap();
    for v in square(5.0, 0.0, 10.0) {
        handlers.handle_place_vertex(v).unwrap();
    }

    let index = handlers.handle_placement_finish().await.unwrap();

    assert_eq!(index, None);
    assert!(fixture.adds().is_empty());
    assert_eq!(handlers.scene().regions.len(), 1);
    let erased = handlers.scene().region(1).unwrap();
    assert!((polygon_area(&erased.vertices) - 50.0).abs() < 1e-6);
    assert_eq!(fixture.history.undo_description().as_deref(), Some("Erase regions"));
}

#[tokio::test]
async fn test_null_region_over_nothing_is_dropped() {
    let fixture = Fixture::new(vec![]);
    let mut handlers = fixture.handlers();
    handlers
        .handle_place_region(SegmentProperties::new("Eraser", "Difficult").with_label("normal"))
        .unwrap();
    for v in square(0.0, 0.0, 10.0) {
        handlers.handle_place_vertex(v).unwrap();
    }

    assert_eq!(handlers.handle_placement_finish().await, Ok(None));
    assert_eq!(fixture.store.mutation_count(), 0);
    assert!(!fixture.history.can_undo());
    assert!(!handlers.transaction().is_active());
}

#[tokio::test]
async fn test_editing_null_region_erases_and_removes_it() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(40.0, 0.0, 10.0)).with_label("Normal"),
    ]);
    let mut handlers = fixture.handlers();
    handlers.handle_edit_region_vertices(2).unwrap();
    handlers
        .handle_update_vertices(square(5.0, 0.0, 10.0), None)
        .unwrap();

    let index = handlers.handle_finish_editing_region().await.unwrap();

    assert_eq!(index, None);
    assert!(!handlers.scene().contains_region(2));
    let erased = handlers.scene().region(1).unwrap();
    assert!((polygon_area(&erased.vertices) - 50.0).abs() < 1e-6);
    assert_eq!(handlers.state().editing_region_index, None);
    assert!(!handlers.transaction().is_active());
}
