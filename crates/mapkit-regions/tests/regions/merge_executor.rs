use std::cell::Cell;

use crate::support::{difficult, square, Fixture};
use mapkit_core::{RegionError, StoreCall, StoreOperation};
use mapkit_regions::{polygon_area, MergeRequest};

fn merge_of_three() -> (Fixture, MergeRequest) {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(10.0, 0.0, 10.0)),
        difficult(3, square(20.0, 0.0, 10.0)),
    ]);
    let request = MergeRequest {
        target_region_index: 1,
        original_target_region: fixture.scene.region(1).cloned(),
        merged_vertices: square(0.0, 0.0, 10.0)
            .into_iter()
            .map(|v| mapkit_core::Point::new(v.x * 3.0, v.y))
            .collect(),
        regions_to_delete: vec![2, 3],
    };
    (fixture, request)
}

#[tokio::test]
async fn test_missing_target_reports_without_calls() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let errors_seen = Cell::new(0);
    let request = MergeRequest {
        target_region_index: 9,
        original_target_region: None,
        merged_vertices: square(0.0, 0.0, 20.0),
        regions_to_delete: vec![1],
    };

    let result = fixture
        .executor()
        .execute_merge(
            &fixture.scene,
            request,
            |_| panic!("merge must not succeed"),
            |_| errors_seen.set(errors_seen.get() + 1),
        )
        .await;

    assert_eq!(result, Err(RegionError::MergeTargetNotFound));
    assert_eq!(errors_seen.get(), 1);
    assert_eq!(fixture.errors.last().as_deref(), Some("Merge target region not found"));
    assert!(fixture.store.calls().is_empty());
    assert!(!fixture.history.can_undo());
}

#[tokio::test]
async fn test_missing_delete_target_reports_without_calls() {
    let (fixture, mut request) = merge_of_three();
    request.regions_to_delete = vec![2, 42];

    let result = fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await;

    assert_eq!(result, Err(RegionError::RegionNotFound { index: 42 }));
    assert_eq!(fixture.store.mutation_count(), 0);
}

#[tokio::test]
async fn test_merge_updates_target_before_deleting() {
    let (fixture, request) = merge_of_three();
    let succeeded = Cell::new(false);

    let scene = fixture
        .executor()
        .execute_merge(
            &fixture.scene,
            request,
            |scene| {
                assert_eq!(scene.regions.len(), 1);
                succeeded.set(true);
            },
            |e| panic!("unexpected error {}", e),
        )
        .await
        .unwrap();

    assert!(succeeded.get());
    let calls = fixture.store.calls();
    assert!(matches!(calls[0], StoreCall::Update(ref u) if u.region_index == 1));
    assert!(matches!(calls[1], StoreCall::Remove(_)));
    assert!(matches!(calls[2], StoreCall::Remove(_)));
    assert!(matches!(calls[3], StoreCall::Refetch(_)));

    assert_eq!(scene, fixture.stored());
    assert!((polygon_area(&scene.region(1).unwrap().vertices) - 300.0).abs() < 1e-9);

    assert_eq!(fixture.history.undo_count(), 1);
    assert_eq!(fixture.history.undo_description().as_deref(), Some("Merge regions"));
}

#[tokio::test]
async fn test_failed_delete_is_reported_and_not_recorded() {
    let (fixture, request) = merge_of_three();
    fixture.store.fail_remove_of(3);

    let result = fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await;

    assert!(result.unwrap_err().is_remote_error());
    assert_eq!(
        fixture.errors.last().as_deref(),
        Some("Failed to merge regions. Please try again.")
    );
    assert!(!fixture.history.can_undo());

    // The update and the first removal stay applied until the next refetch.
    let stored = fixture.stored();
    assert!(!stored.contains_region(2));
    assert!(stored.contains_region(3));
}

#[tokio::test]
async fn test_failed_update_stops_before_deletes() {
    let (fixture, request) = merge_of_three();
    fixture.store.fail_next(StoreOperation::Update);

    let result = fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await;

    assert!(result.is_err());
    assert!(fixture.removes().is_empty());
    assert_eq!(fixture.stored(), fixture.scene);
}

#[tokio::test]
async fn test_failed_refetch_falls_back_to_local_result() {
    let (fixture, request) = merge_of_three();
    fixture.store.fail_next(StoreOperation::Refetch);

    let scene = fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await
        .unwrap();

    assert_eq!(scene.regions.len(), 1);
    assert_eq!(scene.region(1).unwrap().vertices, fixture.stored().region(1).unwrap().vertices);
}

#[tokio::test]
async fn test_merge_is_one_undo_step() {
    let (fixture, request) = merge_of_three();
    fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await
        .unwrap();

    let restored = fixture
        .history
        .undo(fixture.store.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.regions.len(), 3);
    assert_eq!(
        restored.region(1).unwrap().vertices,
        fixture.scene.region(1).unwrap().vertices
    );

    let redone = fixture
        .history
        .redo(fixture.store.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(redone.regions.len(), 1);
}
