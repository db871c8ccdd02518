use crate::support::{difficult, square, Fixture};
use mapkit_core::{AddRegionRequest, RegionStore, StoreOperation};
use mapkit_regions::{ActionRecorder, DocumentHistory, MergeRequest, RegionCommand};

#[tokio::test]
async fn test_failed_undo_keeps_command() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let region = fixture.scene.region(1).unwrap().clone();
    fixture.history.record(RegionCommand::Create {
        scene_id: fixture.scene.id,
        region,
    });

    fixture.store.fail_next(StoreOperation::Remove);
    assert!(fixture.history.undo(fixture.store.as_ref()).await.is_err());
    assert_eq!(fixture.history.undo_count(), 1);
    assert_eq!(fixture.history.redo_count(), 0);

    let scene = fixture
        .history
        .undo(fixture.store.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(scene.regions.is_empty());
}

#[tokio::test]
async fn test_recreated_region_index_follows_through_history() {
    let fixture = Fixture::new(vec![]);
    let scene_id = fixture.scene.id;
    let history = DocumentHistory::new(scene_id, 10);

    let draft = difficult(0, square(0.0, 0.0, 10.0));
    let added = fixture
        .store
        .add_region(AddRegionRequest::from_region(scene_id, &draft))
        .await
        .unwrap();
    let created = mapkit_core::Region {
        index: added.index,
        ..draft.clone()
    };
    history.record(RegionCommand::Create {
        scene_id,
        region: created.clone(),
    });

    let mut renamed = created.clone();
    renamed.name = "Renamed".to_string();
    fixture
        .store
        .update_region(mapkit_core::UpdateRegionRequest::from_region(
            scene_id,
            created.index,
            &renamed,
        ))
        .await
        .unwrap();
    history.record(RegionCommand::Edit {
        scene_id,
        region_index: created.index,
        old_region: created.clone(),
        new_region: renamed,
    });

    // Undo the rename and the create, then redo both. The create comes back
    // under a fresh index and the rename must follow it.
    history.undo(fixture.store.as_ref()).await.unwrap();
    history.undo(fixture.store.as_ref()).await.unwrap();
    history.redo(fixture.store.as_ref()).await.unwrap();
    let scene = history
        .redo(fixture.store.as_ref())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(scene.regions.len(), 1);
    assert_ne!(scene.regions[0].index, created.index);
    assert_eq!(scene.regions[0].name, "Renamed");
}

#[tokio::test]
async fn test_new_record_drops_redo() {
    let fixture = Fixture::new(vec![difficult(1, square(0.0, 0.0, 10.0))]);
    let region = fixture.scene.region(1).unwrap().clone();
    fixture.history.record(RegionCommand::Create {
        scene_id: fixture.scene.id,
        region: region.clone(),
    });
    fixture.history.undo(fixture.store.as_ref()).await.unwrap();
    assert!(fixture.history.can_redo());

    fixture.history.record(RegionCommand::Delete {
        scene_id: fixture.scene.id,
        region,
    });
    assert!(!fixture.history.can_redo());
    assert_eq!(fixture.history.redo(fixture.store.as_ref()).await, Ok(None));
}

#[tokio::test]
async fn test_failed_batch_undo_is_rolled_back_before_retry() {
    let fixture = Fixture::new(vec![
        difficult(1, square(0.0, 0.0, 10.0)),
        difficult(2, square(5.0, 0.0, 10.0)),
    ]);
    let request = MergeRequest {
        target_region_index: 1,
        original_target_region: None,
        merged_vertices: vec![
            mapkit_core::Point::new(0.0, 0.0),
            mapkit_core::Point::new(15.0, 0.0),
            mapkit_core::Point::new(15.0, 10.0),
            mapkit_core::Point::new(0.0, 10.0),
        ],
        regions_to_delete: vec![2],
    };
    fixture
        .executor()
        .execute_merge(&fixture.scene, request, |_| {}, |_| {})
        .await
        .unwrap();

    fixture.store.fail_next(StoreOperation::Update);
    assert!(fixture.history.undo(fixture.store.as_ref()).await.is_err());
    assert_eq!(fixture.history.undo_count(), 1);
    let after_failure: Vec<_> = fixture.stored().regions.iter().map(|r| r.index).collect();
    assert_eq!(after_failure, vec![1]);

    let scene = fixture
        .history
        .undo(fixture.store.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scene.regions.len(), 2);
    assert_eq!(scene.regions.iter().filter(|r| r.name == "Region 2").count(), 1);
    assert_eq!(scene.region(1).unwrap().vertices, square(0.0, 0.0, 10.0));
    assert_eq!(fixture.history.redo_count(), 1);
}
