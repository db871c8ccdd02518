use std::sync::Arc;

use mapkit_core::{
    EditorConfig, ErrorLog, InMemoryRegionStore, Point, Region, RegionIndex, Scene, StoreCall,
};
use mapkit_regions::{DocumentHistory, MergeExecutor, RegionHandlers};

pub fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

pub fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![p(x, y), p(x + size, y), p(x + size, y + size), p(x, y + size)]
}

/// A "Difficult" region with value 2
pub fn difficult(index: RegionIndex, vertices: Vec<Point>) -> Region {
    Region::new(index, format!("Region {}", index), "Difficult", vertices).with_value(2.0)
}

pub struct Fixture {
    pub scene: Scene,
    pub store: Arc<InMemoryRegionStore>,
    pub history: Arc<DocumentHistory>,
    pub errors: Arc<ErrorLog>,
}

impl Fixture {
    pub fn new(regions: Vec<Region>) -> Self {
        let mut scene = Scene::new("Test Scene");
        scene.regions = regions;
        let store = Arc::new(InMemoryRegionStore::with_scene(scene.clone()));
        let history = Arc::new(DocumentHistory::new(scene.id, 50));
        Self {
            scene,
            store,
            history,
            errors: Arc::new(ErrorLog::new()),
        }
    }

    pub fn handlers(&self) -> RegionHandlers {
        RegionHandlers::new(
            self.scene.clone(),
            self.store.clone(),
            self.history.clone(),
            self.errors.clone(),
            &EditorConfig::default(),
        )
    }

    pub fn executor(&self) -> MergeExecutor {
        MergeExecutor::new(
            self.scene.id,
            self.store.clone(),
            self.history.clone(),
            self.errors.clone(),
        )
    }

    pub fn stored(&self) -> Scene {
        self.store.snapshot(self.scene.id).expect("scene in store")
    }

    pub fn adds(&self) -> Vec<StoreCall> {
        self.calls_matching(|c| matches!(c, StoreCall::Add(_)))
    }

    pub fn updates(&self) -> Vec<StoreCall> {
        self.calls_matching(|c| matches!(c, StoreCall::Update(_)))
    }

    pub fn removes(&self) -> Vec<StoreCall> {
        self.calls_matching(|c| matches!(c, StoreCall::Remove(_)))
    }

    fn calls_matching(&self, keep: impl Fn(&StoreCall) -> bool) -> Vec<StoreCall> {
        self.store.calls().into_iter().filter(|c| keep(c)).collect()
    }
}
