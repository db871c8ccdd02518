//! Data models for scenes and their regions
//!
//! This module provides:
//! - Planar points in scene units
//! - Persisted regions identified by `(scene, index)`
//! - Scenes and their grid configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable integer handle of a region within one scene's region list.
///
/// Indices are assigned by the store and are not necessarily contiguous
/// after deletes.
pub type RegionIndex = u32;

/// Identifier of a scene in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Generate a fresh random scene identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A planar coordinate in scene units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given X and Y coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A persisted region of a scene.
///
/// Vertices are ordered and implicitly closed (the last vertex connects to
/// the first). A region with fewer than three vertices is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub index: RegionIndex,
    pub name: String,
    /// Semantic tag, e.g. "Elevation" or "Difficult".
    #[serde(rename = "type")]
    pub region_type: String,
    pub vertices: Vec<Point>,
    /// Numeric effect magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Region {
    /// Creates a region with the given index, name, type and vertices.
    pub fn new(
        index: RegionIndex,
        name: impl Into<String>,
        region_type: impl Into<String>,
        vertices: Vec<Point>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            region_type: region_type.into(),
            vertices,
            value: None,
            label: None,
            color: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Size of one grid cell in scene units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

/// Grid configuration of a scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub cell_size: CellSize,
}

impl GridConfig {
    /// Creates a square grid with the given cell size.
    pub fn square(cell_size: f64) -> Self {
        Self {
            cell_size: CellSize {
                width: cell_size,
                height: cell_size,
            },
        }
    }

    /// Distance tolerance for geometric comparisons on this grid.
    pub fn tolerance(&self, ratio: f64) -> f64 {
        self.cell_size.width.min(self.cell_size.height).abs() * ratio
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::square(50.0)
    }
}

/// A scene and its persisted regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            grid: GridConfig::default(),
            regions: Vec::new(),
        }
    }

    /// Looks up a region by its index.
    pub fn region(&self, index: RegionIndex) -> Option<&Region> {
        self.regions.iter().find(|r| r.index == index)
    }

    /// Returns true if a region with this index is present.
    pub fn contains_region(&self, index: RegionIndex) -> bool {
        self.region(index).is_some()
    }

    /// Returns a copy of the scene with one region replaced or appended.
    pub fn with_region(&self, region: Region) -> Scene {
        let mut scene = self.clone();
        match scene.regions.iter_mut().find(|r| r.index == region.index) {
            Some(existing) => *existing = region,
            None => scene.regions.push(region),
        }
        scene
    }

    /// Returns a copy of the scene without the given region.
    pub fn without_region(&self, index: RegionIndex) -> Scene {
        let mut scene = self.clone();
        scene.regions.retain(|r| r.index != index);
        scene
    }
}
