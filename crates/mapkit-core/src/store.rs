//! Remote region store interface
//!
//! The authoritative copy of a scene lives behind [`RegionStore`]. The editing
//! engine only ever requests mutations through it and treats any local copy
//! of the region list as a cache that is refreshed with [`RegionStore::refetch`].

use crate::data::{Point, Region, RegionIndex, Scene, SceneId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload for creating a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRegionRequest {
    pub scene_id: SceneId,
    pub name: String,
    #[serde(rename = "type")]
    pub region_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub vertices: Vec<Point>,
}

impl AddRegionRequest {
    /// Builds a request that recreates `region` in the given scene.
    pub fn from_region(scene_id: SceneId, region: &Region) -> Self {
        Self {
            scene_id,
            name: region.name.clone(),
            region_type: region.region_type.clone(),
            value: region.value,
            label: region.label.clone(),
            color: region.color.clone(),
            vertices: region.vertices.clone(),
        }
    }
}

/// Payload for updating a region. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegionRequest {
    pub scene_id: SceneId,
    pub region_index: RegionIndex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub region_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl UpdateRegionRequest {
    /// An update that changes nothing yet.
    pub fn new(scene_id: SceneId, region_index: RegionIndex) -> Self {
        Self {
            scene_id,
            region_index,
            vertices: None,
            name: None,
            region_type: None,
            value: None,
            label: None,
            color: None,
        }
    }

    /// An update that only replaces the vertex list.
    pub fn vertices_only(scene_id: SceneId, region_index: RegionIndex, vertices: Vec<Point>) -> Self {
        Self {
            vertices: Some(vertices),
            ..Self::new(scene_id, region_index)
        }
    }

    /// An update carrying every attribute of `region`.
    pub fn from_region(scene_id: SceneId, region_index: RegionIndex, region: &Region) -> Self {
        Self {
            scene_id,
            region_index,
            vertices: Some(region.vertices.clone()),
            name: Some(region.name.clone()),
            region_type: Some(region.region_type.clone()),
            value: region.value,
            label: region.label.clone(),
            color: region.color.clone(),
        }
    }

    /// Applies the present fields to `region`.
    pub fn apply_to(&self, region: &mut Region) {
        if let Some(vertices) = &self.vertices {
            region.vertices = vertices.clone();
        }
        if let Some(name) = &self.name {
            region.name = name.clone();
        }
        if let Some(region_type) = &self.region_type {
            region.region_type = region_type.clone();
        }
        if self.value.is_some() {
            region.value = self.value;
        }
        if self.label.is_some() {
            region.label = self.label.clone();
        }
        if self.color.is_some() {
            region.color = self.color.clone();
        }
    }
}

/// Payload for removing a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRegionRequest {
    pub scene_id: SceneId,
    pub region_index: RegionIndex,
}

/// Server response to a successful create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedRegion {
    pub index: RegionIndex,
}

/// The remote, authoritative region store.
///
/// Every method is a suspension point. Callers await them sequentially and
/// never run two of them concurrently against the same scene.
#[async_trait]
pub trait RegionStore: Send + Sync {
    /// Creates a region and returns its server-assigned index
    async fn add_region(&self, request: AddRegionRequest) -> Result<AddedRegion>;

    /// Applies a partial update to an existing region
    async fn update_region(&self, request: UpdateRegionRequest) -> Result<()>;

    /// Removes a region
    async fn remove_region(&self, request: RemoveRegionRequest) -> Result<()>;

    /// Reads the authoritative state of a scene
    async fn refetch(&self, scene_id: SceneId) -> Result<Scene>;
}
