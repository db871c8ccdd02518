//! The draft region being placed or edited.

use mapkit_core::{Point, Region, RegionIndex};
use serde::{Deserialize, Serialize};

/// Transient draft of a region.
///
/// Same shape as a persisted [`Region`] minus its identity. `region_index`
/// is `None` while a new region is being placed and holds the index of the
/// region being edited otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSegment {
    pub region_index: Option<RegionIndex>,
    pub name: String,
    #[serde(rename = "type")]
    pub region_type: String,
    pub vertices: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RegionSegment {
    /// Copies an existing region, vertices included, into a draft.
    pub fn from_region(region: &Region) -> Self {
        Self {
            region_index: Some(region.index),
            name: region.name.clone(),
            region_type: region.region_type.clone(),
            vertices: region.vertices.clone(),
            value: region.value,
            label: region.label.clone(),
            color: region.color.clone(),
        }
    }

    /// Builds the region this draft would persist as under `index`.
    pub fn to_region(&self, index: RegionIndex) -> Region {
        Region {
            index,
            name: self.name.clone(),
            region_type: self.region_type.clone(),
            vertices: self.vertices.clone(),
            value: self.value,
            label: self.label.clone(),
            color: self.color.clone(),
        }
    }

    /// Applies the present fields of `properties`; vertices are untouched.
    pub fn apply(&mut self, properties: &SegmentProperties) {
        if let Some(name) = &properties.name {
            self.name = name.clone();
        }
        if let Some(region_type) = &properties.region_type {
            self.region_type = region_type.clone();
        }
        if properties.value.is_some() {
            self.value = properties.value;
        }
        if properties.label.is_some() {
            self.label = properties.label.clone();
        }
        if properties.color.is_some() {
            self.color = properties.color.clone();
        }
    }
}

/// Non-geometric region attributes.
///
/// Seeds a placement and carries partial updates: absent fields are left
/// as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub region_type: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl SegmentProperties {
    /// Properties with a name and a type.
    pub fn new(name: impl Into<String>, region_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            region_type: Some(region_type.into()),
            ..Self::default()
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
