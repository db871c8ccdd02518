//! Merge detection
//!
//! Pure functions over an immutable region list. A committed segment merges
//! with every existing region that carries the same type, value and label
//! and whose polygon shares an edge with, or overlaps, the segment's polygon.

use crate::geometry::{merge_polygons, polygons_adjacent};
use crate::segment::RegionSegment;
use mapkit_core::{Point, Region, RegionIndex};

/// Outcome of merge detection for one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    /// Region that survives the merge and receives the union
    pub target_region_index: RegionIndex,
    /// Outer boundary of the union, counter-clockwise
    pub merged_vertices: Vec<Point>,
    /// Regions made redundant by the merge. Never contains the target.
    pub regions_to_delete: Vec<RegionIndex>,
    /// Snapshots of the target and every deleted region as they were before
    /// the merge
    pub original_regions: Vec<Region>,
}

impl MergeResult {
    /// The target region as it was before the merge.
    pub fn original_target(&self) -> Option<&Region> {
        self.original_regions
            .iter()
            .find(|r| r.index == self.target_region_index)
    }
}

/// True if `region` has exactly the segment's type, value and label.
pub fn regions_match(region: &Region, segment: &RegionSegment) -> bool {
    region.region_type == segment.region_type
        && region.value == segment.value
        && region.label == segment.label
}

/// Existing regions the segment would merge with, lowest index first.
///
/// The region being edited, if any, is never a candidate.
pub fn find_mergeable_regions<'a>(
    regions: &'a [Region],
    segment: &RegionSegment,
    tolerance: f64,
) -> Vec<&'a Region> {
    let mut candidates: Vec<&Region> = regions
        .iter()
        .filter(|r| Some(r.index) != segment.region_index)
        .filter(|r| regions_match(r, segment))
        .filter(|r| polygons_adjacent(&r.vertices, &segment.vertices, tolerance))
        .collect();
    candidates.sort_by_key(|r| r.index);
    candidates
}

/// Decides whether committing `segment` into `regions` is a merge.
///
/// Returns `None` when no region qualifies, or when the union does not come
/// out as a single polygon; the commit then proceeds as a plain create or
/// edit.
pub fn detect_merge(
    regions: &[Region],
    segment: &RegionSegment,
    tolerance: f64,
) -> Option<MergeResult> {
    let candidates = find_mergeable_regions(regions, segment, tolerance);
    let target = candidates.first()?;

    let mut polygons = Vec::with_capacity(candidates.len() + 1);
    polygons.push(segment.vertices.clone());
    polygons.extend(candidates.iter().map(|r| r.vertices.clone()));

    let Some(merged_vertices) = merge_polygons(&polygons, tolerance) else {
        tracing::warn!(
            target_region_index = target.index,
            candidates = candidates.len(),
            "Union of adjacent regions is not a single polygon, skipping merge"
        );
        return None;
    };

    let mut regions_to_delete: Vec<RegionIndex> =
        candidates.iter().skip(1).map(|r| r.index).collect();
    if let Some(edited) = segment.region_index {
        if edited != target.index {
            regions_to_delete.push(edited);
        }
    }

    let original_regions = std::iter::once(target.index)
        .chain(regions_to_delete.iter().copied())
        .filter_map(|index| regions.iter().find(|r| r.index == index).cloned())
        .collect();

    tracing::debug!(
        target_region_index = target.index,
        deleted = regions_to_delete.len(),
        vertex_count = merged_vertices.len(),
        "Merge detected"
    );

    Some(MergeResult {
        target_region_index: target.index,
        merged_vertices,
        regions_to_delete,
        original_regions,
    })
}
