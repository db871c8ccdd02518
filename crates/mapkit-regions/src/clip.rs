//! Clip detection
//!
//! A committed segment that overlaps regions of its own type without
//! matching them cuts its area out of those regions. A null region, one
//! labelled [`NULL_REGION_LABEL`], is never stored itself: it only erases
//! the same-type area it covers.

use crate::geometry::{polygon_area, polygons_overlap, subtract_polygon, Difference};
use crate::merge::regions_match;
use crate::segment::RegionSegment;
use mapkit_core::{Point, Region, RegionIndex};

/// Label of a region that has no effect on the map
pub const NULL_REGION_LABEL: &str = "Normal";

pub fn is_null_region(label: Option<&str>) -> bool {
    label.is_some_and(|l| l.eq_ignore_ascii_case(NULL_REGION_LABEL))
}

/// What remains of one region after clipping
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    pub region_index: RegionIndex,
    /// The region as it was before clipping
    pub original_region: Region,
    /// Remaining pieces, largest first. Empty when the clipper covers the
    /// whole region.
    pub pieces: Vec<Vec<Point>>,
}

impl ClipResult {
    pub fn removes_region(&self) -> bool {
        self.pieces.is_empty()
    }
}

/// A commit that clips existing regions
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    pub clips: Vec<ClipResult>,
    /// The committed draft. It is stored after clipping, unless it is a null
    /// region.
    pub segment: RegionSegment,
    /// The edited region as it was before editing started
    pub original: Option<Region>,
}

impl ClipPlan {
    /// True if the draft erases instead of being stored
    pub fn erases(&self) -> bool {
        is_null_region(self.segment.label.as_deref())
    }
}

fn overlapping_same_type<'a>(
    regions: &'a [Region],
    segment: &'a RegionSegment,
    tolerance: f64,
) -> impl Iterator<Item = &'a Region> + 'a {
    regions
        .iter()
        .filter(move |r| Some(r.index) != segment.region_index)
        .filter(move |r| r.region_type == segment.region_type)
        .filter(move |r| polygons_overlap(&r.vertices, &segment.vertices, tolerance))
}

/// Same-type regions the segment overlaps but does not match, lowest index
/// first
pub fn find_clippable_regions<'a>(
    regions: &'a [Region],
    segment: &'a RegionSegment,
    tolerance: f64,
) -> Vec<&'a Region> {
    let mut found: Vec<&Region> = overlapping_same_type(regions, segment, tolerance)
        .filter(|r| !regions_match(r, segment))
        .collect();
    found.sort_by_key(|r| r.index);
    found
}

/// Same-type regions a null segment erases from, lowest index first
pub fn find_regions_for_null_clip<'a>(
    regions: &'a [Region],
    segment: &'a RegionSegment,
    tolerance: f64,
) -> Vec<&'a Region> {
    let mut found: Vec<&Region> = overlapping_same_type(regions, segment, tolerance).collect();
    found.sort_by_key(|r| r.index);
    found
}

/// Cuts `clipper` out of each region.
///
/// Regions the clipper does not reach into are skipped, and so are regions
/// it lies strictly inside of, since a region cannot have a hole.
pub fn compute_clip_results(regions: &[&Region], clipper: &[Point], tolerance: f64) -> Vec<ClipResult> {
    regions
        .iter()
        .filter_map(|region| {
            let pieces = match subtract_polygon(&region.vertices, clipper, tolerance) {
                Difference::Untouched => return None,
                Difference::Hole => {
                    tracing::debug!(region_index = region.index, "Clip would leave a hole, region kept");
                    return None;
                }
                Difference::Covered => Vec::new(),
                Difference::Pieces(mut pieces) => {
                    pieces.sort_by(|a, b| polygon_area(b).total_cmp(&polygon_area(a)));
                    pieces
                }
            };
            Some(ClipResult {
                region_index: region.index,
                original_region: (*region).clone(),
                pieces,
            })
        })
        .collect()
}

/// Clips for a regular segment, or `None` if it cuts nothing.
pub fn detect_clip(regions: &[Region], segment: &RegionSegment, tolerance: f64) -> Option<Vec<ClipResult>> {
    let candidates = find_clippable_regions(regions, segment, tolerance);
    if candidates.is_empty() {
        return None;
    }
    let clips = compute_clip_results(&candidates, &segment.vertices, tolerance);
    (!clips.is_empty()).then_some(clips)
}

/// Clips for a null segment, or `None` if the segment is not a null region.
///
/// A null segment that covers nothing yields an empty list.
pub fn detect_null_clip(regions: &[Region], segment: &RegionSegment, tolerance: f64) -> Option<Vec<ClipResult>> {
    if !is_null_region(segment.label.as_deref()) {
        return None;
    }
    let candidates = find_regions_for_null_clip(regions, segment, tolerance);
    Some(compute_clip_results(&candidates, &segment.vertices, tolerance))
}
