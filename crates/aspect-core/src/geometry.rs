//! Aspect estimation from an outline of the rock face.
//!
//! Each outline segment faces along one of its two perpendiculars; the one
//! pointing toward the reference point (the crag coordinate, which sits on
//! the approach side of the wall) wins. Segment facings are combined with a
//! length-weighted circular mean, and confidence falls with the spread of
//! the facings around that mean.

use crate::geodesy::{angular_difference, bearing, distance, midpoint, normalize_angle};
use crate::models::{AspectEstimate, AspectMethod, GeoPoint};
use crate::thresholds::EstimatorThresholds;

/// One usable piece of an outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineSegment {
    pub bearing_deg: f64,
    pub length_m: f64,
    /// Perpendicular of the segment on the reference point's side
    pub face_aspect_deg: f64,
}

/// Split an outline into segments longer than the noise threshold.
pub fn outline_segments(
    outline: &[GeoPoint],
    reference: GeoPoint,
    thresholds: &EstimatorThresholds,
) -> Vec<OutlineSegment> {
    outline
        .windows(2)
        .filter_map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let length_m = distance(start, end);
            if !(length_m > thresholds.min_segment_length_m) {
                return None;
            }
            let bearing_deg = bearing(start, end);
            let toward_reference = bearing(midpoint(start, end), reference);
            Some(OutlineSegment {
                bearing_deg,
                length_m,
                face_aspect_deg: facing_perpendicular(bearing_deg, toward_reference),
            })
        })
        .collect()
}

/// The perpendicular of `segment_bearing` angularly closest to `toward`.
fn facing_perpendicular(segment_bearing: f64, toward: f64) -> f64 {
    let right = normalize_angle(segment_bearing + 90.0);
    let left = normalize_angle(segment_bearing - 90.0);
    if angular_difference(right, toward) <= angular_difference(left, toward) {
        right
    } else {
        left
    }
}

/// Length-weighted circular mean of segment facings, in degrees.
pub fn weighted_circular_mean(segments: &[OutlineSegment]) -> Option<f64> {
    let total_length: f64 = segments.iter().map(|s| s.length_m).sum();
    if segments.is_empty() || !(total_length > 0.0) {
        return None;
    }

    let (mut sum_north, mut sum_east) = (0.0, 0.0);
    for segment in segments {
        let weight = segment.length_m / total_length;
        let radians = segment.face_aspect_deg.to_radians();
        sum_north += radians.cos() * weight;
        sum_east += radians.sin() * weight;
    }

    Some(normalize_angle(sum_east.atan2(sum_north).to_degrees()))
}

/// Estimate the wall aspect from an outline using default thresholds.
pub fn estimate_from_outline(outline: &[GeoPoint], reference: GeoPoint) -> Option<AspectEstimate> {
    estimate_from_outline_with(outline, reference, &EstimatorThresholds::default())
}

/// Estimate the wall aspect from an outline.
///
/// Returns `None` when the outline has no segment longer than the noise
/// threshold; that is "no geometry", not an error.
pub fn estimate_from_outline_with(
    outline: &[GeoPoint],
    reference: GeoPoint,
    thresholds: &EstimatorThresholds,
) -> Option<AspectEstimate> {
    if outline.len() < 2 {
        return None;
    }

    let segments = outline_segments(outline, reference, thresholds);
    let mean = weighted_circular_mean(&segments)?;

    let mean_deviation = segments
        .iter()
        .map(|s| angular_difference(s.face_aspect_deg, mean))
        .sum::<f64>()
        / segments.len() as f64;
    let confidence =
        (1.0 - mean_deviation / thresholds.geometry_zero_confidence_deviation_deg).max(0.0);

    Some(AspectEstimate::new(mean, AspectMethod::Geometry, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::offset_position;
    use crate::models::CompassDirection;

    fn origin() -> GeoPoint {
        GeoPoint::new(59.9146, 10.5127)
    }

    #[test]
    fn straight_segment_faces_reference_side() {
        let start = origin();
        let end = offset_position(start, 0.0, 80.0);
        // reference 40 m south of the segment midpoint
        let reference = offset_position(midpoint(start, end), -40.0, 0.0);

        let estimate = estimate_from_outline(&[start, end], reference).unwrap();
        assert_eq!(estimate.method(), AspectMethod::Geometry);
        assert_eq!(estimate.aspect_deg(), 180);
        assert_eq!(estimate.aspect_dir(), CompassDirection::S);
        assert_eq!(estimate.confidence(), 1.0);
    }

    #[test]
    fn reference_on_other_side_flips_facing() {
        let start = origin();
        let end = offset_position(start, 0.0, 80.0);
        let reference = offset_position(midpoint(start, end), 40.0, 0.0);

        let estimate = estimate_from_outline(&[start, end], reference).unwrap();
        assert!(estimate.aspect_deg() == 0 || estimate.aspect_deg() == 359);
        assert_eq!(estimate.aspect_dir(), CompassDirection::N);
        assert_eq!(estimate.confidence(), 1.0);
    }

    #[test]
    fn right_angle_outline_halves_confidence() {
        let p0 = origin();
        let p1 = offset_position(p0, 0.0, 100.0);
        let p2 = offset_position(p1, 100.0, 0.0);
        let reference = offset_position(p1, -50.0, 50.0);

        let estimate = estimate_from_outline(&[p0, p1, p2], reference).unwrap();
        assert!((estimate.aspect_deg() as f64 - 135.0).abs() <= 1.0);
        assert!((estimate.confidence() - 0.5).abs() <= 0.01);
    }

    #[test]
    fn longer_segment_dominates_mean() {
        let p0 = origin();
        let p1 = offset_position(p0, 0.0, 300.0);
        let p2 = offset_position(p1, 30.0, 0.0);
        let reference = offset_position(p1, -60.0, 20.0);

        let estimate = estimate_from_outline(&[p0, p1, p2], reference).unwrap();
        // 300 m facing south, 30 m facing east
        let aspect = estimate.aspect_deg() as f64;
        assert!(aspect > 165.0 && aspect < 180.0, "aspect {aspect}");
    }

    #[test]
    fn sub_meter_jitter_is_ignored() {
        let p0 = origin();
        let p1 = offset_position(p0, 0.3, 0.2);
        let p2 = offset_position(p1, 0.0, 60.0);
        let reference = offset_position(midpoint(p1, p2), -30.0, 0.0);

        let segments = outline_segments(&[p0, p1, p2], reference, &EstimatorThresholds::default());
        assert_eq!(segments.len(), 1);
        let estimate = estimate_from_outline(&[p0, p1, p2], reference).unwrap();
        assert_eq!(estimate.confidence(), 1.0);
    }

    #[test]
    fn no_usable_segments_yields_none() {
        let p0 = origin();
        let p1 = offset_position(p0, 0.4, 0.4);
        assert!(estimate_from_outline(&[p0, p1], p0).is_none());
        assert!(estimate_from_outline(&[p0], p0).is_none());
        assert!(estimate_from_outline(&[], p0).is_none());
    }

    #[test]
    fn hairpin_outline_has_low_confidence() {
        // a hairpin: out east then back west on a parallel line 20 m south
        let p0 = origin();
        let p1 = offset_position(p0, 0.0, 100.0);
        let p2 = offset_position(p1, -20.0, 0.0);
        let p3 = offset_position(p2, 0.0, -100.0);
        // reference between the two long legs
        let reference = offset_position(p0, -10.0, 50.0);

        let estimate = estimate_from_outline(&[p0, p1, p2, p3], reference).unwrap();
        // legs face north and south, the short turn faces west
        assert!(estimate.confidence() < 0.4, "confidence {}", estimate.confidence());
    }

    #[test]
    fn circular_mean_wraps_through_north() {
        let segments = [
            OutlineSegment {
                bearing_deg: 80.0,
                length_m: 10.0,
                face_aspect_deg: 350.0,
            },
            OutlineSegment {
                bearing_deg: 100.0,
                length_m: 10.0,
                face_aspect_deg: 10.0,
            },
        ];
        let mean = weighted_circular_mean(&segments).unwrap();
        assert!(angular_difference(mean, 0.0) < 1e-9);
    }
}
