//! Aspect estimation from an elevation grid.
//!
//! Two estimators share the grid: directional cliff-drop detection, which
//! looks for a localized drop-off around the center, and the plain terrain
//! gradient at the center cell, which always produces an answer.

use crate::geodesy::normalize_angle;
use crate::models::{AspectEstimate, AspectMethod, ElevationGrid};
use crate::thresholds::EstimatorThresholds;

/// Grid offset (row, col) of a sample `cells` out along `direction_deg`.
///
/// Each axis component is rounded to the nearest cell, so diagonal samples
/// land on the cell nearest the sample radius rather than stepping the full
/// count along both axes. Row grows southward.
fn sample_offset(direction_deg: f64, cells: isize) -> (isize, isize) {
    let rad = direction_deg.to_radians();
    let reach = cells as f64;
    let d_row = (-rad.cos() * reach).round() as isize;
    let d_col = (rad.sin() * reach).round() as isize;
    (d_row, d_col)
}

/// Elevation drop from the center toward one compass direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CliffSample {
    pub direction_deg: f64,
    /// `center - sample`; positive when the ground falls away
    pub drop_m: f64,
}

/// Sample the elevation drop in each of the eight compass directions.
///
/// Samples reach `cliff_sample_cells` from the center, see [`sample_offset`].
/// Samples falling outside the grid are skipped.
pub fn cliff_samples(grid: &ElevationGrid, thresholds: &EstimatorThresholds) -> Vec<CliffSample> {
    let center = grid.center();
    (0..8)
        .filter_map(|idx| {
            let direction_deg = idx as f64 * 45.0;
            let (d_row, d_col) = sample_offset(direction_deg, thresholds.cliff_sample_cells);
            let sample = grid.offset_from_center(d_row, d_col)?;
            Some(CliffSample {
                direction_deg,
                drop_m: center - sample,
            })
        })
        .collect()
}

/// Cliff detection with default thresholds.
pub fn detect_cliff(grid: &ElevationGrid) -> Option<AspectEstimate> {
    detect_cliff_with(grid, &EstimatorThresholds::default())
}

/// Classify the grid center as a cliff edge and report its facing.
///
/// Requires a grid of at least `cliff_min_grid_size`. A cliff needs the
/// largest drop to strictly exceed `cliff_min_drop_m` and the spread between
/// largest and smallest drop to strictly exceed `cliff_min_spread_m`, which
/// separates a local drop-off from a uniform slope.
///
/// Sign convention: the wall faces the direction of steepest drop, reported
/// as-is with no 180° rotation. Standing on the rim, the ground falls away in
/// front of the face.
pub fn detect_cliff_with(
    grid: &ElevationGrid,
    thresholds: &EstimatorThresholds,
) -> Option<AspectEstimate> {
    if grid.size() < thresholds.cliff_min_grid_size {
        return None;
    }

    let samples = cliff_samples(grid, thresholds);
    // First sample in scan order wins ties.
    let steepest = samples
        .iter()
        .copied()
        .reduce(|best, sample| if sample.drop_m > best.drop_m { sample } else { best })?;
    let min_drop = samples
        .iter()
        .map(|p| p.drop_m)
        .fold(f64::INFINITY, f64::min);

    let spread = steepest.drop_m - min_drop;
    if !(steepest.drop_m > thresholds.cliff_min_drop_m && spread > thresholds.cliff_min_spread_m) {
        return None;
    }

    let confidence = (steepest.drop_m / thresholds.cliff_full_confidence_drop_m).min(1.0);
    Some(AspectEstimate::new(
        steepest.direction_deg,
        AspectMethod::CliffDetection,
        confidence,
    ))
}

/// Terrain gradient aspect with default thresholds.
pub fn terrain_gradient_aspect(grid: &ElevationGrid) -> AspectEstimate {
    terrain_gradient_aspect_with(grid, &EstimatorThresholds::default())
}

/// Downslope direction at the grid center from central differences.
///
/// Never fails: flat terrain reports north with the lowest confidence.
pub fn terrain_gradient_aspect_with(
    grid: &ElevationGrid,
    thresholds: &EstimatorThresholds,
) -> AspectEstimate {
    let (dz_dx, dz_dy) = central_gradient(grid);

    if dz_dx.abs() < thresholds.flat_gradient_epsilon
        && dz_dy.abs() < thresholds.flat_gradient_epsilon
    {
        return AspectEstimate::new(0.0, AspectMethod::Terrain, thresholds.flat_confidence);
    }

    // Downslope vector is (-dz/dx east, -dz/dy north); bearing = atan2(east, north).
    let aspect_deg = normalize_angle((-dz_dx).atan2(-dz_dy).to_degrees());
    let magnitude = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
    let confidence = (magnitude * thresholds.gradient_confidence_scale).min(1.0);

    AspectEstimate::new(aspect_deg, AspectMethod::Terrain, confidence)
}

/// Rise per meter toward east (`dz_dx`) and toward north (`dz_dy`).
fn central_gradient(grid: &ElevationGrid) -> (f64, f64) {
    let run = 2.0 * grid.spacing_m();
    let at = |d_row, d_col| grid.offset_from_center(d_row, d_col).unwrap_or_else(|| grid.center());
    let dz_dx = (at(0, 1) - at(0, -1)) / run;
    let dz_dy = (at(-1, 0) - at(1, 0)) / run;
    (dz_dx, dz_dy)
}

/// Cliff detection first, terrain gradient otherwise.
pub fn estimate_from_grid(grid: &ElevationGrid) -> AspectEstimate {
    detect_cliff(grid).unwrap_or_else(|| terrain_gradient_aspect(grid))
}
