//! Tunable thresholds for the aspect estimators.

/// Thresholds shared by the geometry and terrain estimators.
#[derive(Debug, Clone)]
pub struct EstimatorThresholds {
    /// Outline segments at or below this length are treated as noise (meters)
    pub min_segment_length_m: f64,
    /// Mean angular deviation that drives geometry confidence to zero (degrees)
    pub geometry_zero_confidence_deviation_deg: f64,
    /// Cells between the grid center and each cliff sample
    pub cliff_sample_cells: isize,
    /// Minimum grid size for cliff detection
    pub cliff_min_grid_size: usize,
    /// Maximum drop must strictly exceed this to count as a cliff (meters)
    pub cliff_min_drop_m: f64,
    /// Spread between largest and smallest drop must strictly exceed this (meters)
    pub cliff_min_spread_m: f64,
    /// Drop at which cliff confidence saturates at 1.0 (meters)
    pub cliff_full_confidence_drop_m: f64,
    /// Both gradient components below this mean flat terrain
    pub flat_gradient_epsilon: f64,
    /// Confidence reported for flat terrain
    pub flat_confidence: f64,
    /// Gradient magnitude multiplier for terrain confidence
    pub gradient_confidence_scale: f64,
}

impl Default for EstimatorThresholds {
    fn default() -> Self {
        Self {
            min_segment_length_m: 1.0,
            geometry_zero_confidence_deviation_deg: 90.0,
            cliff_sample_cells: 2,
            cliff_min_grid_size: 5,
            cliff_min_drop_m: 20.0,
            cliff_min_spread_m: 15.0,
            cliff_full_confidence_drop_m: 50.0,
            flat_gradient_epsilon: 1e-4,
            flat_confidence: 0.1,
            gradient_confidence_scale: 2.0,
        }
    }
}
