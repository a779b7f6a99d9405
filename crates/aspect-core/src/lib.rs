//! Wall aspect resolution engine core.
//!
//! Pure geodesy, data model and estimators. Network access and orchestration
//! live in `aspect-server`.

pub mod geodesy;
pub mod geometry;
pub mod models;
pub mod terrain;
pub mod thresholds;

pub use geodesy::{angular_difference, bearing, distance, normalize_angle};
pub use geometry::{estimate_from_outline, estimate_from_outline_with, OutlineSegment};
pub use models::{
    grid_locations, AspectEstimate, AspectMethod, CompassDirection, ElevationGrid, GeoPoint,
    GridError, Outline,
};
pub use terrain::{
    detect_cliff, detect_cliff_with, estimate_from_grid, terrain_gradient_aspect,
    terrain_gradient_aspect_with, CliffSample,
};
pub use thresholds::EstimatorThresholds;
