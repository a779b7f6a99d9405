//! Core data models for wall aspect resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::geodesy::{self, normalize_angle};

/// A geographic coordinate in degrees (WGS84-like, no datum transformation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lon", alias = "longitude", alias = "lng")]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True if both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Ordered trace of a cliff edge.
pub type Outline = Vec<GeoPoint>;

/// Eight-point compass label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassDirection {
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::N,
        CompassDirection::NE,
        CompassDirection::E,
        CompassDirection::SE,
        CompassDirection::S,
        CompassDirection::SW,
        CompassDirection::W,
        CompassDirection::NW,
    ];

    /// Nearest 45° label for a bearing in degrees.
    pub fn from_degrees(deg: f64) -> Self {
        let index = (normalize_angle(deg) / 45.0).round() as usize % 8;
        Self::ALL[index]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NE => "NE",
            CompassDirection::E => "E",
            CompassDirection::SE => "SE",
            CompassDirection::S => "S",
            CompassDirection::SW => "SW",
            CompassDirection::W => "W",
            CompassDirection::NW => "NW",
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which signal produced an aspect estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectMethod {
    /// Outline geometry supplied by the caller or OSM.
    Geometry,
    /// Localized elevation drop-off in the DEM grid.
    CliffDetection,
    /// Plain terrain gradient at the grid center.
    Terrain,
}

impl AspectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectMethod::Geometry => "geometry",
            AspectMethod::CliffDetection => "cliff_detection",
            AspectMethod::Terrain => "terrain",
        }
    }
}

impl fmt::Display for AspectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved wall aspect.
///
/// Constructed through [`AspectEstimate::new`], which normalizes the angle,
/// derives the compass label and clamps the confidence. Fields are read-only
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectEstimate {
    aspect_deg: u16,
    aspect_dir: CompassDirection,
    method: AspectMethod,
    confidence: f64,
}

impl AspectEstimate {
    pub fn new(aspect_deg: f64, method: AspectMethod, confidence: f64) -> Self {
        let rounded = normalize_angle(aspect_deg.round());
        let confidence = if confidence.is_finite() {
            round_confidence(confidence.clamp(0.0, 1.0))
        } else {
            0.0
        };
        Self {
            aspect_deg: rounded as u16,
            aspect_dir: CompassDirection::from_degrees(rounded),
            method,
            confidence,
        }
    }

    pub fn aspect_deg(&self) -> u16 {
        self.aspect_deg
    }

    pub fn aspect_dir(&self) -> CompassDirection {
        self.aspect_dir
    }

    pub fn method(&self) -> AspectMethod {
        self.method
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Error building an elevation grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid size must be odd and at least 3, got {0}")]
    InvalidSize(usize),
    #[error("expected {expected} samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },
    #[error("missing elevation sample at grid position [{row},{col}]")]
    MissingSample { row: usize, col: usize },
}

/// Square grid of elevation samples in meters, centered on a query point.
///
/// Row 0 is the northernmost row, column 0 the westernmost column. Every
/// cell is populated; partial grids cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    size: usize,
    spacing_m: f64,
    elevations_m: Vec<f64>,
}

impl ElevationGrid {
    /// Build a grid from row-major samples. `None` or non-finite samples are
    /// treated as missing and reject the whole grid.
    pub fn from_samples(
        size: usize,
        spacing_m: f64,
        samples: Vec<Option<f64>>,
    ) -> Result<Self, GridError> {
        validate_size(size)?;
        let expected = size * size;
        if samples.len() != expected {
            return Err(GridError::SampleCount {
                expected,
                actual: samples.len(),
            });
        }

        let mut elevations_m = Vec::with_capacity(expected);
        for (idx, sample) in samples.into_iter().enumerate() {
            match sample {
                Some(value) if value.is_finite() => elevations_m.push(value),
                _ => {
                    return Err(GridError::MissingSample {
                        row: idx / size,
                        col: idx % size,
                    })
                }
            }
        }

        Ok(Self {
            size,
            spacing_m,
            elevations_m,
        })
    }

    /// Build a grid from nested rows, `rows[row][col]`.
    pub fn from_rows(rows: Vec<Vec<f64>>, spacing_m: f64) -> Result<Self, GridError> {
        let size = rows.len();
        validate_size(size)?;
        let mut samples = Vec::with_capacity(size * size);
        for row in rows {
            if row.len() != size {
                return Err(GridError::SampleCount {
                    expected: size * size,
                    actual: row.len() * size,
                });
            }
            samples.extend(row.into_iter().map(Some));
        }
        Self::from_samples(size, spacing_m, samples)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    pub fn center_index(&self) -> usize {
        self.size / 2
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.elevations_m.get(row * self.size + col).copied()
    }

    pub fn center(&self) -> f64 {
        let c = self.center_index();
        self.elevations_m[c * self.size + c]
    }

    /// Elevation at a signed offset from the center, `None` if outside.
    pub fn offset_from_center(&self, d_row: isize, d_col: isize) -> Option<f64> {
        let c = self.center_index() as isize;
        let row = c + d_row;
        let col = c + d_col;
        if row < 0 || col < 0 {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    /// The centered sub-grid of the given odd size, sharing this grid's spacing.
    pub fn center_window(&self, size: usize) -> Result<Self, GridError> {
        validate_size(size)?;
        if size > self.size {
            return Err(GridError::InvalidSize(size));
        }
        let start = self.center_index() - size / 2;
        let mut elevations_m = Vec::with_capacity(size * size);
        for row in start..start + size {
            let offset = row * self.size + start;
            elevations_m.extend_from_slice(&self.elevations_m[offset..offset + size]);
        }
        Ok(Self {
            size,
            spacing_m: self.spacing_m,
            elevations_m,
        })
    }
}

fn validate_size(size: usize) -> Result<(), GridError> {
    if size < 3 || size % 2 == 0 {
        return Err(GridError::InvalidSize(size));
    }
    Ok(())
}

/// Sample coordinates for a `size`×`size` grid centered on `center`.
///
/// Row-major order, rows north to south and columns west to east, matching
/// the order [`ElevationGrid::from_samples`] expects. Latitude and longitude
/// steps are derived separately so both axes are `spacing_m` apart.
pub fn grid_locations(center: GeoPoint, size: usize, spacing_m: f64) -> Vec<GeoPoint> {
    let lat_step = geodesy::meters_to_lat(spacing_m, center.latitude);
    let lon_step = geodesy::meters_to_lon(spacing_m, center.latitude);
    let half = (size / 2) as f64;

    let mut locations = Vec::with_capacity(size * size);
    for row in 0..size {
        let lat = center.latitude + (half - row as f64) * lat_step;
        for col in 0..size {
            let lon = center.longitude + (col as f64 - half) * lon_step;
            locations.push(GeoPoint::new(lat, lon));
        }
    }
    locations
}
