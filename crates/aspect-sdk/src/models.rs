//! Wire types shared with the aspect service and crag record files.

use aspect_core::{AspectMethod, CompassDirection, GeoPoint};
use serde::{Deserialize, Serialize};

/// Successful `GET /aspect` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectResponse {
    pub lat: f64,
    pub lon: f64,
    pub aspect_deg: u16,
    pub aspect_dir: CompassDirection,
    pub method: AspectMethod,
    pub confidence: f64,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub default: String,
    pub providers: Vec<String>,
}

/// Error body returned by the service for non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub details: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message(self) -> Option<String> {
        match (self.error, self.details) {
            (Some(error), Some(details)) => Some(format!("{error}: {details}")),
            (error, details) => error.or(details),
        }
    }
}

/// A stored crag as read from and written back to record files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CragRecord {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub aspect: Option<u16>,
    #[serde(default)]
    pub wall_geometry: Option<Vec<GeoPoint>>,
    #[serde(default)]
    pub aspect_calculation_method: Option<AspectMethod>,
}

impl CragRecord {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Wall outline if it has enough points to be worth sending.
    pub fn usable_geometry(&self) -> Option<&[GeoPoint]> {
        self.wall_geometry
            .as_deref()
            .filter(|outline| outline.len() >= 2)
    }

    pub fn apply(&mut self, response: &AspectResponse) {
        self.aspect = Some(response.aspect_deg);
        self.aspect_calculation_method = Some(response.method);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crag_record_reads_nullable_fields() {
        let record: CragRecord = serde_json::from_str(
            r#"{"id":"c1","name":"Kolsås","latitude":59.9147,"longitude":10.5127,
                "aspect":null,"wall_geometry":[{"lat":59.9,"lon":10.5},{"lat":59.91,"lon":10.51}],
                "aspect_calculation_method":null}"#,
        )
        .unwrap();
        assert_eq!(record.aspect, None);
        assert_eq!(record.usable_geometry().map(<[GeoPoint]>::len), Some(2));

        let bare: CragRecord =
            serde_json::from_str(r#"{"id":"c2","name":"Damtjern","latitude":59.8,"longitude":10.28}"#)
                .unwrap();
        assert!(bare.wall_geometry.is_none());
        assert!(bare.usable_geometry().is_none());
    }

    #[test]
    fn apply_records_aspect_and_method() {
        let mut record = CragRecord {
            id: "c1".into(),
            name: "Damtjern".into(),
            latitude: 59.8041553,
            longitude: 10.2836618,
            aspect: None,
            wall_geometry: Some(vec![GeoPoint::new(59.8, 10.28)]),
            aspect_calculation_method: None,
        };
        assert!(record.usable_geometry().is_none());

        record.apply(&AspectResponse {
            lat: record.latitude,
            lon: record.longitude,
            aspect_deg: 135,
            aspect_dir: CompassDirection::SE,
            method: AspectMethod::CliffDetection,
            confidence: 0.8,
            provider: "opentopodata".into(),
        });
        assert_eq!(record.aspect, Some(135));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["aspect_calculation_method"], "cliff_detection");
    }

    #[test]
    fn error_body_message_combines_fields() {
        let body = ErrorBody {
            error: Some("Invalid request".into()),
            details: Some("Missing latitude or longitude parameters".into()),
        };
        assert_eq!(
            body.message().unwrap(),
            "Invalid request: Missing latitude or longitude parameters"
        );
        assert!(ErrorBody::default().message().is_none());
    }
}
