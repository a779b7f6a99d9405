//! Batch maintenance: recompute aspects for many stored crags.
//!
//! Records are processed strictly one at a time in fixed-size batches with a
//! pause between batches. The pacing lives in [`BatchPolicy`] so callers and
//! tests choose their own timings.

use aspect_core::angular_difference;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::client::{AspectClient, AspectRequest, ClientError};
use crate::models::{AspectResponse, CragRecord};

/// Boxed future returned by [`AspectSource::aspect_for`].
pub type AspectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AspectResponse, ClientError>> + Send + 'a>>;

/// Anything that can resolve the aspect for a stored crag.
pub trait AspectSource: Send + Sync {
    fn aspect_for<'a>(&'a self, crag: &'a CragRecord) -> AspectFuture<'a>;
}

impl AspectSource for AspectClient {
    fn aspect_for<'a>(&'a self, crag: &'a CragRecord) -> AspectFuture<'a> {
        Box::pin(async move {
            let mut request = AspectRequest::new(crag.location());
            if let Some(outline) = crag.usable_geometry() {
                request = request.with_geometry(outline.to_vec());
            }
            self.resolve_with_retry(&request).await
        })
    }
}

/// Backpressure applied to a batch run.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub id: String,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub batches: usize,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
    /// Successful resolutions per method label
    pub methods: BTreeMap<String, usize>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Share of records resolved, in percent.
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.succeeded as f64 * 100.0 / total as f64,
        }
    }

    /// Method counts, most frequent first.
    pub fn methods_by_frequency(&self) -> Vec<(&str, usize)> {
        let mut methods: Vec<(&str, usize)> = self
            .methods
            .iter()
            .map(|(method, count)| (method.as_str(), *count))
            .collect();
        methods.sort_by(|a, b| b.1.cmp(&a.1));
        methods
    }
}

pub struct BatchRunner<S> {
    source: S,
    policy: BatchPolicy,
}

impl<S: AspectSource> BatchRunner<S> {
    pub fn new(source: S, policy: BatchPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Resolve every record, updating successful ones in place.
    ///
    /// Items within a batch run sequentially. The delay is applied between
    /// batches only, never after the last one.
    pub async fn run(&self, crags: &mut [CragRecord]) -> BatchReport {
        let batch_size = self.policy.batch_size.max(1);
        let batch_count = crags.len().div_ceil(batch_size);
        let mut report = BatchReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            batches: batch_count,
            succeeded: 0,
            failures: Vec::new(),
            methods: BTreeMap::new(),
        };

        for (index, batch) in crags.chunks_mut(batch_size).enumerate() {
            tracing::info!(
                batch = index + 1,
                batches = batch_count,
                crags = batch.len(),
                "Processing batch"
            );

            for crag in batch.iter_mut() {
                match self.source.aspect_for(crag).await {
                    Ok(response) => {
                        tracing::info!(
                            crag = %crag.name,
                            aspect_deg = response.aspect_deg,
                            aspect_dir = %response.aspect_dir,
                            method = %response.method,
                            confidence = response.confidence,
                            "Aspect recalculated"
                        );
                        crag.apply(&response);
                        report.succeeded += 1;
                        *report
                            .methods
                            .entry(response.method.as_str().to_string())
                            .or_insert(0) += 1;
                    }
                    Err(err) => {
                        tracing::warn!(crag = %crag.name, error = %err, "Aspect recalculation failed");
                        report.failures.push(BatchFailure {
                            id: crag.id.clone(),
                            name: crag.name.clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }

            if index + 1 < batch_count {
                tracing::debug!(
                    delay_ms = self.policy.inter_batch_delay.as_millis() as u64,
                    "Waiting before next batch"
                );
                tokio::time::sleep(self.policy.inter_batch_delay).await;
            }
        }

        report.finished_at = Utc::now();
        report
    }
}

/// A crag with a surveyed aspect used to sanity-check a run.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCrag {
    pub name: &'static str,
    pub expected_deg: f64,
}

pub const REFERENCE_CRAGS: [ReferenceCrag; 2] = [
    ReferenceCrag {
        name: "Kolsås",
        expected_deg: 225.0,
    },
    ReferenceCrag {
        name: "Damtjern",
        expected_deg: 135.0,
    },
];

pub const REFERENCE_TOLERANCE_DEG: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCheck {
    pub reference: &'static str,
    /// Name of the matched record, if any
    pub matched: Option<String>,
    pub expected_deg: f64,
    pub actual_deg: Option<u16>,
    pub difference_deg: Option<f64>,
    pub method: Option<aspect_core::AspectMethod>,
    pub within_tolerance: bool,
}

/// Compare recalculated aspects of reference crags against their known
/// facing. Records are matched by case-insensitive name substring; the first
/// match wins. Differences are circular, so 350° vs 10° is 20° apart.
pub fn validate_references(
    crags: &[CragRecord],
    references: &[ReferenceCrag],
    tolerance_deg: f64,
) -> Vec<ReferenceCheck> {
    references
        .iter()
        .map(|reference| {
            let needle = reference.name.to_lowercase();
            let found = crags
                .iter()
                .find(|crag| crag.name.to_lowercase().contains(&needle));
            let actual_deg = found.and_then(|crag| crag.aspect);
            let difference_deg =
                actual_deg.map(|actual| angular_difference(actual as f64, reference.expected_deg));
            ReferenceCheck {
                reference: reference.name,
                matched: found.map(|crag| crag.name.clone()),
                expected_deg: reference.expected_deg,
                actual_deg,
                difference_deg,
                method: found.and_then(|crag| crag.aspect_calculation_method),
                within_tolerance: difference_deg.is_some_and(|diff| diff <= tolerance_deg),
            }
        })
        .collect()
}
