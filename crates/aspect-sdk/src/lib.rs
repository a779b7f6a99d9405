//! Aspect SDK - client library for the aspect service
//!
//! Wraps the HTTP surface with caller-side retry and provides the batch
//! maintenance runner used to recompute stored crag aspects.

pub mod backoff;
pub mod batch;
pub mod client;
pub mod models;

pub use aspect_core::{AspectMethod, CompassDirection, GeoPoint};
pub use batch::{
    validate_references, AspectSource, BatchFailure, BatchPolicy, BatchReport, BatchRunner,
    ReferenceCheck, ReferenceCrag, REFERENCE_CRAGS, REFERENCE_TOLERANCE_DEG,
};
pub use client::{AspectClient, AspectRequest, ClientError, RetryPolicy};
pub use models::{AspectResponse, CragRecord, ProvidersResponse};
