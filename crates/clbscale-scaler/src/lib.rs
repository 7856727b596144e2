//! clbscale-scaler — KEDA external scaler over gRPC.
//!
//! Serves the `externalscaler.ExternalScaler` interface on top of the
//! query builder in `clbscale-core`.
//!
//! # Architecture
//!
//! ```text
//! KEDA operator
//!   └── ScalerService (gRPC)
//!       ├── IsActive()       → probe the monitoring backend
//!       ├── StreamIsActive() → always rejected (no push support)
//!       ├── GetMetricSpec()  → metricName + threshold
//!       └── GetMetrics()     → QueryBuilder → MonitorBackend → latest value
//! ```

pub mod service;
pub mod status;

pub use service::ScalerService;
pub use status::to_status;

/// Generated protobuf types for the external scaler protocol.
pub mod proto {
    tonic::include_proto!("externalscaler");
}
