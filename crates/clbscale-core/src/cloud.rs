//! Cloud collaborators consumed by the core.
//!
//! The load balancer directory and the monitoring backend are reached
//! through these traits. Authentication, signing and transport live in
//! the implementations; callers only see the decoded shapes below.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::MonitorQuery;

/// Result type alias for cloud calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Failure of a single cloud API call.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with an error envelope.
    #[error("[{code}] {message} (request id {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    /// The response body could not be understood.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A load balancer as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerSummary {
    pub id: String,
    /// Raw `LoadBalancerType` (`OPEN` or `INTERNAL`).
    pub kind: String,
    pub vips: Vec<String>,
    /// VPC id.
    pub network_id: String,
}

/// One reporting period of a metric and the statistics offered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodDescriptor {
    /// Period in seconds, as the unparsed string the API returns.
    pub period: String,
    /// Statistic names such as `max` or `avg`.
    pub statistics: Vec<String>,
}

/// A metric as listed by `DescribeBaseMetrics`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub periods: Vec<PeriodDescriptor>,
}

/// Values of one monitored instance, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSeries {
    pub timestamps: Vec<i64>,
    pub values: Vec<f64>,
}

impl DataSeries {
    /// The most recent value in the series.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Lookup of load balancers by id.
#[async_trait]
pub trait LoadBalancerDirectory: Send + Sync {
    async fn describe_load_balancers(&self, ids: &[String])
    -> CloudResult<Vec<LoadBalancerSummary>>;
}

/// The monitoring backend.
#[async_trait]
pub trait MonitorBackend: Send + Sync {
    /// List the metrics a namespace reports.
    async fn describe_base_metrics(&self, namespace: &str) -> CloudResult<Vec<MetricDescriptor>>;

    /// Fetch the series for a query, one per matched instance. Each series
    /// carries the values of the statistic the query asked for.
    async fn get_monitor_data(&self, query: &MonitorQuery) -> CloudResult<Vec<DataSeries>>;

    /// Cheap reachability check against the backend.
    async fn probe(&self) -> CloudResult<()>;
}
