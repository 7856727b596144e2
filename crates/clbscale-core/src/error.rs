//! Error types for metric resolution and query construction.

use std::num::ParseIntError;

use thiserror::Error;

use crate::cloud::{CloudError, LoadBalancerSummary};
use crate::types::LoadBalancerKind;

/// Result type alias for scaler operations.
pub type ScalerResult<T> = Result<T, ScalerError>;

/// Broad category of a [`ScalerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or malformed scaler metadata.
    Validation,
    /// The load balancer could not be resolved to a usable record.
    Resolution,
    /// The metric is not known for the resolved load balancer kind.
    Catalog,
    /// A cloud API call failed or returned nothing usable.
    Upstream,
    /// A metric catalog could not be built.
    Startup,
}

/// Errors surfaced by the resource cache, the catalogs and the query builder.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("no {0:?} found in metadata")]
    MissingMetadata(&'static str),

    #[error("bad listener format {0:?}, correct format is \"PROTOCOL/PORT\"")]
    ListenerFormat(String),

    #[error("threshold should be integer, got {value:?}: {source}")]
    ThresholdFormat {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("load balancer {0} is not found")]
    LoadBalancerNotFound(String),

    #[error("found {} load balancers by id {id}: {found:?}", .found.len())]
    Inconsistent {
        id: String,
        found: Vec<LoadBalancerSummary>,
    },

    #[error("VIP not found for internal load balancer {0}")]
    MissingVip(String),

    #[error("unknown type {kind:?} for load balancer {id}")]
    UnknownKind { id: String, kind: String },

    #[error("no metric info found for {metric} with {kind}")]
    UnknownMetric {
        metric: String,
        kind: LoadBalancerKind,
    },

    #[error("no data points found for {metric} of {load_balancer}")]
    NoData {
        metric: String,
        load_balancer: String,
    },

    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: CloudError,
    },

    #[error("no metrics found for {0}")]
    EmptyCatalog(String),

    #[error("describe base metrics for {namespace} timed out after {secs}s")]
    CatalogTimeout { namespace: String, secs: u64 },
}

impl ScalerError {
    /// Wrap a cloud error with context about the call that produced it.
    pub fn upstream(context: impl Into<String>) -> impl FnOnce(CloudError) -> Self {
        let context = context.into();
        move |source| ScalerError::Upstream { context, source }
    }

    /// The category this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            ScalerError::MissingMetadata(_)
            | ScalerError::ListenerFormat(_)
            | ScalerError::ThresholdFormat { .. } => ErrorClass::Validation,
            ScalerError::LoadBalancerNotFound(_)
            | ScalerError::Inconsistent { .. }
            | ScalerError::MissingVip(_)
            | ScalerError::UnknownKind { .. } => ErrorClass::Resolution,
            ScalerError::UnknownMetric { .. } => ErrorClass::Catalog,
            ScalerError::NoData { .. } | ScalerError::Upstream { .. } => ErrorClass::Upstream,
            ScalerError::EmptyCatalog(_) | ScalerError::CatalogTimeout { .. } => {
                ErrorClass::Startup
            }
        }
    }
}
