//! Mapping from scaler errors to gRPC status codes.
//!
//! | Error | Code |
//! |---|---|
//! | missing or malformed metadata | `INVALID_ARGUMENT` |
//! | unknown load balancer or metric | `NOT_FOUND` |
//! | unusable load balancer record | `FAILED_PRECONDITION` |
//! | no data points, transport failure | `UNAVAILABLE` |
//! | API error envelope, undecodable response | `INTERNAL` |

use clbscale_core::{CloudError, ScalerError};
use tonic::Status;

pub fn to_status(err: &ScalerError) -> Status {
    let message = err.to_string();
    match err {
        ScalerError::MissingMetadata(_)
        | ScalerError::ListenerFormat(_)
        | ScalerError::ThresholdFormat { .. } => Status::invalid_argument(message),
        ScalerError::LoadBalancerNotFound(_) | ScalerError::UnknownMetric { .. } => {
            Status::not_found(message)
        }
        ScalerError::Inconsistent { .. }
        | ScalerError::MissingVip(_)
        | ScalerError::UnknownKind { .. } => Status::failed_precondition(message),
        ScalerError::NoData { .. } => Status::unavailable(message),
        ScalerError::Upstream { source, .. } => match source {
            CloudError::Transport(_) => Status::unavailable(message),
            CloudError::Api { .. } | CloudError::Decode(_) => Status::internal(message),
        },
        ScalerError::EmptyCatalog(_) | ScalerError::CatalogTimeout { .. } => {
            Status::internal(message)
        }
    }
}
