//! External scaler gRPC service.
//!
//! Each RPC is a thin wrapper over an inner method returning
//! [`ScalerResult`]; errors are logged once here and mapped to a status by
//! [`to_status`].

use std::sync::Arc;

use clbscale_core::{
    DataSeries, MonitorBackend, QueryBuilder, ScalerError, ScalerMetadata, ScalerResult,
};
use futures_util::stream::BoxStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use crate::proto;
use crate::proto::external_scaler_server::{ExternalScaler, ExternalScalerServer};
use crate::status::to_status;

pub const STREAM_UNSUPPORTED: &str = "external push is not supported";

/// gRPC implementation of the external scaler.
pub struct ScalerService {
    monitor: Arc<dyn MonitorBackend>,
    queries: QueryBuilder,
}

impl ScalerService {
    pub fn new(monitor: Arc<dyn MonitorBackend>, queries: QueryBuilder) -> Self {
        Self { monitor, queries }
    }

    /// Get the tonic service for mounting on a gRPC server.
    pub fn into_service(self) -> ExternalScalerServer<Self> {
        ExternalScalerServer::new(self)
    }

    /// Whether the monitoring backend is reachable. Metadata is not consulted.
    pub async fn check_active(&self) -> ScalerResult<bool> {
        self.monitor
            .probe()
            .await
            .map_err(ScalerError::upstream("probe monitoring backend"))?;
        Ok(true)
    }

    /// The metric spec for one scaled object.
    ///
    /// The load balancer is resolved so an unusable id fails here rather
    /// than on the first metrics request.
    pub async fn metric_spec(&self, metadata: &ScalerMetadata<'_>) -> ScalerResult<proto::MetricSpec> {
        let metric_name = metadata.metric_name()?;
        let load_balancer_id = metadata.load_balancer_id()?;
        self.queries.resources().resolve(load_balancer_id).await?;
        let target_size = metadata.threshold()?;

        Ok(proto::MetricSpec {
            metric_name: metric_name.to_string(),
            target_size,
        })
    }

    /// The latest value of the requested metric, truncated toward zero.
    pub async fn metric_value(&self, metadata: &ScalerMetadata<'_>) -> ScalerResult<i64> {
        let prepared = self.queries.build(metadata).await?;
        let query = &prepared.query;
        debug!(
            namespace = %query.namespace,
            metric = %query.metric_name,
            period = query.period,
            statistic = %query.statistic,
            start = %query.start_time,
            "querying monitor data"
        );

        let series = self
            .monitor
            .get_monitor_data(query)
            .await
            .map_err(ScalerError::upstream(format!(
                "get monitor data for {}",
                query.metric_name
            )))?;

        let value = series
            .first()
            .and_then(DataSeries::latest)
            .ok_or_else(|| ScalerError::NoData {
                metric: query.metric_name.clone(),
                load_balancer: prepared.load_balancer.id().to_string(),
            })?;

        let listener = prepared
            .listener
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        info!(
            load_balancer = %prepared.load_balancer.id(),
            kind = %prepared.load_balancer.kind(),
            metric = %prepared.metric.name,
            display_name = %prepared.metric.display_name,
            unit = %prepared.metric.unit,
            %listener,
            value,
            "metric value"
        );

        // Saturating float-to-int cast; NaN becomes 0.
        Ok(value as i64)
    }
}

fn reject(rpc: &'static str, object: &proto::ScaledObjectRef, err: ScalerError) -> Status {
    warn!(
        rpc,
        name = %object.name,
        namespace = %object.namespace,
        class = ?err.class(),
        error = %err,
        "request failed"
    );
    to_status(&err)
}

#[tonic::async_trait]
impl ExternalScaler for ScalerService {
    async fn is_active(
        &self,
        request: Request<proto::ScaledObjectRef>,
    ) -> Result<Response<proto::IsActiveResponse>, Status> {
        let object = request.into_inner();
        let result = self
            .check_active()
            .await
            .map_err(|e| reject("IsActive", &object, e))?;
        Ok(Response::new(proto::IsActiveResponse { result }))
    }

    type StreamIsActiveStream = BoxStream<'static, Result<proto::IsActiveResponse, Status>>;

    async fn stream_is_active(
        &self,
        _request: Request<proto::ScaledObjectRef>,
    ) -> Result<Response<Self::StreamIsActiveStream>, Status> {
        Err(Status::unimplemented(STREAM_UNSUPPORTED))
    }

    async fn get_metric_spec(
        &self,
        request: Request<proto::ScaledObjectRef>,
    ) -> Result<Response<proto::GetMetricSpecResponse>, Status> {
        let object = request.into_inner();
        let metadata = ScalerMetadata::new(&object.scaler_metadata);
        let spec = self
            .metric_spec(&metadata)
            .await
            .map_err(|e| reject("GetMetricSpec", &object, e))?;
        Ok(Response::new(proto::GetMetricSpecResponse {
            metric_specs: vec![spec],
        }))
    }

    async fn get_metrics(
        &self,
        request: Request<proto::GetMetricsRequest>,
    ) -> Result<Response<proto::GetMetricsResponse>, Status> {
        let req = request.into_inner();
        let object = req.scaled_object_ref.unwrap_or_default();
        let metadata = ScalerMetadata::new(&object.scaler_metadata);
        let metric_value = self
            .metric_value(&metadata)
            .await
            .map_err(|e| reject("GetMetrics", &object, e))?;
        Ok(Response::new(proto::GetMetricsResponse {
            metric_values: vec![proto::MetricValue {
                metric_name: req.metric_name,
                metric_value,
            }],
        }))
    }
}
