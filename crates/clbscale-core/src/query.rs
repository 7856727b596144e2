//! Query builder — request metadata to a monitoring data query.
//!
//! Steps, in order:
//!
//! 1. Validate `loadBalancerId`, `metricName` and the optional `listener`.
//! 2. Resolve the load balancer through the resource cache.
//! 3. Look the metric up in the catalog for the resolved kind.
//! 4. Assemble dimensions, period, statistic and a fixed lookback window.
//!
//! A malformed listener fails in step 1, before any cloud call.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::catalog::Catalogs;
use crate::error::ScalerResult;
use crate::metadata::{Listener, ScalerMetadata};
use crate::resource::ResourceCache;
use crate::types::{LoadBalancerRecord, MetricDefinition, MonitorQuery};

/// How far back the query window starts, in seconds. Covers the
/// backend's reporting delay while staying near real time.
pub const LOOKBACK_SECS: i64 = 120;

/// A query together with what it was built from.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub query: MonitorQuery,
    pub load_balancer: Arc<LoadBalancerRecord>,
    pub metric: Arc<MetricDefinition>,
    pub listener: Option<Listener>,
}

/// Builds monitoring queries against the shared resource cache and catalogs.
#[derive(Clone)]
pub struct QueryBuilder {
    resources: Arc<ResourceCache>,
    catalogs: Arc<Catalogs>,
}

impl QueryBuilder {
    pub fn new(resources: Arc<ResourceCache>, catalogs: Arc<Catalogs>) -> Self {
        Self {
            resources,
            catalogs,
        }
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Build a query whose window ends now.
    pub async fn build(&self, metadata: &ScalerMetadata<'_>) -> ScalerResult<PreparedQuery> {
        self.build_at(metadata, Utc::now()).await
    }

    /// Build a query whose window ends at `now`.
    pub async fn build_at(
        &self,
        metadata: &ScalerMetadata<'_>,
        now: DateTime<Utc>,
    ) -> ScalerResult<PreparedQuery> {
        let load_balancer_id = metadata.load_balancer_id()?;
        let metric_name = metadata.metric_name()?;
        let listener = metadata.listener()?;

        let load_balancer = self.resources.resolve(load_balancer_id).await?;
        let metric = self.catalogs.lookup(load_balancer.kind(), metric_name)?;

        let mut dimensions = load_balancer.dimensions();
        if let Some(listener) = &listener {
            dimensions.extend(listener.dimensions());
        }

        let query = MonitorQuery {
            namespace: load_balancer.kind().namespace().to_string(),
            metric_name: metric.name.clone(),
            period: metric.min_period,
            statistic: metric.statistic,
            dimensions,
            start_time: now - TimeDelta::seconds(LOOKBACK_SECS),
        };

        Ok(PreparedQuery {
            query,
            load_balancer,
            metric,
            listener,
        })
    }
}
