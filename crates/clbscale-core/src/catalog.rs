//! Metric catalogs — per-namespace measurement contracts.
//!
//! Each catalog is built once at startup from `DescribeBaseMetrics` and
//! never modified afterwards. A namespace whose catalog cannot be built
//! completely is a startup failure; partial catalogs are never exposed.
//!
//! # Selection
//!
//! ```text
//! period    = smallest parseable period reported for the metric
//! statistic = "max" if that period offers it
//!             else by the first listed statistic: avg | sum | min
//!             else max
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::cloud::{MetricDescriptor, MonitorBackend, PeriodDescriptor};
use crate::error::{ScalerError, ScalerResult};
use crate::types::{LoadBalancerKind, MetricDefinition, Statistic};

/// Metric definitions for one monitoring namespace.
#[derive(Debug)]
pub struct MetricCatalog {
    namespace: String,
    metrics: Cache<String, Arc<MetricDefinition>>,
}

impl MetricCatalog {
    /// Fetch and build the catalog for `namespace`.
    pub async fn build(backend: &dyn MonitorBackend, namespace: &str) -> ScalerResult<Self> {
        let descriptors = backend
            .describe_base_metrics(namespace)
            .await
            .map_err(ScalerError::upstream(format!(
                "describe base metrics for {namespace}"
            )))?;
        Self::from_descriptors(namespace, descriptors)
    }

    /// Build the catalog from already fetched descriptors.
    pub fn from_descriptors(
        namespace: &str,
        descriptors: Vec<MetricDescriptor>,
    ) -> ScalerResult<Self> {
        let reported = descriptors.len();
        let metrics: Cache<String, Arc<MetricDefinition>> = descriptors
            .into_iter()
            .filter_map(|d| define_metric(namespace, d))
            .map(|def| (def.name.clone(), Arc::new(def)))
            .collect();

        if metrics.is_empty() {
            return Err(ScalerError::EmptyCatalog(namespace.to_string()));
        }

        info!(
            %namespace,
            reported,
            usable = metrics.len(),
            "metric catalog built"
        );

        Ok(Self {
            namespace: namespace.to_string(),
            metrics,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, metric_name: &str) -> Option<Arc<MetricDefinition>> {
        self.metrics.get(metric_name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Turn a descriptor into a definition.
///
/// Returns `None` when no reported period parses, since such a metric
/// cannot be queried.
pub fn define_metric(namespace: &str, descriptor: MetricDescriptor) -> Option<MetricDefinition> {
    let Some((min_period, statistics)) = select_period(&descriptor.periods) else {
        warn!(
            %namespace,
            metric = %descriptor.name,
            "metric has no usable period, skipping"
        );
        return None;
    };

    let statistic = select_statistic(statistics);
    debug!(
        %namespace,
        metric = %descriptor.name,
        period = min_period,
        %statistic,
        "metric defined"
    );

    Some(MetricDefinition {
        name: descriptor.name,
        display_name: descriptor.display_name,
        unit: descriptor.unit,
        min_period,
        statistic,
    })
}

/// Pick the period with the numerically smallest value.
///
/// Unparseable periods are logged and skipped. On ties the first listed
/// period wins.
fn select_period(periods: &[PeriodDescriptor]) -> Option<(u64, &[String])> {
    let mut selected: Option<(u64, &[String])> = None;
    for p in periods {
        let value = match p.period.trim().parse::<u64>() {
            Ok(v) => v,
            Err(e) => {
                warn!(period = %p.period, error = %e, "ignoring unparseable metric period");
                continue;
            }
        };
        if selected.is_none_or(|(min, _)| value < min) {
            selected = Some((value, &p.statistics));
        }
    }
    selected
}

fn select_statistic(statistics: &[String]) -> Statistic {
    if statistics.iter().any(|s| s == "max") {
        return Statistic::Maximum;
    }
    statistics
        .first()
        .and_then(|s| Statistic::from_stat_type(s))
        .unwrap_or(Statistic::Maximum)
}

/// The catalogs of both load balancer namespaces.
#[derive(Debug)]
pub struct Catalogs {
    public: MetricCatalog,
    internal: MetricCatalog,
}

impl Catalogs {
    pub fn new(public: MetricCatalog, internal: MetricCatalog) -> Self {
        Self { public, internal }
    }

    /// Build the public and internal catalogs, each bounded by `timeout`.
    pub async fn build(backend: &dyn MonitorBackend, timeout: Duration) -> ScalerResult<Self> {
        let public = build_with_timeout(backend, LoadBalancerKind::Public, timeout).await?;
        let internal = build_with_timeout(backend, LoadBalancerKind::Internal, timeout).await?;
        Ok(Self::new(public, internal))
    }

    /// The catalog holding metrics for load balancers of `kind`.
    pub fn for_kind(&self, kind: LoadBalancerKind) -> &MetricCatalog {
        match kind {
            LoadBalancerKind::Public => &self.public,
            LoadBalancerKind::Internal => &self.internal,
        }
    }

    /// Look up `metric_name` in the catalog for `kind`.
    pub fn lookup(
        &self,
        kind: LoadBalancerKind,
        metric_name: &str,
    ) -> ScalerResult<Arc<MetricDefinition>> {
        self.for_kind(kind)
            .get(metric_name)
            .ok_or_else(|| ScalerError::UnknownMetric {
                metric: metric_name.to_string(),
                kind,
            })
    }
}

async fn build_with_timeout(
    backend: &dyn MonitorBackend,
    kind: LoadBalancerKind,
    timeout: Duration,
) -> ScalerResult<MetricCatalog> {
    let namespace = kind.namespace();
    tokio::time::timeout(timeout, MetricCatalog::build(backend, namespace))
        .await
        .unwrap_or_else(|_| {
            Err(ScalerError::CatalogTimeout {
                namespace: namespace.to_string(),
                secs: timeout.as_secs(),
            })
        })
}
