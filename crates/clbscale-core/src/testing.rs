//! In-memory fakes of the cloud collaborators.
//!
//! Both fakes count their calls so tests can assert on cache behaviour.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::cloud::*;
use crate::types::MonitorQuery;

/// A public load balancer entry.
pub fn public_lb(id: &str) -> LoadBalancerSummary {
    LoadBalancerSummary {
        id: id.to_string(),
        kind: "OPEN".to_string(),
        vips: vec!["203.0.113.10".to_string()],
        network_id: "vpc-public".to_string(),
    }
}

/// An internal load balancer entry.
pub fn internal_lb(id: &str, vip: &str, vpc: &str) -> LoadBalancerSummary {
    LoadBalancerSummary {
        id: id.to_string(),
        kind: "INTERNAL".to_string(),
        vips: vec![vip.to_string()],
        network_id: vpc.to_string(),
    }
}

/// A metric descriptor from `(period, statistics)` pairs.
pub fn metric(name: &str, periods: &[(&str, &[&str])]) -> MetricDescriptor {
    MetricDescriptor {
        name: name.to_string(),
        display_name: name.to_lowercase(),
        unit: "count".to_string(),
        periods: periods
            .iter()
            .map(|(period, stats)| PeriodDescriptor {
                period: period.to_string(),
                statistics: stats.iter().map(|s| s.to_string()).collect(),
            })
            .collect(),
    }
}

/// A load balancer directory backed by a fixed answer per id.
#[derive(Default)]
pub struct FakeDirectory {
    answers: Mutex<HashMap<String, CloudResult<Vec<LoadBalancerSummary>>>>,
    calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer lookups of `id` with exactly `summary`.
    pub fn with(self, id: &str, summary: LoadBalancerSummary) -> Self {
        self.answer(id, Ok(vec![summary]));
        self
    }

    /// Set the raw answer for lookups of `id`.
    pub fn answer(&self, id: &str, answer: CloudResult<Vec<LoadBalancerSummary>>) {
        self.answers
            .lock()
            .expect("answers lock")
            .insert(id.to_string(), answer);
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadBalancerDirectory for FakeDirectory {
    async fn describe_load_balancers(
        &self,
        ids: &[String],
    ) -> CloudResult<Vec<LoadBalancerSummary>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answers = self.answers.lock().expect("answers lock");
        let mut found = Vec::new();
        for id in ids {
            match answers.get(id) {
                Some(Ok(summaries)) => found.extend(summaries.iter().cloned()),
                Some(Err(e)) => return Err(e.clone()),
                None => {}
            }
        }
        Ok(found)
    }
}

/// A monitoring backend with canned catalogs and series.
pub struct FakeMonitor {
    catalogs: HashMap<String, Vec<MetricDescriptor>>,
    catalog_errors: HashMap<String, CloudError>,
    catalog_delays: HashMap<String, Duration>,
    series: Mutex<CloudResult<Vec<DataSeries>>>,
    probe_error: Option<CloudError>,
    queries: Mutex<Vec<MonitorQuery>>,
    catalog_calls: AtomicUsize,
}

impl FakeMonitor {
    pub fn new() -> Self {
        Self {
            catalogs: HashMap::new(),
            catalog_errors: HashMap::new(),
            catalog_delays: HashMap::new(),
            series: Mutex::new(Ok(Vec::new())),
            probe_error: None,
            queries: Mutex::new(Vec::new()),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    /// Report `metrics` for `namespace`.
    pub fn with_catalog(mut self, namespace: &str, metrics: Vec<MetricDescriptor>) -> Self {
        self.catalogs.insert(namespace.to_string(), metrics);
        self
    }

    /// Fail `describe_base_metrics` for `namespace` with `err`.
    pub fn with_catalog_error(mut self, namespace: &str, err: CloudError) -> Self {
        self.catalog_errors.insert(namespace.to_string(), err);
        self
    }

    /// Stall `describe_base_metrics` for `namespace` by `delay` before answering.
    pub fn with_catalog_delay(mut self, namespace: &str, delay: Duration) -> Self {
        self.catalog_delays.insert(namespace.to_string(), delay);
        self
    }

    /// Answer every data query with a single series of `values`.
    pub fn with_values(self, values: &[f64]) -> Self {
        self.set_series(Ok(vec![DataSeries {
            timestamps: (0..values.len() as i64).map(|i| 1_700_000_000 + i * 60).collect(),
            values: values.to_vec(),
        }]));
        self
    }

    /// Make the liveness probe fail.
    pub fn with_probe_error(mut self, err: CloudError) -> Self {
        self.probe_error = Some(err);
        self
    }

    /// Set the raw answer for data queries.
    pub fn set_series(&self, series: CloudResult<Vec<DataSeries>>) {
        *self.series.lock().expect("series lock") = series;
    }

    /// Every data query received so far.
    pub fn queries(&self) -> Vec<MonitorQuery> {
        self.queries.lock().expect("queries lock").clone()
    }

    /// Number of `describe_base_metrics` calls so far.
    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorBackend for FakeMonitor {
    async fn describe_base_metrics(&self, namespace: &str) -> CloudResult<Vec<MetricDescriptor>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.catalog_delays.get(namespace) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.catalog_errors.get(namespace) {
            return Err(err.clone());
        }
        Ok(self.catalogs.get(namespace).cloned().unwrap_or_default())
    }

    async fn get_monitor_data(&self, query: &MonitorQuery) -> CloudResult<Vec<DataSeries>> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.clone());
        self.series.lock().expect("series lock").clone()
    }

    async fn probe(&self) -> CloudResult<()> {
        match &self.probe_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
