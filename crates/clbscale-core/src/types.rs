//! Shared types: load balancer records, metric definitions and queries.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::cloud::LoadBalancerSummary;
use crate::error::{ScalerError, ScalerResult};

/// Cloud Monitor namespace for public network load balancers.
pub const NS_PUBLIC_LB: &str = "QCE/LB_PUBLIC";
/// Cloud Monitor namespace for private network load balancers.
pub const NS_INTERNAL_LB: &str = "QCE/LB_PRIVATE";

/// Network exposure of a load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadBalancerKind {
    /// Internet facing (`OPEN`).
    Public,
    /// Reachable only inside its VPC (`INTERNAL`).
    Internal,
}

impl LoadBalancerKind {
    pub const ALL: [LoadBalancerKind; 2] = [LoadBalancerKind::Public, LoadBalancerKind::Internal];

    /// Parse the `LoadBalancerType` string reported by the CLB API.
    pub fn from_upstream(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(LoadBalancerKind::Public),
            "INTERNAL" => Some(LoadBalancerKind::Internal),
            _ => None,
        }
    }

    /// The `LoadBalancerType` string used by the CLB API.
    pub fn as_upstream(self) -> &'static str {
        match self {
            LoadBalancerKind::Public => "OPEN",
            LoadBalancerKind::Internal => "INTERNAL",
        }
    }

    /// The monitoring namespace holding metrics for this kind.
    pub fn namespace(self) -> &'static str {
        match self {
            LoadBalancerKind::Public => NS_PUBLIC_LB,
            LoadBalancerKind::Internal => NS_INTERNAL_LB,
        }
    }
}

impl fmt::Display for LoadBalancerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadBalancerKind::Public => f.write_str("Public Type"),
            LoadBalancerKind::Internal => f.write_str("Internal Type"),
        }
    }
}

/// A resolved load balancer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRecord {
    id: String,
    kind: LoadBalancerKind,
    /// Always `Some` for internal load balancers.
    vip: Option<String>,
    network_id: String,
}

impl LoadBalancerRecord {
    /// Build a record from a directory entry.
    ///
    /// The first reported VIP is kept. Fails when the kind is not one we
    /// know how to query or when an internal load balancer's first VIP is
    /// absent or empty.
    pub fn from_summary(summary: LoadBalancerSummary) -> ScalerResult<Self> {
        let LoadBalancerSummary {
            id,
            kind,
            vips,
            network_id,
        } = summary;

        let Some(parsed) = LoadBalancerKind::from_upstream(&kind) else {
            return Err(ScalerError::UnknownKind { id, kind });
        };

        let vip = vips.into_iter().next().filter(|v| !v.is_empty());
        if parsed == LoadBalancerKind::Internal && vip.is_none() {
            return Err(ScalerError::MissingVip(id));
        }

        Ok(Self {
            id,
            kind: parsed,
            vip,
            network_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> LoadBalancerKind {
        self.kind
    }

    pub fn vip(&self) -> Option<&str> {
        self.vip.as_deref()
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// Monitoring dimensions identifying this load balancer.
    ///
    /// Public load balancers are addressed by id, internal ones by their
    /// VIP within the VPC.
    pub fn dimensions(&self) -> Vec<Dimension> {
        match self.kind {
            LoadBalancerKind::Public => vec![Dimension::new("loadBalancerId", &self.id)],
            LoadBalancerKind::Internal => vec![
                Dimension::new("vip", self.vip.as_deref().unwrap_or_default()),
                Dimension::new("vpcId", &self.network_id),
            ],
        }
    }
}

/// Statistic requested from the monitoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Average,
    Maximum,
    Sum,
    Minimum,
}

impl Statistic {
    /// The `SpecifyStatistics` code understood by `GetMonitorData`.
    pub fn code(self) -> i64 {
        match self {
            Statistic::Average => 1,
            Statistic::Maximum => 2,
            Statistic::Sum => 3,
            Statistic::Minimum => 4,
        }
    }

    /// Parse a statistic name as listed by `DescribeBaseMetrics`.
    pub fn from_stat_type(raw: &str) -> Option<Self> {
        match raw {
            "avg" => Some(Statistic::Average),
            "max" => Some(Statistic::Maximum),
            "sum" => Some(Statistic::Sum),
            "min" => Some(Statistic::Minimum),
            _ => None,
        }
    }

    pub fn as_stat_type(self) -> &'static str {
        match self {
            Statistic::Average => "avg",
            Statistic::Maximum => "max",
            Statistic::Sum => "sum",
            Statistic::Minimum => "min",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stat_type())
    }
}

/// How a metric must be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Canonical metric name, the catalog key.
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    pub unit: String,
    /// Smallest sampling period the backend reports, in seconds.
    pub min_period: u64,
    pub statistic: Statistic,
}

/// A single monitoring dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A fully specified monitoring data query.
///
/// The end of the time window is left open so the backend returns up to
/// its latest available sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorQuery {
    pub namespace: String,
    pub metric_name: String,
    /// Sampling period in seconds.
    pub period: u64,
    pub statistic: Statistic,
    pub dimensions: Vec<Dimension>,
    pub start_time: DateTime<Utc>,
}

impl MonitorQuery {
    /// Value of the named dimension, if present.
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}
