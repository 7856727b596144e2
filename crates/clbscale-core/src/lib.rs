//! clbscale-core — metric resolution and query construction.
//!
//! Turns the opaque metadata attached to an autoscaling request into a
//! fully specified Cloud Monitor query for a CLB load balancer.
//!
//! # Architecture
//!
//! ```text
//! ScalerMetadata ─┐
//!                 ├─ QueryBuilder ──► MonitorQuery
//! ResourceCache ──┤     (dimensions by load balancer kind)
//!   └─ LoadBalancerDirectory (first sight only)
//! Catalogs ───────┘
//!   ├─ QCE/LB_PUBLIC  → MetricCatalog
//!   └─ QCE/LB_PRIVATE → MetricCatalog
//! ```
//!
//! The resource cache and both catalogs are built explicitly at startup
//! and shared by reference; nothing here is process-global.

pub mod cache;
pub mod catalog;
pub mod cloud;
pub mod error;
pub mod metadata;
pub mod query;
pub mod resource;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::Cache;
pub use catalog::{Catalogs, MetricCatalog};
pub use cloud::{
    CloudError, CloudResult, DataSeries, LoadBalancerDirectory, LoadBalancerSummary,
    MetricDescriptor, MonitorBackend, PeriodDescriptor,
};
pub use error::{ErrorClass, ScalerError, ScalerResult};
pub use metadata::{Listener, ScalerMetadata};
pub use query::{PreparedQuery, QueryBuilder};
pub use resource::ResourceCache;
pub use types::*;
