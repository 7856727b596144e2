//! Resource cache — load balancer id to resolved record.
//!
//! A record is fetched from the directory the first time an id is seen
//! and trusted for the rest of the process lifetime. Failed resolutions
//! cache nothing, so the next request for the same id tries again.
//!
//! Two requests racing on the same unresolved id may both hit the
//! directory; both store an equivalent record.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::Cache;
use crate::cloud::LoadBalancerDirectory;
use crate::error::{ScalerError, ScalerResult};
use crate::types::LoadBalancerRecord;

pub struct ResourceCache {
    records: Cache<String, Arc<LoadBalancerRecord>>,
    directory: Arc<dyn LoadBalancerDirectory>,
}

impl ResourceCache {
    pub fn new(directory: Arc<dyn LoadBalancerDirectory>) -> Self {
        Self {
            records: Cache::new(),
            directory,
        }
    }

    /// The cached record for `id`, without consulting the directory.
    pub fn get(&self, id: &str) -> Option<Arc<LoadBalancerRecord>> {
        self.records.get(id)
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve `id` to a record, asking the directory on a cache miss.
    ///
    /// The directory must report exactly one load balancer for the id.
    pub async fn resolve(&self, id: &str) -> ScalerResult<Arc<LoadBalancerRecord>> {
        if let Some(record) = self.records.get(id) {
            debug!(load_balancer = %id, "resource cache hit");
            return Ok(record);
        }

        debug!(load_balancer = %id, "resource cache miss");
        let mut found = self
            .directory
            .describe_load_balancers(&[id.to_string()])
            .await
            .map_err(ScalerError::upstream(format!("describe load balancer {id}")))?;

        if found.len() > 1 {
            return Err(ScalerError::Inconsistent {
                id: id.to_string(),
                found,
            });
        }
        let summary = found
            .pop()
            .ok_or_else(|| ScalerError::LoadBalancerNotFound(id.to_string()))?;

        let record = Arc::new(LoadBalancerRecord::from_summary(summary)?);
        self.records.insert(id.to_string(), record.clone());

        info!(
            load_balancer = %id,
            kind = %record.kind(),
            vip = record.vip().unwrap_or("-"),
            vpc = %record.network_id(),
            "load balancer resolved"
        );
        Ok(record)
    }
}
