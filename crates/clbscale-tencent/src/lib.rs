//! clbscale-tencent — Tencent Cloud implementations of the core cloud traits.
//!
//! [`TencentCloudClient`] signs every request with TC3-HMAC-SHA256 and
//! implements both [`LoadBalancerDirectory`](clbscale_core::LoadBalancerDirectory)
//! (CLB `DescribeLoadBalancers`) and [`MonitorBackend`](clbscale_core::MonitorBackend)
//! (Cloud Monitor `DescribeBaseMetrics`, `GetMonitorData`, `DescribeProductList`).

pub mod api;
pub mod client;
pub mod sign;

pub use client::{DEFAULT_ENDPOINT_SUFFIX, TencentCloudClient};
pub use sign::Credential;
