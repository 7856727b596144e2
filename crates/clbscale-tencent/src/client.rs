//! Signed JSON-over-HTTPS client for the CLB and Cloud Monitor APIs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clbscale_core::{
    CloudError, CloudResult, DataSeries, LoadBalancerDirectory, LoadBalancerSummary,
    MetricDescriptor, MonitorBackend, MonitorQuery,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{self, Product};
use crate::sign::{self, Credential, SigningInput};

pub const DEFAULT_ENDPOINT_SUFFIX: &str = "tencentcloudapi.com";

/// Where requests for a product are sent.
#[derive(Debug, Clone)]
enum Endpoint {
    /// `https://<service>.<suffix>/`
    Suffix(String),
    /// A fixed base URL for every product.
    Fixed(String),
}

impl Endpoint {
    fn url(&self, product: Product) -> String {
        match self {
            Endpoint::Suffix(suffix) => format!("https://{}.{suffix}/", product.service),
            Endpoint::Fixed(base) => format!("{}/", base.trim_end_matches('/')),
        }
    }

    fn host(&self, product: Product) -> String {
        match self {
            Endpoint::Suffix(suffix) => format!("{}.{suffix}", product.service),
            Endpoint::Fixed(base) => base
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Client for one region.
#[derive(Debug, Clone)]
pub struct TencentCloudClient {
    http: reqwest::Client,
    credential: Credential,
    region: String,
    endpoint: Endpoint,
}

impl TencentCloudClient {
    pub fn new(
        credential: Credential,
        region: impl Into<String>,
        endpoint_suffix: impl Into<String>,
        timeout: Duration,
    ) -> CloudResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CloudError::Transport(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            credential,
            region: region.into(),
            endpoint: Endpoint::Suffix(endpoint_suffix.into()),
        })
    }

    /// Send every request to `base_url` instead of the per-product host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint = Endpoint::Fixed(base_url.into());
        self
    }

    /// Call `action` of `product` and decode its response payload.
    pub async fn call<Req, Resp>(
        &self,
        product: Product,
        action: &str,
        request: &Req,
    ) -> CloudResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_string(request)
            .map_err(|e| CloudError::Decode(format!("encode {action} request: {e}")))?;
        let timestamp = Utc::now();
        let host = self.endpoint.host(product);
        let authorization = sign::authorization(
            &self.credential,
            &SigningInput {
                service: product.service,
                host: &host,
                action,
                payload: &payload,
                timestamp,
            },
        );

        let mut builder = self
            .http
            .post(self.endpoint.url(product))
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header("X-TC-Action", action)
            .header("X-TC-Timestamp", timestamp.timestamp().to_string())
            .header("X-TC-Version", product.version)
            .header("X-TC-Region", &self.region);
        if let Some(token) = &self.credential.token {
            builder = builder.header("X-TC-Token", token);
        }

        debug!(service = product.service, action, "calling cloud api");
        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(|e| CloudError::Transport(format!("{action}: {e}")))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CloudError::Transport(format!("{action}: {e}")))?;

        api::decode_response(action, &body).map_err(|err| match err {
            CloudError::Decode(msg) if !status.is_success() => {
                CloudError::Transport(format!("{msg} (HTTP {status})"))
            }
            other => other,
        })
    }
}

#[async_trait]
impl LoadBalancerDirectory for TencentCloudClient {
    async fn describe_load_balancers(
        &self,
        ids: &[String],
    ) -> CloudResult<Vec<LoadBalancerSummary>> {
        let resp: api::DescribeLoadBalancersResponse = self
            .call(
                api::CLB,
                "DescribeLoadBalancers",
                &api::DescribeLoadBalancersRequest {
                    load_balancer_ids: ids,
                },
            )
            .await?;
        Ok(resp.load_balancer_set.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl MonitorBackend for TencentCloudClient {
    async fn describe_base_metrics(&self, namespace: &str) -> CloudResult<Vec<MetricDescriptor>> {
        let resp: api::DescribeBaseMetricsResponse = self
            .call(
                api::MONITOR,
                "DescribeBaseMetrics",
                &api::DescribeBaseMetricsRequest { namespace },
            )
            .await?;
        Ok(resp.metric_set.into_iter().map(Into::into).collect())
    }

    async fn get_monitor_data(&self, query: &MonitorQuery) -> CloudResult<Vec<DataSeries>> {
        let resp: api::GetMonitorDataResponse = self
            .call(
                api::MONITOR,
                "GetMonitorData",
                &api::GetMonitorDataRequest::from(query),
            )
            .await?;
        Ok(resp
            .data_points
            .into_iter()
            .map(|point| point.into_series(query.statistic))
            .collect())
    }

    async fn probe(&self) -> CloudResult<()> {
        let _: api::DescribeProductListResponse = self
            .call(
                api::MONITOR,
                "DescribeProductList",
                &api::DescribeProductListRequest {
                    module: "monitor",
                    limit: 1,
                },
            )
            .await?;
        Ok(())
    }
}
