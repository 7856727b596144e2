//! Wire types of the CLB and Cloud Monitor APIs.
//!
//! Field names follow the API's PascalCase JSON. Response fields default
//! when absent so that sparse answers still decode.

use clbscale_core::{
    CloudError, CloudResult, DataSeries, LoadBalancerSummary, MetricDescriptor, MonitorQuery,
    PeriodDescriptor, Statistic,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An API product: service name plus the version its actions belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub service: &'static str,
    pub version: &'static str,
}

pub const CLB: Product = Product {
    service: "clb",
    version: "2018-03-17",
};

pub const MONITOR: Product = Product {
    service: "monitor",
    version: "2018-07-24",
};

/// Split a `{"Response": {...}}` body into the payload or its error.
pub fn decode_response<T: DeserializeOwned>(action: &str, body: &[u8]) -> CloudResult<T> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| CloudError::Decode(format!("{action}: {e}")))?;
    let mut response = envelope.response;

    if let Some(error) = response.get("Error") {
        let error: ApiError = serde_json::from_value(error.clone())
            .map_err(|e| CloudError::Decode(format!("{action} error: {e}")))?;
        let request_id = response
            .get("RequestId")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(CloudError::Api {
            code: error.code,
            message: error.message,
            request_id,
        });
    }

    serde_json::from_value(response.take()).map_err(|e| CloudError::Decode(format!("{action}: {e}")))
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

// ── clb: DescribeLoadBalancers ────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeLoadBalancersRequest<'a> {
    pub load_balancer_ids: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeLoadBalancersResponse {
    pub total_count: u64,
    pub load_balancer_set: Vec<LoadBalancer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LoadBalancer {
    pub load_balancer_id: String,
    pub load_balancer_type: String,
    pub load_balancer_vips: Vec<String>,
    pub vpc_id: String,
}

impl From<LoadBalancer> for LoadBalancerSummary {
    fn from(lb: LoadBalancer) -> Self {
        Self {
            id: lb.load_balancer_id,
            kind: lb.load_balancer_type,
            vips: lb.load_balancer_vips,
            network_id: lb.vpc_id,
        }
    }
}

// ── monitor: DescribeBaseMetrics ──────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeBaseMetricsRequest<'a> {
    pub namespace: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeBaseMetricsResponse {
    pub metric_set: Vec<MetricSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetricSet {
    pub metric_name: String,
    #[serde(rename = "MetricEName")]
    pub metric_e_name: String,
    pub unit: String,
    pub periods: Vec<PeriodsSt>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PeriodsSt {
    pub period: String,
    pub stat_type: Vec<String>,
}

impl From<MetricSet> for MetricDescriptor {
    fn from(m: MetricSet) -> Self {
        Self {
            name: m.metric_name,
            display_name: m.metric_e_name,
            unit: m.unit,
            periods: m
                .periods
                .into_iter()
                .map(|p| PeriodDescriptor {
                    period: p.period,
                    statistics: p.stat_type,
                })
                .collect(),
        }
    }
}

// ── monitor: GetMonitorData ───────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMonitorDataRequest<'a> {
    pub namespace: &'a str,
    pub metric_name: &'a str,
    pub instances: Vec<Instance<'a>>,
    pub period: u64,
    /// RFC 3339.
    pub start_time: String,
    pub specify_statistics: i64,
}

impl<'a> From<&'a MonitorQuery> for GetMonitorDataRequest<'a> {
    fn from(query: &'a MonitorQuery) -> Self {
        Self {
            namespace: &query.namespace,
            metric_name: &query.metric_name,
            instances: vec![Instance {
                dimensions: query
                    .dimensions
                    .iter()
                    .map(|d| ApiDimension {
                        name: &d.name,
                        value: &d.value,
                    })
                    .collect(),
            }],
            period: query.period,
            start_time: query.start_time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            specify_statistics: query.statistic.code(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance<'a> {
    pub dimensions: Vec<ApiDimension<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDimension<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetMonitorDataResponse {
    pub period: u64,
    pub metric_name: String,
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataPoint {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
    pub avg_values: Vec<f64>,
    pub max_values: Vec<f64>,
    pub min_values: Vec<f64>,
    pub sum_values: Vec<f64>,
}

impl DataPoint {
    /// The series for `statistic`, or the plain values when the backend
    /// did not break them out per statistic.
    pub fn into_series(self, statistic: Statistic) -> DataSeries {
        let specific = match statistic {
            Statistic::Average => self.avg_values,
            Statistic::Maximum => self.max_values,
            Statistic::Sum => self.sum_values,
            Statistic::Minimum => self.min_values,
        };
        let values = if specific.is_empty() {
            self.values
        } else {
            specific
        };
        DataSeries {
            timestamps: self.timestamps.into_iter().map(|t| t as i64).collect(),
            values,
        }
    }
}

// ── monitor: DescribeProductList ──────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeProductListRequest<'a> {
    pub module: &'a str,
    pub limit: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeProductListResponse {
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use clbscale_core::Dimension;
    use serde_json::json;

    use super::*;

    #[test]
    fn error_envelope_becomes_api_error() {
        let body = json!({
            "Response": {
                "Error": {"Code": "AuthFailure.SignatureFailure", "Message": "bad signature"},
                "RequestId": "req-42"
            }
        });
        let err = decode_response::<DescribeLoadBalancersResponse>(
            "DescribeLoadBalancers",
            body.to_string().as_bytes(),
        )
        .unwrap_err();

        match err {
            CloudError::Api {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "AuthFailure.SignatureFailure");
                assert_eq!(message, "bad signature");
                assert_eq!(request_id, "req-42");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn missing_envelope_is_decode_error() {
        let err =
            decode_response::<DescribeLoadBalancersResponse>("DescribeLoadBalancers", b"{}")
                .unwrap_err();
        assert!(matches!(err, CloudError::Decode(ref m) if m.starts_with("DescribeLoadBalancers")));
    }

    #[test]
    fn load_balancer_set_decodes() {
        let body = json!({
            "Response": {
                "TotalCount": 1,
                "LoadBalancerSet": [{
                    "LoadBalancerId": "lb-int",
                    "LoadBalancerType": "INTERNAL",
                    "LoadBalancerVips": ["10.0.0.5"],
                    "VpcId": "vpc-1",
                    "Forward": 1
                }],
                "RequestId": "req-1"
            }
        });
        let resp: DescribeLoadBalancersResponse =
            decode_response("DescribeLoadBalancers", body.to_string().as_bytes()).unwrap();
        let summary: LoadBalancerSummary = resp.load_balancer_set.into_iter().next().unwrap().into();
        assert_eq!(summary.kind, "INTERNAL");
        assert_eq!(summary.vips, vec!["10.0.0.5"]);
        assert_eq!(summary.network_id, "vpc-1");
    }

    #[test]
    fn monitor_request_shape() {
        let query = MonitorQuery {
            namespace: "QCE/LB_PRIVATE".into(),
            metric_name: "IntraffVip".into(),
            period: 60,
            statistic: Statistic::Maximum,
            dimensions: vec![Dimension::new("vip", "10.0.0.5"), Dimension::new("vpcId", "vpc-1")],
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 11, 58, 0).unwrap(),
        };
        let value = serde_json::to_value(GetMonitorDataRequest::from(&query)).unwrap();
        assert_eq!(
            value,
            json!({
                "Namespace": "QCE/LB_PRIVATE",
                "MetricName": "IntraffVip",
                "Instances": [{"Dimensions": [
                    {"Name": "vip", "Value": "10.0.0.5"},
                    {"Name": "vpcId", "Value": "vpc-1"}
                ]}],
                "Period": 60,
                "StartTime": "2024-05-01T11:58:00Z",
                "SpecifyStatistics": 2
            })
        );
    }

    #[test]
    fn series_prefers_the_requested_statistic() {
        let point = DataPoint {
            timestamps: vec![1.0, 2.0],
            values: vec![1.0, 2.0],
            max_values: vec![5.0, 9.0],
            ..Default::default()
        };
        assert_eq!(point.into_series(Statistic::Maximum).values, vec![5.0, 9.0]);

        let point = DataPoint {
            timestamps: vec![1.0, 2.0],
            values: vec![1.0, 2.0],
            ..Default::default()
        };
        let series = point.into_series(Statistic::Sum);
        assert_eq!(series.values, vec![1.0, 2.0]);
        assert_eq!(series.timestamps, vec![1, 2]);
    }
}
