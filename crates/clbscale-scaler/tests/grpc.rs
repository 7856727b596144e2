//! End-to-end tests over a real gRPC channel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clbscale_core::testing::*;
use clbscale_core::{Catalogs, CloudError, NS_INTERNAL_LB, NS_PUBLIC_LB, QueryBuilder, ResourceCache};
use clbscale_scaler::ScalerService;
use clbscale_scaler::proto::external_scaler_client::ExternalScalerClient;
use clbscale_scaler::proto::{GetMetricsRequest, ScaledObjectRef};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::Code;
use tonic::transport::{Channel, Server};

struct Harness {
    client: ExternalScalerClient<Channel>,
    monitor: Arc<FakeMonitor>,
    directory: Arc<FakeDirectory>,
}

async fn start(monitor: FakeMonitor, directory: FakeDirectory) -> Harness {
    let monitor = Arc::new(
        monitor
            .with_catalog(
                NS_PUBLIC_LB,
                vec![
                    metric("ClientConnum", &[("60", &["avg", "max"]), ("300", &["max"])]),
                    metric("ClientAccIntraffic", &[("60", &["avg"]), ("10", &["sum"])]),
                ],
            )
            .with_catalog(NS_INTERNAL_LB, vec![metric("IntraffVip", &[("60", &["max"])])]),
    );
    let directory = Arc::new(directory);

    let catalogs = Catalogs::build(monitor.as_ref(), Duration::from_secs(5))
        .await
        .unwrap();
    let queries = QueryBuilder::new(
        Arc::new(ResourceCache::new(directory.clone())),
        Arc::new(catalogs),
    );
    let service = ScalerService::new(monitor.clone(), queries);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        Server::builder()
            .add_service(service.into_service())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    let client = ExternalScalerClient::connect(format!("http://{addr}"))
        .await
        .unwrap();
    Harness {
        client,
        monitor,
        directory,
    }
}

fn object(pairs: &[(&str, &str)]) -> ScaledObjectRef {
    ScaledObjectRef {
        name: "web".into(),
        namespace: "default".into(),
        scaler_metadata: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

fn metrics_request(pairs: &[(&str, &str)]) -> GetMetricsRequest {
    GetMetricsRequest {
        scaled_object_ref: Some(object(pairs)),
        metric_name: "s0-clb-connections".into(),
    }
}

#[tokio::test]
async fn get_metrics_returns_truncated_latest_value() {
    let mut h = start(
        FakeMonitor::new().with_values(&[1.0, 2.0, 7.5]),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let resp = h
        .client
        .get_metrics(metrics_request(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "ClientConnum"),
        ]))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.metric_values.len(), 1);
    assert_eq!(resp.metric_values[0].metric_name, "s0-clb-connections");
    assert_eq!(resp.metric_values[0].metric_value, 7);

    let queries = h.monitor.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].period, 60);
    assert_eq!(queries[0].dimensions.len(), 1);
}

#[tokio::test]
async fn get_metrics_for_internal_listener() {
    let mut h = start(
        FakeMonitor::new().with_values(&[42.0]),
        FakeDirectory::new().with("lb-int", internal_lb("lb-int", "10.0.0.5", "vpc-1")),
    )
    .await;

    let resp = h
        .client
        .get_metrics(metrics_request(&[
            ("loadBalancerId", "lb-int"),
            ("metricName", "IntraffVip"),
            ("listener", "TCP/80"),
        ]))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.metric_values[0].metric_value, 42);

    let query = &h.monitor.queries()[0];
    assert_eq!(query.namespace, NS_INTERNAL_LB);
    assert_eq!(query.dimension("vip"), Some("10.0.0.5"));
    assert_eq!(query.dimension("vpcId"), Some("vpc-1"));
    assert_eq!(query.dimension("protocol"), Some("TCP"));
    assert_eq!(query.dimension("loadBalancerPort"), Some("80"));
}

#[tokio::test]
async fn get_metrics_without_points_is_unavailable() {
    let mut h = start(
        FakeMonitor::new().with_values(&[]),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let status = h
        .client
        .get_metrics(metrics_request(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "ClientConnum"),
        ]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test]
async fn get_metrics_with_bad_listener_makes_no_cloud_call() {
    let mut h = start(
        FakeMonitor::new().with_values(&[1.0]),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let status = h
        .client
        .get_metrics(metrics_request(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "ClientConnum"),
            ("listener", "TCP-80"),
        ]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("TCP-80"));
    assert_eq!(h.directory.calls(), 0);
    assert!(h.monitor.queries().is_empty());
}

#[tokio::test]
async fn get_metrics_for_unknown_metric_is_not_found() {
    let mut h = start(
        FakeMonitor::new().with_values(&[1.0]),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let status = h
        .client
        .get_metrics(metrics_request(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "IntraffVip"),
        ]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    assert!(h.monitor.queries().is_empty());
}

#[tokio::test]
async fn get_metric_spec_returns_threshold() {
    let mut h = start(
        FakeMonitor::new(),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let resp = h
        .client
        .get_metric_spec(object(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "ClientConnum"),
            ("threshold", "100"),
        ]))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.metric_specs.len(), 1);
    assert_eq!(resp.metric_specs[0].metric_name, "ClientConnum");
    assert_eq!(resp.metric_specs[0].target_size, 100);
}

#[tokio::test]
async fn get_metric_spec_with_bad_threshold_is_invalid() {
    let mut h = start(
        FakeMonitor::new(),
        FakeDirectory::new().with("lb-001", public_lb("lb-001")),
    )
    .await;

    let status = h
        .client
        .get_metric_spec(object(&[
            ("loadBalancerId", "lb-001"),
            ("metricName", "ClientConnum"),
            ("threshold", "abc"),
        ]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("threshold should be integer"));
}

#[tokio::test]
async fn get_metric_spec_for_unknown_load_balancer_is_not_found() {
    let mut h = start(FakeMonitor::new(), FakeDirectory::new()).await;

    let status = h
        .client
        .get_metric_spec(object(&[
            ("loadBalancerId", "lb-gone"),
            ("metricName", "ClientConnum"),
            ("threshold", "10"),
        ]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn is_active_follows_backend_reachability() {
    let mut h = start(FakeMonitor::new(), FakeDirectory::new()).await;
    let resp = h.client.is_active(object(&[])).await.unwrap().into_inner();
    assert!(resp.result);

    let mut h = start(
        FakeMonitor::new().with_probe_error(CloudError::Transport("connection refused".into())),
        FakeDirectory::new(),
    )
    .await;
    let status = h.client.is_active(object(&[])).await.unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test]
async fn stream_is_active_is_rejected() {
    let mut h = start(FakeMonitor::new(), FakeDirectory::new()).await;

    let status = h.client.stream_is_active(object(&[])).await.unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
    assert_eq!(status.message(), "external push is not supported");
}
