//! Command line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "clbscaled", about = "KEDA external scaler for Tencent Cloud CLB")]
pub struct Config {
    /// Region of the load balancers, e.g. ap-guangzhou.
    #[arg(long, env = "REGION")]
    pub region: String,

    /// Secret id of the cloud account.
    #[arg(long, env = "SECRET_ID", hide_env_values = true)]
    pub secret_id: String,

    /// Secret key of the cloud account.
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Session token, for temporary credentials.
    #[arg(long, env = "SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Address the gRPC metrics service binds to.
    #[arg(long, env = "METRICS_SERVICE_BIND_ADDRESS", default_value = "0.0.0.0:9000")]
    pub metrics_service_bind_address: SocketAddr,

    /// Address the health probe endpoint binds to.
    #[arg(long, env = "HEALTH_PROBE_BIND_ADDRESS", default_value = "0.0.0.0:8081")]
    pub health_probe_bind_address: SocketAddr,

    /// Domain suffix of the cloud API endpoints.
    #[arg(long, env = "API_ENDPOINT_SUFFIX", default_value = "tencentcloudapi.com")]
    pub api_endpoint_suffix: String,

    /// Timeout of a single cloud API call, in seconds.
    #[arg(long, env = "API_TIMEOUT_SECS", default_value = "10")]
    pub api_timeout_secs: u64,

    /// Upper bound on building each metric catalog at startup, in seconds.
    #[arg(long, env = "CATALOG_TIMEOUT_SECS", default_value = "60")]
    pub catalog_timeout_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from([
            "clbscaled",
            "--region",
            "ap-guangzhou",
            "--secret-id",
            "AKIDEXAMPLE",
            "--secret-key",
            "secret",
        ])
        .unwrap();

        assert_eq!(config.region, "ap-guangzhou");
        assert_eq!(config.metrics_service_bind_address.port(), 9000);
        assert_eq!(config.health_probe_bind_address.port(), 8081);
        assert_eq!(config.api_endpoint_suffix, "tencentcloudapi.com");
        assert_eq!(config.api_timeout(), Duration::from_secs(10));
        assert_eq!(config.catalog_timeout(), Duration::from_secs(60));
        assert!(config.session_token.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "clbscaled",
            "--region",
            "ap-shanghai",
            "--secret-id",
            "id",
            "--secret-key",
            "key",
            "--session-token",
            "token",
            "--metrics-service-bind-address",
            "127.0.0.1:19000",
            "--catalog-timeout-secs",
            "5",
            "--log-json",
        ])
        .unwrap();

        assert_eq!(config.session_token.as_deref(), Some("token"));
        assert_eq!(
            config.metrics_service_bind_address,
            "127.0.0.1:19000".parse().unwrap()
        );
        assert_eq!(config.catalog_timeout(), Duration::from_secs(5));
        assert!(config.log_json);
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let result = Config::try_parse_from([
            "clbscaled",
            "--region",
            "ap-guangzhou",
            "--secret-id",
            "id",
            "--secret-key",
            "key",
            "--health-probe-bind-address",
            ":8081",
        ]);
        assert!(result.is_err());
    }
}
