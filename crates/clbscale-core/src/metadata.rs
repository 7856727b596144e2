//! Scaler metadata — the per-request string map supplied by the autoscaler.
//!
//! Recognized keys:
//!
//! | Key | Required | Format |
//! |---|---|---|
//! | `loadBalancerId` | yes | CLB instance id |
//! | `metricName` | yes | metric name from the namespace catalog |
//! | `threshold` | for metric specs | integer |
//! | `listener` | no | `PROTOCOL/PORT` |
//!
//! Other keys are ignored. An empty required value counts as missing; an
//! empty `listener` is a malformed listener.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ScalerError, ScalerResult};
use crate::types::Dimension;

pub const KEY_LOAD_BALANCER_ID: &str = "loadBalancerId";
pub const KEY_METRIC_NAME: &str = "metricName";
pub const KEY_THRESHOLD: &str = "threshold";
pub const KEY_LISTENER: &str = "listener";

/// Read-only view over the metadata of one request.
#[derive(Debug, Clone, Copy)]
pub struct ScalerMetadata<'a> {
    entries: &'a HashMap<String, String>,
}

impl<'a> ScalerMetadata<'a> {
    pub fn new(entries: &'a HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// A non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// A non-empty value for `key`, or a validation error naming it.
    pub fn require(&self, key: &'static str) -> ScalerResult<&'a str> {
        self.get(key).ok_or(ScalerError::MissingMetadata(key))
    }

    pub fn load_balancer_id(&self) -> ScalerResult<&'a str> {
        self.require(KEY_LOAD_BALANCER_ID)
    }

    pub fn metric_name(&self) -> ScalerResult<&'a str> {
        self.require(KEY_METRIC_NAME)
    }

    /// The scaling target.
    pub fn threshold(&self) -> ScalerResult<i64> {
        let raw = self.require(KEY_THRESHOLD)?;
        raw.parse::<i64>()
            .map_err(|source| ScalerError::ThresholdFormat {
                value: raw.to_string(),
                source,
            })
    }

    /// The listener to narrow the query to, if the key is present.
    pub fn listener(&self) -> ScalerResult<Option<Listener>> {
        self.entries
            .get(KEY_LISTENER)
            .map(|raw| Listener::parse(raw))
            .transpose()
    }
}

/// A listener selector in `PROTOCOL/PORT` form, e.g. `TCP/80`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub protocol: String,
    pub port: String,
}

impl Listener {
    pub fn parse(raw: &str) -> ScalerResult<Self> {
        let mut parts = raw.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(protocol), Some(port), None) if !protocol.is_empty() && !port.is_empty() => {
                Ok(Self {
                    protocol: protocol.to_string(),
                    port: port.to_string(),
                })
            }
            _ => Err(ScalerError::ListenerFormat(raw.to_string())),
        }
    }

    /// The `protocol` and `loadBalancerPort` dimensions.
    pub fn dimensions(&self) -> [Dimension; 2] {
        [
            Dimension::new("protocol", &self.protocol),
            Dimension::new("loadBalancerPort", &self.port),
        ]
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_keys() {
        let map = entries(&[("loadBalancerId", "lb-001"), ("metricName", "ClientConnum")]);
        let md = ScalerMetadata::new(&map);
        assert_eq!(md.load_balancer_id().unwrap(), "lb-001");
        assert_eq!(md.metric_name().unwrap(), "ClientConnum");
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let map = entries(&[("loadBalancerId", "")]);
        let err = ScalerMetadata::new(&map).load_balancer_id().unwrap_err();
        assert!(matches!(err, ScalerError::MissingMetadata("loadBalancerId")));
        assert_eq!(err.to_string(), r#"no "loadBalancerId" found in metadata"#);
    }

    #[test]
    fn threshold_must_be_integer() {
        let map = entries(&[("threshold", "100")]);
        assert_eq!(ScalerMetadata::new(&map).threshold().unwrap(), 100);

        let map = entries(&[("threshold", "1.5")]);
        let err = ScalerMetadata::new(&map).threshold().unwrap_err();
        assert!(matches!(err, ScalerError::ThresholdFormat { ref value, .. } if value == "1.5"));
    }

    #[test]
    fn threshold_with_surrounding_whitespace_is_rejected() {
        let map = entries(&[("threshold", " 100 ")]);
        let err = ScalerMetadata::new(&map).threshold().unwrap_err();
        assert!(matches!(err, ScalerError::ThresholdFormat { ref value, .. } if value == " 100 "));
    }

    #[test]
    fn empty_listener_is_malformed() {
        let map = entries(&[("listener", "")]);
        let err = ScalerMetadata::new(&map).listener().unwrap_err();
        assert!(matches!(err, ScalerError::ListenerFormat(ref v) if v.is_empty()));
    }

    #[test]
    fn missing_listener_is_none() {
        let map = entries(&[]);
        assert_eq!(ScalerMetadata::new(&map).listener().unwrap(), None);
    }

    #[test]
    fn listener_parses_protocol_and_port() {
        let listener = Listener::parse("TCP/80").unwrap();
        assert_eq!(listener.protocol, "TCP");
        assert_eq!(listener.port, "80");
        assert_eq!(listener.to_string(), "TCP/80");
    }

    #[test]
    fn listener_rejects_bad_formats() {
        for raw in ["", "TCP-80", "TCP/80/1", "/80", "TCP/", "/"] {
            let err = Listener::parse(raw).unwrap_err();
            assert!(
                matches!(err, ScalerError::ListenerFormat(ref v) if v == raw),
                "{raw} should be rejected"
            );
        }
    }
}
