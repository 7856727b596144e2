//! TC3-HMAC-SHA256 request signing.
//!
//! ```text
//! CanonicalRequest = POST \n / \n \n CanonicalHeaders \n SignedHeaders \n hex(sha256(payload))
//! StringToSign     = TC3-HMAC-SHA256 \n timestamp \n date/service/tc3_request \n hex(sha256(CanonicalRequest))
//! SigningKey       = HMAC(HMAC(HMAC("TC3" + key, date), service), "tc3_request")
//! ```
//!
//! Only the `content-type`, `host` and `x-tc-action` headers are signed.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

type HmacSha256 = Hmac<Sha256>;

/// API credentials. The secret key never appears in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    /// Session token of temporary credentials.
    pub token: Option<String>,
}

impl Credential {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// What a single signature covers.
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub service: &'a str,
    pub host: &'a str,
    pub action: &'a str,
    pub payload: &'a str,
    pub timestamp: DateTime<Utc>,
}

impl SigningInput<'_> {
    fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    fn credential_scope(&self) -> String {
        format!("{}/{}/tc3_request", self.date(), self.service)
    }

    pub fn canonical_request(&self) -> String {
        format!(
            "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{}\nx-tc-action:{}\n\n{SIGNED_HEADERS}\n{}",
            self.host,
            self.action.to_lowercase(),
            sha256_hex(self.payload),
        )
    }

    pub fn string_to_sign(&self) -> String {
        format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            self.timestamp.timestamp(),
            self.credential_scope(),
            sha256_hex(&self.canonical_request()),
        )
    }
}

/// Hex signature of `input` under `secret_key`.
pub fn signature(secret_key: &str, input: &SigningInput<'_>) -> String {
    let date = input.date();
    let key = hmac_sha256(format!("TC3{secret_key}").as_bytes(), &date);
    let key = hmac_sha256(&key, input.service);
    let key = hmac_sha256(&key, "tc3_request");
    hex::encode(hmac_sha256(&key, &input.string_to_sign()))
}

/// The `Authorization` header value for `input`.
pub fn authorization(credential: &Credential, input: &SigningInput<'_>) -> String {
    format!(
        "{ALGORITHM} Credential={}/{}, SignedHeaders={SIGNED_HEADERS}, Signature={}",
        credential.secret_id,
        input.credential_scope(),
        signature(&credential.secret_key, input),
    )
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
