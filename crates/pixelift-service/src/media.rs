//! Media CDN client.
//!
//! Uploads happen directly from the browser to the CDN; this module does the
//! two server-side pieces: deriving delivery URLs that carry a transformation
//! configuration, and signing upload parameters so the browser can upload
//! with server-issued credentials.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use pixelift_core::TransformationConfig;

use crate::crypto::sha256_hex;

/// Delivery base URL for derived images.
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Signed parameters a browser needs to upload directly to the CDN.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSignature {
    /// CDN cloud name.
    pub cloud_name: String,
    /// Public API key.
    pub api_key: String,
    /// Unix timestamp the signature covers.
    pub timestamp: i64,
    /// Upload preset name.
    pub upload_preset: String,
    /// Hex SHA-256 signature over the sorted parameters.
    pub signature: String,
}

/// Media CDN client. Pure URL/signature work; no upload proxying.
#[derive(Debug, Clone)]
pub struct MediaClient {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    upload_preset: String,
}

impl MediaClient {
    /// Create a new media client.
    #[must_use]
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        upload_preset: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            upload_preset: upload_preset.into(),
        }
    }

    /// The configured cloud name.
    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Build the delivery URL for `public_id` with `config` applied.
    ///
    /// The configuration translates to chained transformation segments; keys
    /// this service does not recognize are skipped (the stored configuration
    /// still keeps them).
    #[must_use]
    pub fn transformation_url(
        &self,
        public_id: &str,
        config: &TransformationConfig,
        width: Option<u32>,
        height: Option<u32>,
    ) -> String {
        let mut segments: Vec<String> = Vec::new();

        if config.get("restore").is_some() {
            segments.push("e_gen_restore".to_string());
        }
        if config.get("removeBackground").is_some() {
            segments.push("e_background_removal".to_string());
        }
        if config.get("fillBackground").is_some() {
            segments.push("b_gen_fill".to_string());
        }
        if let Some(params) = config.get("remove") {
            let prompt = params.get("prompt").and_then(|v| v.as_str()).unwrap_or("");
            let mut segment = format!("e_gen_remove:prompt_{}", escape_component(prompt));
            if params.get("removeShadow").and_then(serde_json::Value::as_bool) == Some(true) {
                segment.push_str(";remove-shadow_true");
            }
            if params.get("multiple").and_then(serde_json::Value::as_bool) == Some(true) {
                segment.push_str(";multiple_true");
            }
            segments.push(segment);
        }
        if let Some(params) = config.get("recolor") {
            let prompt = params.get("prompt").and_then(|v| v.as_str()).unwrap_or("");
            let to = params.get("to").and_then(|v| v.as_str()).unwrap_or("");
            let mut segment = format!(
                "e_gen_recolor:prompt_{};to-color_{}",
                escape_component(prompt),
                escape_component(to)
            );
            if params.get("multiple").and_then(serde_json::Value::as_bool) == Some(true) {
                segment.push_str(";multiple_true");
            }
            segments.push(segment);
        }

        if let (Some(w), Some(h)) = (width, height) {
            segments.push(format!("w_{w},h_{h}"));
        }

        let transformation = if segments.is_empty() {
            String::new()
        } else {
            format!("{}/", segments.join("/"))
        };

        format!(
            "{DELIVERY_BASE}/{}/image/upload/{transformation}{public_id}",
            self.cloud_name
        )
    }

    /// Produce signed upload parameters for the browser widget.
    #[must_use]
    pub fn upload_signature(&self, timestamp: i64) -> UploadSignature {
        let mut params = BTreeMap::new();
        params.insert("timestamp", timestamp.to_string());
        params.insert("upload_preset", self.upload_preset.clone());

        UploadSignature {
            cloud_name: self.cloud_name.clone(),
            api_key: self.api_key.clone(),
            timestamp,
            upload_preset: self.upload_preset.clone(),
            signature: self.sign(&params),
        }
    }

    /// Sign a parameter set: SHA-256 over the sorted `k=v` pairs joined with
    /// `&`, followed by the API secret.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let joined = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        sha256_hex(&format!("{joined}{}", self.api_secret))
    }
}

/// Escape a prompt/color for use inside a transformation segment. Alphanumerics,
/// `-` and `_` pass through; everything else is percent-encoded.
fn escape_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MediaClient {
        MediaClient::new("demo", "key123", "secret456", "pixelift_preset")
    }

    fn config(value: serde_json::Value) -> TransformationConfig {
        TransformationConfig::from_value(&value)
    }

    #[test]
    fn plain_url_without_config() {
        let url = client().transformation_url("samples/cat", &TransformationConfig::new(), None, None);
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/samples/cat");
    }

    #[test]
    fn restore_url() {
        let url = client().transformation_url(
            "samples/cat",
            &config(json!({ "restore": true })),
            Some(800),
            Some(600),
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_restore/w_800,h_600/samples/cat"
        );
    }

    #[test]
    fn remove_url_escapes_prompt() {
        let url = client().transformation_url(
            "samples/street",
            &config(json!({ "remove": { "prompt": "red car", "multiple": true } })),
            None,
            None,
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:prompt_red%20car;multiple_true/samples/street"
        );
    }

    #[test]
    fn recolor_url_has_prompt_and_color() {
        let url = client().transformation_url(
            "samples/shirt",
            &config(json!({ "recolor": { "prompt": "shirt", "to": "red" } })),
            None,
            None,
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_recolor:prompt_shirt;to-color_red/samples/shirt"
        );
    }

    #[test]
    fn cumulative_config_chains_segments() {
        let url = client().transformation_url(
            "samples/street",
            &config(json!({
                "remove": { "prompt": "car" },
                "recolor": { "prompt": "door", "to": "blue" }
            })),
            None,
            None,
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:prompt_car/e_gen_recolor:prompt_door;to-color_blue/samples/street"
        );
    }

    #[test]
    fn upload_signature_is_deterministic() {
        let first = client().upload_signature(1_700_000_000);
        let second = client().upload_signature(1_700_000_000);
        assert_eq!(first.signature, second.signature);
        assert_eq!(first.signature.len(), 64);

        // Signature covers the sorted parameter string plus the secret.
        let expected = sha256_hex(&format!(
            "timestamp={}&upload_preset=pixelift_preset{}",
            1_700_000_000, "secret456"
        ));
        assert_eq!(first.signature, expected);
    }
}
