//! Transformation kinds and merge-able transformation configurations.
//!
//! A transformation configuration is a JSON object mapping a kind-specific key
//! (`restore`, `fillBackground`, `remove`, `recolor`, `removeBackground`) to
//! that kind's parameters. Configurations accumulate across edits: applying a
//! recolor to an image that already has an object removal keeps both entries.
//! The merge is therefore a deep union, and keys this version of the service
//! does not know about survive a round-trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// The fixed set of supported image transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformationKind {
    /// Restore a degraded image.
    #[serde(rename = "restore")]
    Restore,

    /// Generative fill to a target aspect ratio.
    #[serde(rename = "fill")]
    Fill,

    /// Remove an object described by a prompt.
    #[serde(rename = "remove")]
    Remove,

    /// Recolor an object described by a prompt to a target color.
    #[serde(rename = "recolor")]
    Recolor,

    /// Remove the image background.
    #[serde(rename = "removeBackground")]
    RemoveBackground,
}

impl TransformationKind {
    /// The key under which this kind's parameters live in a configuration.
    #[must_use]
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Fill => "fillBackground",
            Self::Remove => "remove",
            Self::Recolor => "recolor",
            Self::RemoveBackground => "removeBackground",
        }
    }

    /// The base configuration fragment staged when this kind is selected.
    ///
    /// Parameterless kinds (restore, background removal, generative fill) are
    /// complete as-is; prompt-driven kinds start with empty parameters that
    /// field edits fill in.
    #[must_use]
    pub fn default_fragment(&self) -> TransformationConfig {
        let value = match self {
            Self::Restore => json!({ "restore": true }),
            Self::Fill => json!({ "fillBackground": true }),
            Self::Remove => json!({
                "remove": { "prompt": "", "removeShadow": false, "multiple": false }
            }),
            Self::Recolor => json!({
                "recolor": { "prompt": "", "to": "", "multiple": false }
            }),
            Self::RemoveBackground => json!({ "removeBackground": true }),
        };
        TransformationConfig::from_value(&value)
    }

    /// Whether this kind has no user-edited parameters.
    #[must_use]
    pub const fn is_parameterless(&self) -> bool {
        matches!(self, Self::Restore | Self::RemoveBackground)
    }

    /// String form used on the wire and in stored records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Fill => "fill",
            Self::Remove => "remove",
            Self::Recolor => "recolor",
            Self::RemoveBackground => "removeBackground",
        }
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restore" => Ok(Self::Restore),
            "fill" => Ok(Self::Fill),
            "remove" => Ok(Self::Remove),
            "recolor" => Ok(Self::Recolor),
            "removeBackground" => Ok(Self::RemoveBackground),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized transformation kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transformation kind: {0}")]
pub struct UnknownKind(pub String);

/// An editable parameter of a prompt-driven transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    /// The object prompt (what to remove or recolor).
    Prompt,
    /// The replacement color (recolor only).
    Color,
}

impl ParamField {
    /// The key this field writes inside the kind's parameter object.
    #[must_use]
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Color => "to",
        }
    }
}

/// A transformation configuration: a JSON object keyed by transformation kind.
///
/// Stored as an opaque map so that entries written by other versions of the
/// service survive merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformationConfig(Map<String, Value>);

impl TransformationConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a configuration from a JSON value; non-objects become empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self(map.clone()),
            _ => Self::new(),
        }
    }

    /// View the configuration as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Whether no transformation has been configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the parameters stored for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a leaf value inside a kind's parameter object, creating the object
    /// if needed.
    pub fn set_param(&mut self, kind_key: &str, field: &str, value: Value) {
        let entry = self
            .0
            .entry(kind_key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(params) = entry {
            params.insert(field.to_string(), value);
        } else {
            // Kind previously stored as a bare flag; promote to an object.
            let mut params = Map::new();
            params.insert(field.to_string(), value);
            *entry = Value::Object(params);
        }
    }

    /// Deep-union `fragment` into this configuration, returning the result.
    ///
    /// Keys present only in `self` are kept; on collision the fragment's leaf
    /// values win. Neither input is modified.
    #[must_use]
    pub fn merged(&self, fragment: &Self) -> Self {
        let merged = deep_merge(&self.to_value(), &fragment.to_value());
        Self::from_value(&merged)
    }
}

/// Recursively merge `overlay` into `base`, returning the union.
///
/// Objects merge key-wise; for any other value shape the overlay wins.
#[must_use]
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut out = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let merged = match out.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Target aspect ratios offered for generative fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Square (1:1).
    #[serde(rename = "1:1")]
    Square,

    /// Standard portrait (3:4).
    #[serde(rename = "3:4")]
    Portrait,

    /// Phone portrait (9:16).
    #[serde(rename = "9:16")]
    Phone,
}

impl AspectRatio {
    /// The ratio key stored on image records.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Phone => "9:16",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Square => "Square (1:1)",
            Self::Portrait => "Standard Portrait (3:4)",
            Self::Phone => "Phone Portrait (9:16)",
        }
    }

    /// Target pixel dimensions (width, height).
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square => (1000, 1000),
            Self::Portrait => (1000, 1334),
            Self::Phone => (1000, 1778),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(Self::Square),
            "3:4" => Ok(Self::Portrait),
            "9:16" => Ok(Self::Phone),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_string_roundtrip() {
        for kind in [
            TransformationKind::Restore,
            TransformationKind::Fill,
            TransformationKind::Remove,
            TransformationKind::Recolor,
            TransformationKind::RemoveBackground,
        ] {
            assert_eq!(kind.as_str().parse::<TransformationKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_rejected() {
        assert!("sharpen".parse::<TransformationKind>().is_err());
    }

    #[test]
    fn merge_is_a_union() {
        let existing = TransformationConfig::from_value(&json!({
            "remove": { "prompt": "car" }
        }));
        let fragment = TransformationConfig::from_value(&json!({
            "recolor": { "to": "red" }
        }));

        let merged = existing.merged(&fragment);
        assert_eq!(
            merged.to_value(),
            json!({
                "remove": { "prompt": "car" },
                "recolor": { "to": "red" }
            })
        );
    }

    #[test]
    fn fragment_leaves_win_on_collision() {
        let existing = TransformationConfig::from_value(&json!({
            "recolor": { "prompt": "shirt", "to": "blue", "multiple": false }
        }));
        let fragment = TransformationConfig::from_value(&json!({
            "recolor": { "to": "red" }
        }));

        let merged = existing.merged(&fragment);
        assert_eq!(
            merged.to_value(),
            json!({
                "recolor": { "prompt": "shirt", "to": "red", "multiple": false }
            })
        );
    }

    #[test]
    fn unknown_keys_survive_merges() {
        let existing = TransformationConfig::from_value(&json!({
            "upscale": { "factor": 2 }
        }));
        let fragment = TransformationKind::Restore.default_fragment();

        let merged = existing.merged(&fragment);
        assert_eq!(merged.get("upscale"), Some(&json!({ "factor": 2 })));
        assert_eq!(merged.get("restore"), Some(&json!(true)));
    }

    #[test]
    fn merge_is_shape_idempotent() {
        let fragment = TransformationConfig::from_value(&json!({
            "remove": { "prompt": "car", "removeShadow": true }
        }));

        let once = TransformationConfig::new().merged(&fragment);
        let twice = once.merged(&fragment);
        assert_eq!(once, twice);
    }

    #[test]
    fn set_param_promotes_bare_flags() {
        let mut config = TransformationConfig::from_value(&json!({ "recolor": true }));
        config.set_param("recolor", "to", json!("green"));
        assert_eq!(config.get("recolor"), Some(&json!({ "to": "green" })));
    }

    #[test]
    fn aspect_ratio_dimensions() {
        assert_eq!(AspectRatio::Square.dimensions(), (1000, 1000));
        assert_eq!(AspectRatio::Portrait.dimensions(), (1000, 1334));
        assert_eq!(AspectRatio::Phone.dimensions(), (1000, 1778));
    }
}
