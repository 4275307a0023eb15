//! Image transformation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ImageId, TransformationConfig, TransformationKind, UserId};

/// The mutable portion of an image record, supplied on create and update.
///
/// `config` is the committed transformation configuration;
/// `transformation_url` is the CDN delivery URL derived from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDetails {
    /// User-chosen title.
    pub title: String,

    /// CDN public identifier of the uploaded original.
    pub public_id: String,

    /// HTTPS delivery URL of the uploaded original.
    pub secure_url: String,

    /// Pixel width, when known.
    pub width: Option<u32>,

    /// Pixel height, when known.
    pub height: Option<u32>,

    /// Committed transformation configuration.
    pub config: TransformationConfig,

    /// Derived delivery URL with the configuration applied.
    pub transformation_url: Option<String>,

    /// Selected aspect ratio key (generative fill).
    pub aspect_ratio: Option<String>,

    /// Last prompt used (remove / recolor).
    pub prompt: Option<String>,

    /// Last target color used (recolor).
    pub color: Option<String>,
}

/// A persisted image transformation record.
///
/// `id`, `author`, and `created_at` are immutable after creation; updates
/// replace the remaining fields wholesale. Only the author may mutate the
/// record, enforced in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Record id (time-ordered).
    pub id: ImageId,

    /// Owning user.
    pub author: UserId,

    /// Which transformation this record is for.
    pub transformation_type: TransformationKind,

    /// Mutable fields.
    #[serde(flatten)]
    pub details: ImageDetails,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Image {
    /// Create a new image record.
    #[must_use]
    pub fn new(author: UserId, transformation_type: TransformationKind, details: ImageDetails) -> Self {
        let now = Utc::now();
        Self {
            id: ImageId::generate(),
            author,
            transformation_type,
            details,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the mutable fields, bumping `updated_at`.
    pub fn apply_update(&mut self, transformation_type: TransformationKind, details: ImageDetails) {
        self.transformation_type = transformation_type;
        self.details = details;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(title: &str) -> ImageDetails {
        ImageDetails {
            title: title.to_string(),
            public_id: "samples/cat".to_string(),
            secure_url: "https://cdn.test/samples/cat.jpg".to_string(),
            width: Some(800),
            height: Some(600),
            ..ImageDetails::default()
        }
    }

    #[test]
    fn update_preserves_identity_fields() {
        let author = UserId::generate();
        let mut image = Image::new(author, TransformationKind::Remove, details("before"));
        let id = image.id;
        let created = image.created_at;

        image.apply_update(TransformationKind::Recolor, details("after"));

        assert_eq!(image.id, id);
        assert_eq!(image.author, author);
        assert_eq!(image.created_at, created);
        assert_eq!(image.details.title, "after");
        assert_eq!(image.transformation_type, TransformationKind::Recolor);
    }

    #[test]
    fn record_serializes_with_flattened_details() {
        let image = Image::new(UserId::generate(), TransformationKind::Restore, details("t"));
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["title"], json!("t"));
        assert_eq!(value["transformation_type"], json!("restore"));
    }
}
