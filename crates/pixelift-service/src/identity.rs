//! Identity provider backend client.
//!
//! The JWT on each request only carries the subject id; profile fields
//! (email, username, avatar) come from the provider's backend API on demand.
//! They are fetched once, when a subject is first resolved to a local user.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

/// Timeout for identity provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for identity provider operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider has no record of the subject.
    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    /// The provider returned an unexpected status.
    #[error("identity provider error: HTTP {0}")]
    Api(u16),
}

/// A subject's profile, as reported by the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    /// Subject id.
    pub subject: String,
    /// Primary email address, if any.
    pub email: Option<String>,
    /// Chosen username, if any.
    pub username: Option<String>,
    /// Given name, if any.
    pub first_name: Option<String>,
    /// Family name, if any.
    pub last_name: Option<String>,
    /// Avatar URL, if any.
    pub image_url: Option<String>,
}

impl IdentityProfile {
    /// Best-effort display name: username, then given name, then the local
    /// part of the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(String::from)
            })
            .unwrap_or_else(|| self.subject.clone())
    }
}

/// Wire format of the provider's user endpoint.
#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<WireEmail>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEmail {
    email_address: String,
}

/// Identity provider backend API client.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a new identity client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch a subject's profile.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::SubjectNotFound`] if the provider has no record.
    /// - [`IdentityError::Api`] / [`IdentityError::Http`] on other failures.
    pub async fn get_profile(&self, subject: &str) -> Result<IdentityProfile, IdentityError> {
        let url = format!("{}/v1/users/{subject}", self.api_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::SubjectNotFound(subject.to_string()));
        }
        if !response.status().is_success() {
            return Err(IdentityError::Api(response.status().as_u16()));
        }

        let user: WireUser = response.json().await?;

        Ok(IdentityProfile {
            subject: user.id,
            email: user
                .email_addresses
                .into_iter()
                .next()
                .map(|e| e.email_address),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
        })
    }
}
