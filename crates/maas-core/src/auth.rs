//! MAAS API key handling.
//!
//! A MAAS API key is three colon-separated parts:
//! `consumer_key:token_key:token_secret`. Requests are signed with OAuth 1.0
//! using the PLAINTEXT method and an empty consumer secret.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Parsed OAuth credentials derived from a MAAS API key.
pub struct Credentials {
    consumer_key: String,
    token_key: String,
    token_secret: SecretString,
}

impl Credentials {
    /// Parse a MAAS API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] unless the key has exactly three
    /// non-empty colon-separated parts.
    pub fn parse(api_key: &str) -> Result<Self> {
        let parts: Vec<&str> = api_key.trim().split(':').collect();
        match parts.as_slice() {
            [consumer, token, secret]
                if !consumer.is_empty() && !token.is_empty() && !secret.is_empty() =>
            {
                Ok(Self {
                    consumer_key: (*consumer).to_string(),
                    token_key: (*token).to_string(),
                    token_secret: SecretString::from((*secret).to_string()),
                })
            }
            _ => Err(Error::InvalidCredentials(
                "API key must have the form consumer_key:token_key:token_secret".to_string(),
            )),
        }
    }

    /// Consumer key part of the API key.
    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Token key part of the API key.
    #[must_use]
    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    /// Build a fresh `Authorization` header value.
    ///
    /// Each call carries a new nonce and the current timestamp.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp();
        self.authorization_header_with(&nonce, timestamp)
    }

    fn authorization_header_with(&self, nonce: &str, timestamp: i64) -> String {
        format!(
            "OAuth oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", \
             oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_signature=\"&{}\", \
             oauth_nonce=\"{nonce}\", oauth_timestamp=\"{timestamp}\"",
            self.consumer_key,
            self.token_key,
            self.token_secret.expose_secret(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}
