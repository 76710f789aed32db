//! Bearer token + zone for the unlocking API, validated once at construction.
use std::fmt;

use unblock_common::{Result, UnblockError};
use unblock_config::UnlockerConfig;

#[derive(Clone)]
pub struct Credentials {
    token: String,
    zone: String,
}

impl Credentials {
    /// Validate a token/zone pair.
    ///
    /// ```
    /// use unblock_web::Credentials;
    ///
    /// let creds = Credentials::new("tok", "unblocker").unwrap();
    /// assert_eq!(creds.zone(), "unblocker");
    /// assert!(Credentials::new("", "unblocker").is_err());
    /// ```
    pub fn new(token: impl Into<String>, zone: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let zone = zone.into();

        if token.trim().is_empty() {
            return Err(UnblockError::Config(
                "unlocking API key not found; set BRIGHT_DATA_API_KEY or unlocker.api_key".into(),
            ));
        }
        if token.contains("${") {
            return Err(UnblockError::Config(
                "unlocking API key contains an unresolved ${VAR} placeholder".into(),
            ));
        }
        if zone.trim().is_empty() {
            return Err(UnblockError::Config("unlocker zone must not be empty".into()));
        }

        Ok(Self {
            token,
            zone: zone.trim().to_string(),
        })
    }

    pub fn from_config(config: &UnlockerConfig) -> Result<Self> {
        Self::new(config.api_key.clone().unwrap_or_default(), config.zone.clone())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("zone", &self.zone)
            .finish()
    }
}
