//! Ambient access-token resolution.
//!
//! Minting tokens (OAuth flows, service-account signing) is left to external
//! tooling such as `gcloud auth print-access-token`; this module only picks
//! up a token that is already present in configuration or the environment.

use std::fmt;

use thiserror::Error;

/// Environment variables consulted, in order, after any explicit token.
pub const TOKEN_ENV_VARS: &[&str] = &["DOCAI_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error(
        "no access token found (set {} or client.access_token in config, e.g. from `gcloud auth print-access-token`)",
        TOKEN_ENV_VARS.join(" or ")
    )]
    Missing,
}

/// A bearer access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    source: &'static str,
}

impl Credentials {
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            source: "explicit",
        }
    }

    /// Resolve from the process environment, preferring `explicit`.
    pub fn from_env(explicit: Option<&str>) -> Result<Self, CredentialsError> {
        Self::resolve(explicit, |name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` for environment access. Blank values are skipped.
    pub fn resolve(
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CredentialsError> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(Self::from_token(token));
        }
        for &name in TOKEN_ENV_VARS {
            if let Some(token) = lookup(name) {
                let token = token.trim();
                if !token.is_empty() {
                    return Ok(Self {
                        token: token.to_string(),
                        source: name,
                    });
                }
            }
        }
        Err(CredentialsError::Missing)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Where the token came from: `"explicit"` or the environment variable name.
    pub fn source(&self) -> &'static str {
        self.source
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_wins() {
        let creds = Credentials::resolve(
            Some("from-config"),
            env(&[("DOCAI_ACCESS_TOKEN", "from-env")]),
        )
        .unwrap();
        assert_eq!(creds.token(), "from-config");
        assert_eq!(creds.source(), "explicit");
    }

    #[test]
    fn docai_var_before_google_var() {
        let creds = Credentials::resolve(
            None,
            env(&[
                ("DOCAI_ACCESS_TOKEN", "a"),
                ("GOOGLE_OAUTH_ACCESS_TOKEN", "b"),
            ]),
        )
        .unwrap();
        assert_eq!(creds.token(), "a");
        assert_eq!(creds.source(), "DOCAI_ACCESS_TOKEN");
    }

    #[test]
    fn blank_values_skipped() {
        let creds = Credentials::resolve(
            Some("   "),
            env(&[
                ("DOCAI_ACCESS_TOKEN", ""),
                ("GOOGLE_OAUTH_ACCESS_TOKEN", " ya29.token \n"),
            ]),
        )
        .unwrap();
        assert_eq!(creds.token(), "ya29.token");
    }

    #[test]
    fn missing_is_error() {
        let err = Credentials::resolve(None, env(&[])).unwrap_err();
        assert_eq!(err, CredentialsError::Missing);
        assert!(err.to_string().contains("GOOGLE_OAUTH_ACCESS_TOKEN"));
        assert!(err.to_string().contains("gcloud auth print-access-token"));
    }

    #[test]
    fn debug_redacts_token() {
        let creds = Credentials::from_token("secret-token");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("***"));
    }
}
