//! Setting resolution: CLI flags > environment > config file > defaults.

use std::path::Path;

use docai_core::config_file::ConfigFile;

/// Location used when none is configured.
pub const DEFAULT_LOCATION: &str = "us";

/// MIME type used when none is given, guessable, or configured.
pub const DEFAULT_MIME_TYPE: &str = "application/pdf";

pub const ENV_PROJECT: &str = "DOCAI_PROJECT";
pub const ENV_LOCATION: &str = "DOCAI_LOCATION";
pub const ENV_PROCESSOR: &str = "DOCAI_PROCESSOR";
pub const ENV_API_ENDPOINT: &str = "DOCAI_API_ENDPOINT";

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub project: Option<String>,
    pub location: Option<String>,
    pub processor: Option<String>,
    pub api_endpoint: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Clone, Default)]
pub struct Settings {
    pub project: Option<String>,
    pub location: String,
    pub processor: Option<String>,
    pub api_endpoint: Option<String>,
    pub access_token: Option<String>,
    pub default_mime_type: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("processor", &self.processor)
            .field("api_endpoint", &self.api_endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("default_mime_type", &self.default_mime_type)
            .finish()
    }
}

/// Resolve settings, reading the environment through `lookup`.
pub fn resolve(
    flags: Flags,
    config: &ConfigFile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let processor_cfg = config.processor.clone().unwrap_or_default();
    let client_cfg = config.client.clone().unwrap_or_default();

    Settings {
        project: flags
            .project
            .or_else(|| env(ENV_PROJECT))
            .or(processor_cfg.project),
        location: flags
            .location
            .or_else(|| env(ENV_LOCATION))
            .or(processor_cfg.location)
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        processor: flags
            .processor
            .or_else(|| env(ENV_PROCESSOR))
            .or(processor_cfg.processor),
        api_endpoint: flags
            .api_endpoint
            .or_else(|| env(ENV_API_ENDPOINT))
            .or(client_cfg.api_endpoint),
        access_token: client_cfg.access_token,
        default_mime_type: processor_cfg.mime_type,
    }
}

/// Pick the MIME type: explicit flag, then a guess from the file
/// extension, then the configured default, then [`DEFAULT_MIME_TYPE`].
pub fn mime_type_for(path: &Path, explicit: Option<&str>, configured: Option<&str>) -> String {
    if let Some(mime) = explicit {
        return mime.to_string();
    }
    if let Some(guess) = mime_guess::from_path(path).first() {
        return guess.essence_str().to_string();
    }
    configured.unwrap_or(DEFAULT_MIME_TYPE).to_string()
}
