use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_NAME: &str = ".docai.toml";

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub processor: Option<ProcessorConfig>,
    pub client: Option<ClientConfig>,
}

/// Default processor addressing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub project: Option<String>,
    pub location: Option<String>,
    pub processor: Option<String>,
    /// MIME type used when none is given and none can be guessed.
    pub mime_type: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub access_token: Option<String>,
    /// Base URL replacing the regional endpoint (e.g. an emulator).
    pub api_endpoint: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

/// Platform config directory path: `<config_dir>/docai/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docai").join("config.toml"))
}

/// Load config by cascading CWD `.docai.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_NAME));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (base_p, over_p) = (
        base.processor.unwrap_or_default(),
        overlay.processor.unwrap_or_default(),
    );
    let (base_c, over_c) = (
        base.client.unwrap_or_default(),
        overlay.client.unwrap_or_default(),
    );

    ConfigFile {
        processor: Some(ProcessorConfig {
            project: over_p.project.or(base_p.project),
            location: over_p.location.or(base_p.location),
            processor: over_p.processor.or(base_p.processor),
            mime_type: over_p.mime_type.or(base_p.mime_type),
        }),
        client: Some(ClientConfig {
            access_token: over_c.access_token.or(base_c.access_token),
            api_endpoint: over_c.api_endpoint.or(base_c.api_endpoint),
        }),
    }
}
