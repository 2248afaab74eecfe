//! Admin endpoint configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors loading or interpreting an [`AdminConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read \"{path}\": {detail}")]
    Read {
        /// The file path.
        path: String,
        /// The I/O error text.
        detail: String,
    },
    /// The config file is not valid JSON/YAML for an [`AdminConfig`].
    #[error("failed to parse \"{path}\": {detail}")]
    Parse {
        /// The file path.
        path: String,
        /// The parser's error text.
        detail: String,
    },
    /// Only `http` and `https` are supported.
    #[error("unsupported protocol \"{protocol}\"; expected http or https")]
    InvalidProtocol {
        /// The rejected protocol.
        protocol: String,
    },
}

/// Where the switch backend lives.
///
/// Either a complete `url`, or the pieces it is assembled from:
/// `<protocol|http>://<host|localhost>:<port|80>/<path_prefix>`.
///
/// ```yaml
/// protocol: https
/// host: flags.internal
/// port: 8443
/// path_prefix: /admin/
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// Full base URL. Overrides every other field.
    pub url: Option<String>,
    /// `http` or `https`.
    pub protocol: Option<String>,
    /// Backend host name.
    pub host: Option<String>,
    /// Backend port.
    pub port: Option<u16>,
    /// Path under which the switch endpoints live. Defaults to `/`.
    pub path_prefix: Option<String>,
}

impl AdminConfig {
    /// A config pointing at a complete base URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Load from a JSON (`.json`) or YAML (anything else) file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: display.clone(),
            detail: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed: Result<Self, String> = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|detail| ConfigError::Parse {
            path: display,
            detail,
        })
    }

    /// The base URL, always ending in `/`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidProtocol`] for anything but `http`/`https`.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(with_trailing_slash(url.trim_end_matches('/')));
        }

        let protocol = self.protocol.as_deref().unwrap_or("http");
        if !matches!(protocol, "http" | "https") {
            return Err(ConfigError::InvalidProtocol {
                protocol: protocol.to_owned(),
            });
        }
        let host = self.host.as_deref().unwrap_or("localhost");
        let port = self.port.unwrap_or(80);
        let prefix = self.path_prefix.as_deref().unwrap_or("/").trim_matches('/');

        let base = if prefix.is_empty() {
            format!("{protocol}://{host}:{port}")
        } else {
            format!("{protocol}://{host}:{port}/{prefix}")
        };
        Ok(with_trailing_slash(&base))
    }
}

fn with_trailing_slash(base: &str) -> String {
    format!("{base}/")
}
