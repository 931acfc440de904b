//! qrforge runtime configuration handling

use crate::error::{Error, Result};
use crate::qr::DEFAULT_FILENAME;
use crate::style::{Color, ErrorCorrection, StyleParameters};
use crate::upload::ResponseShape;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default per-request upload timeout in seconds
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 20;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrForgeConfig {
    /// Logging configuration
    pub logging: LoggingOptions,
    /// Default rendering style
    pub style: StyleParameters,
    /// Cloud upload configuration
    pub upload: UploadOptions,
    /// Export configuration
    pub export: ExportOptions,
}

/// File names searched in the working directory, in order
const CWD_CANDIDATES: [&str; 3] = ["qrforge.toml", "qrforge.yaml", "qrforge.yml"];
/// File names searched under `$XDG_CONFIG_HOME/qrforge`, in order
const XDG_CANDIDATES: [&str; 2] = ["config.toml", "config.yaml"];

impl QrForgeConfig {
    /// Load configuration, then apply `QRFORGE_*` overrides and validate the style.
    ///
    /// Without an explicit path the working directory is searched first, then
    /// the XDG config directory; with neither present the defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let found = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_file()?,
        };
        let mut config = match found {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.style.validate()?;
        Ok(config)
    }

    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        if let Some(path) = first_existing(&cwd, &CWD_CANDIDATES) {
            return Ok(Some(path));
        }

        Ok(env::var_os("XDG_CONFIG_HOME")
            .map(|xdg| PathBuf::from(xdg).join("qrforge"))
            .and_then(|base| first_existing(&base, &XDG_CANDIDATES)))
    }

    /// Parse a toml or yaml file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        // Reject unknown formats before touching the file
        if !matches!(extension.as_str(), "toml" | "yaml" | "yml") {
            return Err(Error::Config(format!(
                "Unsupported config format '{extension}' for {}, expected toml or yaml",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))?;
        let parsed = if extension == "toml" {
            toml::from_str(&contents).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| Error::Config(format!("Invalid config {}: {e}", path.display())))
    }

    fn apply_env_overrides(&mut self) {
        self.logging.apply_env_overrides();
        self.upload.apply_env_overrides();
        self.export.apply_env_overrides();
        apply_style_env_overrides(&mut self.style);
    }
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn apply_style_env_overrides(style: &mut StyleParameters) {
    if let Ok(size) = env::var("QRFORGE_SIZE") {
        if let Ok(parsed) = size.parse::<u32>() {
            *style = style.with_size(parsed);
        }
    }
    if let Ok(fg) = env::var("QRFORGE_FOREGROUND") {
        match Color::from_hex(&fg) {
            Ok(color) => style.foreground = color,
            Err(err) => tracing::warn!("Ignoring QRFORGE_FOREGROUND: {err}"),
        }
    }
    if let Ok(bg) = env::var("QRFORGE_BACKGROUND") {
        match Color::from_hex(&bg) {
            Ok(color) => style.background = color,
            Err(err) => tracing::warn!("Ignoring QRFORGE_BACKGROUND: {err}"),
        }
    }
    if let Ok(level) = env::var("QRFORGE_LEVEL") {
        if let Ok(parsed) = level.parse::<ErrorCorrection>() {
            style.error_correction = parsed;
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRFORGE_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRFORGE_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRFORGE_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRFORGE_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("QRFORGE_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

/// Cloud upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Optional User-Agent header for upload requests
    pub user_agent: Option<String>,
    /// Replacement service list; the built-in hosts are used when absent
    pub services: Option<Vec<ServiceEntry>>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
            user_agent: Some(concat!("qrforge/", env!("CARGO_PKG_VERSION")).to_string()),
            services: None,
        }
    }
}

impl UploadOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = env::var("QRFORGE_UPLOAD_TIMEOUT") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.timeout_secs = value.max(1);
            }
        }
        if let Ok(agent) = env::var("QRFORGE_USER_AGENT") {
            if agent.trim().is_empty() {
                self.user_agent = None;
            } else {
                self.user_agent = Some(agent);
            }
        }
    }
}

/// One configured upload host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Display name used in logs and results
    pub name: String,
    /// Upload endpoint URL
    pub endpoint: String,
    /// Multipart field name carrying the payload
    #[serde(default = "default_field")]
    pub field: String,
    /// How the service reports the link
    pub response: ResponseShape,
    /// HTTP method, POST when absent
    #[serde(default)]
    pub method: Option<String>,
}

fn default_field() -> String {
    "file".to_string()
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// File name used when saving
    pub filename: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

impl ExportOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("QRFORGE_EXPORT_FILENAME") {
            if !name.trim().is_empty() {
                self.filename = name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = QrForgeConfig::default();
        assert_eq!(config.style, StyleParameters::default());
        assert_eq!(config.upload.timeout_secs, DEFAULT_UPLOAD_TIMEOUT_SECS);
        assert!(config.upload.services.is_none());
        assert_eq!(config.export.filename, "qrcode.png");
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r##"
[style]
size = 384
background = "#fafafa"

[upload]
timeout_secs = 5

[[upload.services]]
name = "local"
endpoint = "http://127.0.0.1:9000/upload"
response = "text"

[export]
filename = "out.png"
"##
        )
        .unwrap();

        let config = QrForgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.style.size, 384);
        assert_eq!(config.style.background, Color::rgb(0xfa, 0xfa, 0xfa));
        assert_eq!(config.upload.timeout_secs, 5);
        let services = config.upload.services.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].field, "file");
        assert_eq!(services[0].response, ResponseShape::Text);
        assert_eq!(config.export.filename, "out.png");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "logging:\n  level: debug\nstyle:\n  error_correction: Q\n"
        )
        .unwrap();

        let config = QrForgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.style.error_correction, ErrorCorrection::Q);
    }

    #[test]
    fn test_first_existing_respects_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(first_existing(dir.path(), &CWD_CANDIDATES).is_none());

        std::fs::write(dir.path().join("qrforge.yml"), "{}").unwrap();
        std::fs::write(dir.path().join("qrforge.toml"), "").unwrap();
        assert_eq!(
            first_existing(dir.path(), &CWD_CANDIDATES).unwrap(),
            dir.path().join("qrforge.toml")
        );
    }

    #[test]
    fn test_explicit_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            QrForgeConfig::load(Some(&missing)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            QrForgeConfig::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
