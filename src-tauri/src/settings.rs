use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};

pub(crate) const SETTINGS_FILE_NAME: &str = "settings.json";
const DATA_DIRECTORY_NAME: &str = "coh2stats";
const DEFAULT_UPDATE_INTERVAL_SECONDS: u32 = 5;
const DEFAULT_STREAM_OVERLAY_PORT: u16 = 47824;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOverlayPosition {
    #[default]
    Top,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub update_interval_seconds: u32,
    pub run_in_tray: bool,
    pub open_links_in_browser: bool,
    pub game_notification: bool,
    pub stream_overlay: bool,
    pub stream_overlay_port: u16,
    pub stream_overlay_position: StreamOverlayPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_location: Option<String>,
    pub app_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_newest_version: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            update_interval_seconds: DEFAULT_UPDATE_INTERVAL_SECONDS,
            run_in_tray: true,
            open_links_in_browser: false,
            game_notification: true,
            stream_overlay: false,
            stream_overlay_port: DEFAULT_STREAM_OVERLAY_PORT,
            stream_overlay_position: StreamOverlayPosition::Top,
            log_file_location: None,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            app_newest_version: None,
        }
    }
}

/// A single edit made from the settings window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "setting", content = "value", rename_all = "camelCase")]
pub enum SettingsChange {
    UpdateInterval(u32),
    RunInTray(bool),
    OpenLinksInBrowser(bool),
    GameNotification(bool),
    StreamOverlay(bool),
    StreamOverlayPort(u16),
    StreamOverlayPosition(StreamOverlayPosition),
    LogFileLocation(Option<String>),
}

impl SettingsChange {
    pub fn key(&self) -> &'static str {
        match self {
            SettingsChange::UpdateInterval(_) => "updateInterval",
            SettingsChange::RunInTray(_) => "runInTray",
            SettingsChange::OpenLinksInBrowser(_) => "openInBrowser",
            SettingsChange::GameNotification(_) => "setGameNotifications",
            SettingsChange::StreamOverlay(_) => "streamerMode",
            SettingsChange::StreamOverlayPort(_) => "streamerModePort",
            SettingsChange::StreamOverlayPosition(_) => "streamViewLayoutChange",
            SettingsChange::LogFileLocation(_) => "logFileLocation",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("File check interval must be at least one second")]
    InvalidUpdateInterval,
    #[error("Stream overlay port must be between 1 and 65535")]
    InvalidStreamOverlayPort,
    #[error("Failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to write settings '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppSettings {
    pub fn apply(&mut self, change: SettingsChange) -> Result<(), SettingsError> {
        match change {
            SettingsChange::UpdateInterval(seconds) => {
                if seconds == 0 {
                    return Err(SettingsError::InvalidUpdateInterval);
                }
                self.update_interval_seconds = seconds;
            }
            SettingsChange::RunInTray(enabled) => self.run_in_tray = enabled,
            SettingsChange::OpenLinksInBrowser(enabled) => self.open_links_in_browser = enabled,
            SettingsChange::GameNotification(enabled) => self.game_notification = enabled,
            SettingsChange::StreamOverlay(enabled) => self.stream_overlay = enabled,
            SettingsChange::StreamOverlayPort(port) => {
                if port == 0 {
                    return Err(SettingsError::InvalidStreamOverlayPort);
                }
                self.stream_overlay_port = port;
            }
            SettingsChange::StreamOverlayPosition(position) => {
                self.stream_overlay_position = position;
            }
            SettingsChange::LogFileLocation(location) => {
                self.log_file_location = location
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty());
            }
        }

        Ok(())
    }

    pub fn log_file_found(&self) -> bool {
        self.log_file_location
            .as_deref()
            .map_or(false, |location| Path::new(location).is_file())
    }

    pub fn stream_overlay_url(&self) -> String {
        format!("http://localhost:{}", self.stream_overlay_port)
    }
}

/// Port 0 would let the OS pick a random port, so it never counts as free.
pub fn is_port_free(port: u16) -> bool {
    if port == 0 {
        return false;
    }

    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

pub fn default_data_directory() -> Result<PathBuf, String> {
    let base_directory = std::env::var("APPDATA")
        .or_else(|_| std::env::var("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| Path::new(&home).join(".config")))
        .map_err(|_| "Unable to determine settings directory")?;

    Ok(base_directory.join(DATA_DIRECTORY_NAME))
}

pub fn read_settings(path: &Path) -> Result<Option<AppSettings>, SettingsError> {
    let raw_json = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let settings =
        serde_json::from_str::<AppSettings>(&raw_json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(settings))
}

/// Loads persisted settings, or defaults when nothing was saved yet. The
/// version field always reflects the running build.
pub fn load_settings_or_default(path: &Path) -> AppSettings {
    let mut settings = match read_settings(path) {
        Ok(Some(settings)) => settings,
        Ok(None) => AppSettings::default(),
        Err(error) => {
            tracing::warn!(
                settings_path = %path.display(),
                settings_error = %error,
                "Failed to load settings, using defaults"
            );
            AppSettings::default()
        }
    };

    settings.app_version = env!("CARGO_PKG_VERSION").to_string();
    settings
}

pub fn write_settings(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent_directory) = path.parent() {
        std::fs::create_dir_all(parent_directory).map_err(|source| SettingsError::Write {
            path: parent_directory.to_path_buf(),
            source,
        })?;
    }

    let serialized = serde_json::to_string_pretty(settings).map_err(SettingsError::Serialize)?;
    let temp_path = temporary_settings_path(path);

    std::fs::write(&temp_path, serialized).map_err(|source| SettingsError::Write {
        path: temp_path.clone(),
        source,
    })?;

    if let Err(source) = std::fs::rename(&temp_path, path) {
        if let Err(cleanup_error) = std::fs::remove_file(&temp_path) {
            tracing::warn!(
                temp_path = %temp_path.display(),
                cleanup_error = %cleanup_error,
                "Failed to remove temporary settings file"
            );
        }

        return Err(SettingsError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn temporary_settings_path(path: &Path) -> PathBuf {
    let Some(file_name) = path.file_name().and_then(|value| value.to_str()) else {
        return path.with_extension("json.tmp");
    };

    path.with_file_name(format!("{file_name}.tmp"))
}
