use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::patches::PatchCatalog;
use crate::settings::{AppSettings, SettingsChange};
use crate::stats_query::{PatchNotice, StatsQuery};
use crate::telemetry::TelemetryContext;
use crate::version::UpdateStatus;

/// State built once at startup and shared by every command handler.
pub struct AppContext {
    catalog: Arc<PatchCatalog>,
    settings: RwLock<AppSettings>,
    settings_path: PathBuf,
    telemetry: TelemetryContext,
}

pub type SharedAppContext = Arc<AppContext>;

impl AppContext {
    pub fn new(
        catalog: PatchCatalog,
        settings: AppSettings,
        settings_path: PathBuf,
        telemetry: TelemetryContext,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            settings: RwLock::new(settings),
            settings_path,
            telemetry,
        }
    }

    /// Loads settings and the patch catalog from `data_directory`.
    pub fn load(data_directory: &Path, window: &str) -> Result<Self, String> {
        Self::load_from_paths(
            data_directory.join(crate::settings::SETTINGS_FILE_NAME),
            &crate::patches::resolve_catalog_path(data_directory),
            window,
        )
    }

    pub fn load_from_paths(
        settings_path: PathBuf,
        catalog_path: &Path,
        window: &str,
    ) -> Result<Self, String> {
        let settings = crate::settings::load_settings_or_default(&settings_path);
        let catalog =
            PatchCatalog::load_from_path(catalog_path).map_err(|error| error.to_string())?;

        Ok(Self::new(
            catalog,
            settings,
            settings_path,
            TelemetryContext::new(window),
        ))
    }

    pub fn catalog(&self) -> Arc<PatchCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn telemetry(&self) -> &TelemetryContext {
        &self.telemetry
    }

    pub fn resolve_patch_timeline(&self, query: &StatsQuery) -> PatchNotice {
        let notice = query.patch_notice(&self.catalog);
        self.telemetry.patch_timeline_viewed(notice.entries.len());
        notice
    }

    pub async fn settings(&self) -> AppSettings {
        self.settings.read().await.clone()
    }

    /// Applies one change, persists the result and returns the new settings.
    /// Nothing is kept in memory when the change is invalid or cannot be
    /// saved.
    pub async fn update_settings(&self, change: SettingsChange) -> Result<AppSettings, String> {
        let setting_key = change.key();
        let mut settings = self.settings.write().await;

        let mut updated = settings.clone();
        updated.apply(change).map_err(|error| error.to_string())?;

        let settings_path = self.settings_path.clone();
        let to_persist = updated.clone();
        tokio::task::spawn_blocking(move || {
            crate::settings::write_settings(&settings_path, &to_persist)
        })
        .await
        .map_err(|error| format!("Settings writer task failed: {error}"))?
        .map_err(|error| error.to_string())?;

        *settings = updated.clone();
        drop(settings);

        tracing::info!(
            setting = setting_key,
            settings_path = %self.settings_path.display(),
            "Saved settings"
        );
        self.telemetry.settings_changed(setting_key);

        Ok(updated)
    }

    pub async fn set_newest_version(&self, newest_version: Option<String>) {
        self.settings.write().await.app_newest_version = newest_version;
    }

    pub async fn update_status(&self) -> UpdateStatus {
        let settings = self.settings.read().await;
        crate::version::update_status(
            &settings.app_version,
            settings.app_newest_version.as_deref(),
        )
    }
}
