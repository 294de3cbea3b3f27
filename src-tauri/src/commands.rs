use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;

use crate::context::SharedAppContext;
use crate::settings::{AppSettings, SettingsChange};
use crate::stats_query::{PatchNotice, StatsQuery};
use crate::version::UpdateStatus;

#[tauri::command]
pub fn resolve_patch_timeline(state: State<'_, SharedAppContext>, query: String) -> PatchNotice {
    state.resolve_patch_timeline(&StatsQuery::from_query_string(&query))
}

#[tauri::command]
pub async fn get_settings(state: State<'_, SharedAppContext>) -> Result<AppSettings, String> {
    Ok(state.settings().await)
}

#[tauri::command]
pub async fn open_settings(state: State<'_, SharedAppContext>) -> Result<AppSettings, String> {
    state.telemetry().settings_opened();
    Ok(state.settings().await)
}

#[tauri::command]
pub async fn update_settings(
    state: State<'_, SharedAppContext>,
    change: SettingsChange,
) -> Result<AppSettings, String> {
    state.update_settings(change).await
}

#[tauri::command]
pub async fn report_newest_version(
    state: State<'_, SharedAppContext>,
    newest_version: Option<String>,
) -> Result<UpdateStatus, String> {
    state.set_newest_version(newest_version).await;
    Ok(state.update_status().await)
}

#[tauri::command]
pub async fn get_update_status(state: State<'_, SharedAppContext>) -> Result<UpdateStatus, String> {
    Ok(state.update_status().await)
}

#[tauri::command]
pub fn check_stream_overlay_port(port: u16) -> bool {
    crate::settings::is_port_free(port)
}

/// Opens a patch note link in the system browser when the user asked for
/// that. Returns `false` when the front end should show it itself.
#[tauri::command]
pub async fn open_patch_link(
    app_handle: AppHandle,
    state: State<'_, SharedAppContext>,
    link: String,
) -> Result<bool, String> {
    let catalog = state.catalog();
    let is_known_link = catalog
        .periods()
        .iter()
        .any(|period| period.reference_link == link);
    if !is_known_link {
        return Err(format!("'{link}' is not a patch note link"));
    }

    if !state.settings().await.open_links_in_browser {
        return Ok(false);
    }

    app_handle
        .opener()
        .open_url(link.as_str(), None::<&str>)
        .map_err(|error| format!("Failed to open patch notes: {error}"))?;

    Ok(true)
}
