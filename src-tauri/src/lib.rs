#[cfg(feature = "desktop")]
mod commands;
pub mod context;
pub mod logging;
pub mod patches;
pub mod settings;
pub mod stats_query;
pub mod telemetry;
pub mod version;

pub use context::{AppContext, SharedAppContext};
pub use patches::{PatchCatalog, ReleasePeriod, TimeSelection, TimelineEntry};
pub use stats_query::{PatchNotice, StatsQuery};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;

    logging::init_logging();

    let app_context = match settings::default_data_directory()
        .and_then(|data_directory| AppContext::load(&data_directory, "main"))
    {
        Ok(app_context) => app_context,
        Err(error) => {
            tracing::error!("Failed to load app state: {error}");
            return;
        }
    };
    app_context.telemetry().app_opened();
    let app_context: SharedAppContext = Arc::new(app_context);

    if let Err(error) = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(app_context)
        .invoke_handler(tauri::generate_handler![
            commands::resolve_patch_timeline,
            commands::get_settings,
            commands::open_settings,
            commands::update_settings,
            commands::report_newest_version,
            commands::get_update_status,
            commands::check_stream_overlay_port,
            commands::open_patch_link,
        ])
        .run(tauri::generate_context!())
    {
        tracing::error!("Error while running tauri application: {error}");
    }
}
