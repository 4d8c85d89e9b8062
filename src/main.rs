#![cfg_attr(feature = "windows_gui", windows_subsystem = "windows")]

use asset_overlay::common::config_files::app_config_dir;
use asset_overlay::gui::AssetManagerApp;
use asset_overlay::logging;
use asset_overlay::settings::{Settings, SETTINGS_FILE};

use eframe::egui;

fn main() -> anyhow::Result<()> {
    let config_dir = app_config_dir();
    std::fs::create_dir_all(&config_dir)?;
    let settings_path = config_dir.join(SETTINGS_FILE);
    let settings = Settings::load(&settings_path)?;
    logging::init(
        settings.debug_logging,
        settings.log_path(&settings_path).as_deref(),
    );
    tracing::info!(config = %config_dir.display(), "starting asset manager");

    let (w, h) = settings.window_size;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Asset Manager")
            .with_inner_size([w as f32, h as f32])
            .with_min_inner_size([320.0, 300.0])
            .with_taskbar(false),
        ..Default::default()
    };

    eframe::run_native(
        "Asset Manager",
        native_options,
        Box::new(move |_cc| Box::new(AssetManagerApp::new(&settings, &settings_path))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run GUI: {e}"))
}
