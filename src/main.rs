// src/main.rs
mod app;

use anyhow::Context;
use eframe::egui;

use asana_tracker::config::{AppSettings, SETTINGS_FILE};
use asana_tracker::profile::ProfileRegistry;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings = AppSettings::load_or_default(SETTINGS_FILE);

    let mut registry = ProfileRegistry::with_builtins();
    if let Some(path) = &settings.profiles_path {
        // Profile misconfiguration is fatal at startup
        registry
            .load_file(path)
            .with_context(|| format!("loading pose profiles from {}", path.display()))?;
    }
    tracing::info!(profiles = registry.len(), "pose profiles ready");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Asana Tracker",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(create_visuals());
            Box::new(app::AsanaTrackerApp::new(cc, registry, settings))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {}", e))?;

    Ok(())
}

fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(45, 45, 52);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 130, 240);

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);

    visuals.window_rounding = egui::Rounding::same(12.0);

    visuals
}
