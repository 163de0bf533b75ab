#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod io;
mod ui;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let today = gantt_timeline::calendar::today().date();
    let chart = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => io::load_chart(&path).unwrap_or_else(|err| {
            tracing::error!(path = %path.display(), %err, "could not load chart, showing sample");
            app::sample_chart(today)
        }),
        None => app::sample_chart(today),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Gantt Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Gantt Timeline",
        options,
        Box::new(|cc| Ok(Box::new(app::GanttApp::new(cc, chart)?))),
    )
}
