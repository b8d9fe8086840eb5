#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 760.0])
            .with_min_inner_size([320.0, 480.0])
            .with_title("Digital Signature"),
        ..Default::default()
    };
    eframe::run_native(
        "signature_pad",
        native_options,
        Box::new(|cc| Ok(Box::new(signature_pad::App::new(cc)))),
    )
}
