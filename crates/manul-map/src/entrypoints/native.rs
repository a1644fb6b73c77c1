use crate::ManulMapApp;

/// Failures before the first frame is shown
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to open the window: {0}")]
    Window(#[from] eframe::Error),
}

/// Entry point for desktop platforms
pub fn run_native() -> Result<(), StartupError> {
    // Must come before any logging
    super::logging::setup_logging();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("manul-map-worker")
        .build()?;
    // Background loads are spawned from inside the UI loop
    let _guard = runtime.enter();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting {}", super::APP_TITLE);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title(super::APP_TITLE)
            .with_app_id(super::APP_ID),
        ..Default::default()
    };

    eframe::run_native(
        super::APP_ID,
        native_options,
        Box::new(|cc| Ok(Box::new(ManulMapApp::new(cc)))),
    )?;
    Ok(())
}
