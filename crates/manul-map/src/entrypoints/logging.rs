use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Directives used when `RUST_LOG` is unset
pub(super) fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,eframe::native=warn,egui::context=warn,hyper_util=info,reqwest::connect=info,walkers=info,wgpu_core=warn,wgpu_hal=warn,naga=warn"
    } else {
        "info,eframe::native=warn,egui::context=warn,walkers=warn,wgpu_core=warn,wgpu_hal=warn"
    }
}

/// Install the fmt subscriber; must run before anything logs
pub(super) fn setup_logging() {
    let from_env = EnvFilter::try_from_default_env().ok();
    let defaulted = from_env.is_none();
    let filter = from_env.unwrap_or_else(|| EnvFilter::new(default_directives()));

    let fmt_layer = fmt::layer().with_filter(filter);
    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        return;
    }

    if defaulted {
        tracing::info!("RUST_LOG not set, using default: {}", default_directives());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(EnvFilter::try_new(default_directives()).is_ok());
    }
}
