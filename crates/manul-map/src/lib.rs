//! Manul Map - Application Library
//!
//! The egui/eframe application around [`manul_map_lib`]: the walkers map
//! widget, the control panels, preference storage and the native and web
//! entry points.

mod app;
mod entrypoints;

pub use app::ManulMapApp;
#[cfg(target_arch = "wasm32")]
pub use entrypoints::WebHandle;
#[cfg(not(target_arch = "wasm32"))]
pub use entrypoints::{StartupError, run_native};
