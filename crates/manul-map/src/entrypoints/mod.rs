//! Platform entry points
//!
//! Native builds run the app in a window on top of a multi-threaded tokio
//! runtime; web builds expose a [`WebHandle`] that JavaScript starts on a
//! canvas. Both share the CLI/query-string parsing in [`cli`] and the task
//! spawner in [`async_runtime`].

pub mod async_runtime;
// Query-string helpers are only reached from the web build
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub mod cli;

#[cfg(not(target_arch = "wasm32"))]
mod logging;
#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::{StartupError, run_native};
#[cfg(target_arch = "wasm32")]
pub use web::WebHandle;

/// Application id, used for the window and the storage directory
pub const APP_ID: &str = "manul-map";

/// Window title
pub const APP_TITLE: &str = "Карта манула";
