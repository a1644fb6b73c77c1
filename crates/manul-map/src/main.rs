#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), manul_map::StartupError> {
    manul_map::run_native()
}

// The web build is started from JavaScript through `WebHandle`
#[cfg(target_arch = "wasm32")]
fn main() {}
