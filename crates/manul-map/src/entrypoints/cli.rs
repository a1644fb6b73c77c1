//! Command line and query-string configuration
//!
//! On web there is no command line: query parameters prefixed with `cli`
//! become arguments (`?clibase-url=https://…` → `--base-url https://…`) and
//! parameters prefixed with `env` become environment variables
//! (`?envLOG_LEVEL=debug`).

use clap::Parser;
#[cfg(target_arch = "wasm32")]
use std::collections::HashMap;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static ENV_MAP: std::cell::RefCell<HashMap<String, String>> = std::cell::RefCell::new(HashMap::new());
}

/// Arguments and environment entries carried by a query string
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Split a query string (without the leading `?`) into CLI arguments and
/// environment entries
pub fn split_query(query: &str) -> QueryConfig {
    let mut config = QueryConfig::default();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if let Some(arg) = key.strip_prefix("cli") {
            if !arg.is_empty() {
                config.args.push(format!("--{arg}"));
            }
            if !value.is_empty() {
                config.args.push(value.to_string());
            }
        } else if let Some(name) = key.strip_prefix("env")
            && !name.is_empty()
        {
            config.env.push((name.to_string(), value.to_string()));
        }
    }
    config
}

#[cfg(target_arch = "wasm32")]
fn location_query() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .map(|s| s.trim_start_matches('?').to_string())
        .unwrap_or_default()
}

/// Read an environment variable, parsed to the desired type
pub fn get_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    #[cfg(target_arch = "wasm32")]
    {
        ENV_MAP.with(|map| map.borrow().get(key).and_then(|s| s.parse().ok()))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var(key).ok().and_then(|s| s.parse().ok())
    }
}

/// Load `env`-prefixed query parameters so [`get_env`] sees them
///
/// Does nothing on native, where the process environment is used.
pub fn parse_env() {
    #[cfg(target_arch = "wasm32")]
    {
        let config = split_query(&location_query());
        ENV_MAP.with(|map| map.borrow_mut().extend(config.env));
    }
}

/// Parse from the command line on native and from GET parameters on web
pub fn parse_args<T: Parser>() -> Result<T, clap::Error> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        T::try_parse()
    }
    #[cfg(target_arch = "wasm32")]
    {
        let config = split_query(&location_query());
        ENV_MAP.with(|map| map.borrow_mut().extend(config.env));
        let args = std::iter::once(super::APP_ID.to_string()).chain(config.args);
        T::try_parse_from(args)
    }
}
