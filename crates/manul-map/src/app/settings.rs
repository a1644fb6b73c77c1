use crate::entrypoints::cli::parse_args;
use clap::Parser;
use manul_map_lib::auth::{FirebaseRestProvider, IdentityProvider};
use manul_map_lib::content::DEFAULT_CONTENT_PATH;
use manul_map_lib::{GeoSources, HttpFetcher, ResourceFetcher};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Manul Map - zoos, reserves and the habitat range of Pallas's cat
pub struct Settings {
    /// Directory the data files are read from (native only)
    #[clap(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL the data files are fetched relative to (defaults to the page URL on web)
    #[clap(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Zoo list, relative to the data source
    #[clap(long, default_value = "data/zoos.json")]
    pub zoos_file: String,

    /// Reserve list, relative to the data source
    #[clap(long, default_value = "data/reserves.json")]
    pub reserves_file: String,

    /// Habitat range polygons, relative to the data source
    #[clap(long, default_value = "data/range.json")]
    pub range_file: String,

    /// Page content document with label overrides
    #[clap(long, default_value = DEFAULT_CONTENT_PATH)]
    pub content: String,

    /// Web API key of the identity provider; accounts are disabled without it
    #[clap(long, env = "MANUL_FIREBASE_API_KEY", hide_env_values = true)]
    pub firebase_api_key: Option<String>,

    /// Ignore previously persisted preferences and start fresh
    #[clap(long)]
    pub ignore_persisted: bool,
}

impl Settings {
    /// Parse settings, falling back to defaults on web
    pub fn from_cli() -> Self {
        match parse_args::<Settings>() {
            Ok(args) => args,
            Err(e) => {
                #[cfg(not(target_arch = "wasm32"))]
                e.exit();
                #[cfg(target_arch = "wasm32")]
                {
                    let user_msg = format!(
                        "Error parsing CLI:\n{}\n
    You should change the GET params, using the cli prefix.\n
    Starting anyway without args.",
                        e
                    );
                    if let Some(window) = web_sys::window() {
                        window.alert_with_message(&user_msg).unwrap_or(());
                    } else {
                        tracing::error!(user_msg);
                    }
                    Settings::parse_from(Vec::<String>::new())
                }
            }
        }
    }

    pub fn sources(&self) -> GeoSources {
        GeoSources {
            zoos: self.zoos_file.clone(),
            reserves: self.reserves_file.clone(),
            range: self.range_file.clone(),
        }
    }

    /// Where the documents come from
    ///
    /// A base URL wins; otherwise native builds read from the data directory
    /// (the working directory by default) and web builds fetch relative to
    /// the page.
    pub fn fetcher(&self) -> manul_map_lib::Result<Arc<dyn ResourceFetcher>> {
        if let Some(base) = &self.base_url {
            return Ok(Arc::new(HttpFetcher::new(base)?));
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let root = self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            Ok(Arc::new(manul_map_lib::FileFetcher::new(root)))
        }
        #[cfg(target_arch = "wasm32")]
        {
            let page = web_sys::window()
                .and_then(|w| w.location().href().ok())
                .unwrap_or_default();
            Ok(Arc::new(HttpFetcher::new(&page)?))
        }
    }

    pub fn identity_provider(&self) -> Option<Arc<dyn IdentityProvider>> {
        let key = self.firebase_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(Arc::new(FirebaseRestProvider::new(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["manul-map"]);
        assert_eq!(settings.sources(), GeoSources::default());
        assert_eq!(settings.content, DEFAULT_CONTENT_PATH);
        assert!(!settings.ignore_persisted);
    }

    #[test]
    fn test_custom_files() {
        let settings = Settings::parse_from([
            "manul-map",
            "--zoos-file",
            "z.json",
            "--base-url",
            "https://example.org/map/",
            "--ignore-persisted",
        ]);
        assert_eq!(settings.sources().zoos, "z.json");
        assert_eq!(settings.sources().range, "data/range.json");
        assert!(settings.ignore_persisted);
        let fetcher = settings.fetcher().unwrap();
        assert_eq!(fetcher.describe("z.json"), "https://example.org/map/z.json");
    }

    #[test]
    fn test_bad_base_url_is_a_load_error() {
        let settings = Settings::parse_from(["manul-map", "--base-url", "::nope"]);
        assert!(settings.fetcher().is_err());
    }

    #[test]
    fn test_identity_provider_needs_key() {
        let settings = Settings::parse_from(["manul-map", "--firebase-api-key", "  "]);
        assert!(settings.identity_provider().is_none());
        let settings = Settings::parse_from(["manul-map", "--firebase-api-key", "abc"]);
        assert!(settings.identity_provider().is_some());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_data_dir_reads_files() {
        let settings = Settings::parse_from(["manul-map", "--data-dir", "/srv/manul"]);
        let fetcher = settings.fetcher().unwrap();
        assert_eq!(
            fetcher.describe("data/zoos.json"),
            std::path::Path::new("/srv/manul").join("data/zoos.json").display().to_string()
        );
    }
}
