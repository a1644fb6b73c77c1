//! Tile themes for the base map

use walkers::{
    HttpTiles, TileId,
    sources::{Attribution, OpenStreetMap, TileSource},
};

/// Base map look, chosen by the user and persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileTheme {
    #[default]
    Dark,
    Light,
    Relief,
}

impl TileTheme {
    pub const ALL: [TileTheme; 3] = [TileTheme::Dark, TileTheme::Light, TileTheme::Relief];

    /// Value stored in preferences
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Relief => "relief",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dark => "Тёмная",
            Self::Light => "Светлая",
            Self::Relief => "Рельеф",
        }
    }

    /// Unknown keys fall back to the dark theme
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "light" => Self::Light,
            "relief" => Self::Relief,
            _ => Self::Dark,
        }
    }

    /// Whether overlays should use light-on-dark colors
    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn attribution(&self) -> Attribution {
        match self {
            Self::Dark => CartoDark.attribution(),
            Self::Light => OpenStreetMap.attribution(),
            Self::Relief => EsriWorldTopo.attribution(),
        }
    }
}

/// CARTO dark basemap
pub struct CartoDark;

impl TileSource for CartoDark {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://a.basemaps.cartocdn.com/dark_all/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        20
    }
}

/// Esri World Topographic map
pub struct EsriWorldTopo;

impl TileSource for EsriWorldTopo {
    fn tile_url(&self, tile_id: TileId) -> String {
        // Esri orders the path as z/y/x
        format!(
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{}/{}/{}",
            tile_id.zoom, tile_id.y, tile_id.x
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "Tiles © Esri",
            url: "https://www.esri.com/",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        19
    }
}

/// One tile cache per theme, so switching back does not refetch
pub struct ThemeTiles {
    dark: HttpTiles,
    light: HttpTiles,
    relief: HttpTiles,
}

impl ThemeTiles {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            dark: HttpTiles::new(CartoDark, ctx.clone()),
            light: HttpTiles::new(OpenStreetMap, ctx.clone()),
            relief: HttpTiles::new(EsriWorldTopo, ctx.clone()),
        }
    }

    pub fn get_mut(&mut self, theme: TileTheme) -> &mut HttpTiles {
        match theme {
            TileTheme::Dark => &mut self.dark,
            TileTheme::Light => &mut self.light,
            TileTheme::Relief => &mut self.relief,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_keys() {
        for theme in TileTheme::ALL {
            assert_eq!(TileTheme::from_key(theme.key()), theme);
        }
        assert_eq!(TileTheme::from_key("sepia"), TileTheme::Dark);
        assert_eq!(TileTheme::from_key(""), TileTheme::Dark);
    }

    #[test]
    fn test_tile_urls() {
        let tile = TileId { x: 3, y: 5, zoom: 4 };
        assert_eq!(
            CartoDark.tile_url(tile),
            "https://a.basemaps.cartocdn.com/dark_all/4/3/5.png"
        );
        assert!(EsriWorldTopo.tile_url(tile).ends_with("/tile/4/5/3"));
    }
}
