//! Font configuration for the raster canvas.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Which fonts a [`Canvas2dContext`](crate::Canvas2dContext) can draw with.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Raw font files (TTF/OTF) to register. Arc-wrapped for cheap cloning.
    pub custom_fonts: Vec<Arc<Vec<u8>>>,
    /// Concrete families to use for the generic CSS family names.
    pub generic_families: GenericFamilyMap,
    /// Whether to load system fonts (default: true).
    pub load_system_fonts: bool,
    /// Additional directories to scan for font files.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            custom_fonts: Vec::new(),
            generic_families: GenericFamilyMap::defaults(),
            load_system_fonts: true,
            font_dirs: Vec::new(),
        }
    }
}

impl FontConfig {
    /// No system fonts, only what is added explicitly.
    pub fn empty() -> Self {
        Self {
            load_system_fonts: false,
            ..Self::default()
        }
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    pub fn with_font_data(mut self, data: Vec<u8>) -> Self {
        self.custom_fonts.push(Arc::new(data));
        self
    }
}

/// Generic CSS family name to concrete family names, in priority order.
#[derive(Clone, Debug, Default)]
pub struct GenericFamilyMap {
    pub serif: Vec<String>,
    pub sans_serif: Vec<String>,
    pub monospace: Vec<String>,
    pub cursive: Vec<String>,
    pub fantasy: Vec<String>,
}

impl GenericFamilyMap {
    /// Preference lists close to what desktop browsers pick.
    pub fn defaults() -> Self {
        let names = |list: &[&str]| list.iter().map(|name| name.to_string()).collect();
        Self {
            sans_serif: names(&["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans"]),
            monospace: names(&[
                "Courier New",
                "Courier",
                "Liberation Mono",
                "DejaVu Sans Mono",
            ]),
            serif: names(&[
                "Times New Roman",
                "Times",
                "Liberation Serif",
                "DejaVu Serif",
            ]),
            cursive: names(&["Comic Sans MS", "Apple Chancery"]),
            fantasy: names(&["Impact", "Papyrus"]),
        }
    }
}

/// Builds the font database described by `config`.
///
/// Scanning system fonts is slow; build the database once and hand it to
/// [`Canvas2dContextBuilder::font_db`](crate::Canvas2dContextBuilder::font_db)
/// when creating many canvases.
pub fn font_config_to_fontdb(config: &FontConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();

    if config.load_system_fonts {
        db.load_system_fonts();
    }
    for dir in &config.font_dirs {
        log::debug!(target: "canvas", "loading fonts from {}", dir.display());
        db.load_fonts_dir(dir);
    }
    for data in &config.custom_fonts {
        db.load_font_data(Vec::from(data.as_slice()));
    }

    apply_generic_families(&mut db, &config.generic_families);
    log::debug!(target: "canvas", "font database has {} faces", db.len());
    db
}

/// Points each generic family at the first preference that is installed.
fn apply_generic_families(db: &mut fontdb::Database, families: &GenericFamilyMap) {
    let available: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
        .collect();
    let pick = |list: &[String]| list.iter().find(|name| available.contains(*name)).cloned();

    if let Some(family) = pick(&families.sans_serif) {
        db.set_sans_serif_family(family);
    }
    if let Some(family) = pick(&families.serif) {
        db.set_serif_family(family);
    }
    if let Some(family) = pick(&families.monospace) {
        db.set_monospace_family(family);
    }
    if let Some(family) = pick(&families.cursive) {
        db.set_cursive_family(family);
    }
    if let Some(family) = pick(&families.fantasy) {
        db.set_fantasy_family(family);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font_config() {
        let config = FontConfig::default();
        assert!(config.custom_fonts.is_empty());
        assert!(config.load_system_fonts);
        assert!(config.font_dirs.is_empty());
        assert_eq!(config.generic_families.sans_serif[0], "Arial");
    }

    #[test]
    fn test_empty_config_has_no_faces() {
        let db = font_config_to_fontdb(&FontConfig::empty());
        assert_eq!(db.faces().count(), 0);
    }

    #[test]
    fn test_missing_font_dir_is_ignored() {
        let config = FontConfig::empty().with_font_dir("/no/such/fonts");
        let db = font_config_to_fontdb(&config);
        assert_eq!(db.len(), 0);
    }

    #[test]
    fn test_font_config_clone_shares_data() {
        let config = FontConfig::empty().with_font_data(vec![0u8; 1000]);
        let cloned = config.clone();
        assert!(Arc::ptr_eq(&config.custom_fonts[0], &cloned.custom_fonts[0]));
    }
}
