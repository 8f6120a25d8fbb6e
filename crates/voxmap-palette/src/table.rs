use std::error::Error;
use std::fs;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::config::PaletteConfig;
use crate::defaults::{self, Entry};

pub type Rgb = [u8; 3];

/// A block type as stored in the world: numeric id plus 4-bit variant data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Material {
    pub id: u16,
    pub variant: u8,
}

impl Material {
    pub const AIR: Material = Material::new(0, 0);

    #[inline]
    pub const fn new(id: u16, variant: u8) -> Self {
        Self { id, variant }
    }

    #[inline]
    pub const fn plain(id: u16) -> Self {
        Self { id, variant: 0 }
    }
}

impl From<(u16, u8)> for Material {
    fn from(v: (u16, u8)) -> Self {
        Material::new(v.0, v.1)
    }
}

/// Maps a material to its unshaded base colour and answers transparency.
///
/// Lookups never fail: unknown ids resolve to [`defaults::UNKNOWN`].
#[derive(Clone, Debug)]
pub struct PixelColorTable {
    entries: HashMap<u16, Entry>,
    overrides: HashMap<(u16, Option<u8>), Rgb>,
    transparent: HashSet<u16>,
}

impl Default for PixelColorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PixelColorTable {
    pub fn builtin() -> Self {
        let mut entries = HashMap::with_capacity(
            defaults::FIXED_ENTRIES.len() + defaults::VARIANT_ENTRIES.len() + 16,
        );
        for &(id, rgb) in defaults::FIXED_ENTRIES {
            entries.insert(id, Entry::Fixed(rgb));
        }
        for &(id, entry) in defaults::VARIANT_ENTRIES {
            entries.insert(id, entry);
        }
        for (i, rgb) in defaults::DYED.iter().enumerate() {
            entries.insert(defaults::SHULKER_FIRST + i as u16, Entry::Fixed(*rgb));
        }
        Self {
            entries,
            overrides: HashMap::new(),
            transparent: defaults::TRANSPARENT_IDS.iter().copied().collect(),
        }
    }

    /// Unshaded colour for `m`. Per-variant overrides win over per-id overrides,
    /// which win over the built-in table.
    pub fn base_color(&self, m: Material) -> Rgb {
        if let Some(rgb) = self.overrides.get(&(m.id, Some(m.variant))) {
            return *rgb;
        }
        if let Some(rgb) = self.overrides.get(&(m.id, None)) {
            return *rgb;
        }
        match self.entries.get(&m.id) {
            Some(entry) => entry.resolve(m.variant),
            None => defaults::UNKNOWN,
        }
    }

    #[inline]
    pub fn is_transparent(&self, id: u16) -> bool {
        self.transparent.contains(&id)
    }

    pub fn set_color(&mut self, id: u16, variant: Option<u8>, rgb: Rgb) {
        self.overrides.insert((id, variant), rgb);
    }

    pub fn set_transparent(&mut self, id: u16, transparent: bool) {
        if transparent {
            self.transparent.insert(id);
        } else {
            self.transparent.remove(&id);
        }
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Built-in table with the overrides from a palette TOML document applied.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: PaletteConfig = toml::from_str(toml_str)?;
        let mut table = Self::builtin();
        cfg.apply(&mut table)?;
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}
