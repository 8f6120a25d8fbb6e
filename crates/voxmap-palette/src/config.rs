use std::error::Error;

use hashbrown::HashMap;
use serde::Deserialize;

use crate::table::{PixelColorTable, Rgb};

#[derive(Deserialize, Default)]
pub struct PaletteConfig {
    #[serde(default)]
    pub colors: HashMap<String, ColorEntry>,
    /// Extra ids to look through when sampling a column.
    #[serde(default)]
    pub transparent: Vec<u16>,
    /// Ids removed from the transparent set.
    #[serde(default)]
    pub opaque: Vec<u16>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum ColorEntry {
    // "35:14" = [200, 55, 55]
    Rgb(Rgb),
    // "2" = "#46c828"
    Hex(String),
}

impl ColorEntry {
    fn to_rgb(&self) -> Result<Rgb, Box<dyn Error>> {
        match self {
            ColorEntry::Rgb(rgb) => Ok(*rgb),
            ColorEntry::Hex(s) => parse_hex(s),
        }
    }
}

/// Parses `"id"` or `"id:variant"`.
pub fn parse_key(key: &str) -> Result<(u16, Option<u8>), Box<dyn Error>> {
    match key.split_once(':') {
        Some((id, variant)) => {
            let id: u16 = id.trim().parse()?;
            let variant: u8 = variant.trim().parse()?;
            if variant > 15 {
                return Err(format!("variant out of range in '{key}'").into());
            }
            Ok((id, Some(variant)))
        }
        None => Ok((key.trim().parse()?, None)),
    }
}

fn parse_hex(s: &str) -> Result<Rgb, Box<dyn Error>> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(format!("expected #rrggbb, got '{s}'").into());
    }
    let v = u32::from_str_radix(hex, 16)?;
    Ok([(v >> 16) as u8, (v >> 8) as u8, v as u8])
}

impl PaletteConfig {
    pub fn apply(self, table: &mut PixelColorTable) -> Result<(), Box<dyn Error>> {
        let mut entries: Vec<(String, ColorEntry)> = self.colors.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, entry) in entries {
            let (id, variant) = parse_key(&key)?;
            table.set_color(id, variant, entry.to_rgb()?);
        }
        for id in self.transparent {
            table.set_transparent(id, true);
        }
        for id in self.opaque {
            table.set_transparent(id, false);
        }
        log::debug!(target: "palette", "applied {} colour overrides", table.override_count());
        Ok(())
    }
}
