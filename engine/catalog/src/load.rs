use std::collections::HashMap;
use std::path::Path;

use common::thiserror::Error;

use crate::{BuildingDefinition, Faction, RawCatalog, UnitDefinition};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate key '{0}' across units/buildings/infantry")]
    DuplicateKey(String),
}

enum Entry {
    Unit(UnitDefinition),
    Building(BuildingDefinition),
    Infantry(UnitDefinition),
}

/// Read-only, indexed-by-key and grouped-by-faction catalog of unit/building definitions.
/// Loaded once at startup; failure to load is fatal, per the spec's Asset Catalog contract.
pub struct Registry {
    entries: HashMap<String, Entry>,
    by_faction: HashMap<Faction, Vec<String>>,
}

pub struct RegistryBuilder {
    entries: HashMap<String, Entry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_capacity(256),
        }
    }

    /// Parses `raw` and registers every entry. Fails on the first duplicate key found
    /// across the three sections.
    pub fn load_raw(mut self, raw: RawCatalog) -> Result<Self, CatalogError> {
        for (key, def) in raw.units {
            self.register(key, Entry::Unit(def))?;
        }
        for (key, def) in raw.buildings {
            self.register(key, Entry::Building(def))?;
        }
        for (key, def) in raw.infantry {
            self.register(key, Entry::Infantry(def))?;
        }
        Ok(self)
    }

    fn register(&mut self, key: String, entry: Entry) -> Result<(), CatalogError> {
        if self.entries.contains_key(&key) {
            return Err(CatalogError::DuplicateKey(key));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn build(self) -> Registry {
        let mut by_faction: HashMap<Faction, Vec<String>> = HashMap::new();
        for (key, entry) in &self.entries {
            let faction = match entry {
                Entry::Unit(d) | Entry::Infantry(d) => d.faction,
                Entry::Building(d) => d.faction,
            };
            by_faction.entry(faction).or_default().push(key.clone());
        }

        Registry {
            entries: self.entries,
            by_faction,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Loads and parses the catalog JSON at `path` in one step.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = std::fs::read_to_string(path)?;
        Self::load_str(&bytes)
    }

    pub fn load_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Ok(RegistryBuilder::new().load_raw(raw)?.build())
    }

    pub fn unit(&self, key: &str) -> Option<&UnitDefinition> {
        match self.entries.get(key)? {
            Entry::Unit(d) | Entry::Infantry(d) => Some(d),
            Entry::Building(_) => None,
        }
    }

    pub fn building(&self, key: &str) -> Option<&BuildingDefinition> {
        match self.entries.get(key)? {
            Entry::Building(d) => Some(d),
            _ => None,
        }
    }

    pub fn keys_for_faction(&self, faction: Faction) -> &[String] {
        self.by_faction
            .get(&faction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_indexes_by_faction() {
        let json = r#"{
            "units": {
                "gdi_rifleman": {
                    "faction": "gdi",
                    "sprites": {"sprite_key": "rifleman", "frame_count": 4, "frame_rate": 8.0},
                    "max_hp": 50.0,
                    "speed_cells_per_sec": 2.0,
                    "weapon": {"damage": 5.0, "cooldown_secs": 0.5, "range_cells": 5.0, "kind": "melee"},
                    "acquisition_radius_cells": 8.0
                }
            },
            "buildings": {
                "nod_refinery": {
                    "faction": "nod",
                    "sprites": {"sprite_key": "refinery", "frame_count": 1, "frame_rate": 0.0},
                    "max_hp": 500.0,
                    "footprint": [3, 3],
                    "exit_cell": [1, 4]
                }
            }
        }"#;

        let reg = Registry::load_str(json).unwrap();
        assert_eq!(reg.len(), 2);
        assert!(reg.unit("gdi_rifleman").is_some());
        assert!(reg.building("nod_refinery").is_some());
        assert_eq!(reg.keys_for_faction(Faction::Gdi), &["gdi_rifleman".to_owned()]);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let raw = RawCatalog {
            units: [("x".to_owned(), dummy_unit())].into_iter().collect(),
            infantry: [("x".to_owned(), dummy_unit())].into_iter().collect(),
            ..Default::default()
        };

        assert!(matches!(
            RegistryBuilder::new().load_raw(raw),
            Err(CatalogError::DuplicateKey(_))
        ));
    }

    fn dummy_unit() -> UnitDefinition {
        UnitDefinition {
            faction: Faction::Neutral,
            sprites: crate::SpriteSheet {
                sprite_key: "x".to_owned(),
                frame_count: 1,
                frame_rate: 1.0,
            },
            max_hp: 1.0,
            speed_cells_per_sec: 1.0,
            weapon: None,
            acquisition_radius_cells: 1.0,
        }
    }
}
