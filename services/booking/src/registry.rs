//! Restaurants known to the admission controller.

use std::collections::HashMap;
use std::path::Path;

use maitred_id::RestaurantId;
use maitred_seating::{MaitreD, RestaurantLayout};
use serde::Deserialize;

use crate::config::ConfigError;

/// A restaurant and its seating configuration.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub maitre_d: MaitreD,
}

/// Read-only lookup from restaurant id to its [`MaitreD`].
#[derive(Debug, Clone, Default)]
pub struct RestaurantRegistry {
    restaurants: HashMap<RestaurantId, Restaurant>,
}

#[derive(Debug, Deserialize)]
struct RestaurantsFile {
    #[serde(default, rename = "restaurant")]
    restaurants: Vec<RestaurantEntry>,
}

#[derive(Debug, Deserialize)]
struct RestaurantEntry {
    id: RestaurantId,
    name: String,
    #[serde(flatten)]
    layout: RestaurantLayout,
}

impl RestaurantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a restaurant, replacing any previous one with the same id.
    pub fn with_restaurant(
        mut self,
        id: RestaurantId,
        name: impl Into<String>,
        maitre_d: MaitreD,
    ) -> Self {
        self.restaurants.insert(
            id,
            Restaurant {
                id,
                name: name.into(),
                maitre_d,
            },
        );
        self
    }

    /// Parses a `[[restaurant]]` TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let file: RestaurantsFile = toml::from_str(source)?;
        let mut registry = Self::new();
        for entry in file.restaurants {
            if registry.restaurants.contains_key(&entry.id) {
                return Err(ConfigError::DuplicateRestaurant(entry.id));
            }
            let maitre_d =
                MaitreD::try_from(entry.layout).map_err(|source| ConfigError::InvalidRestaurant {
                    id: entry.id,
                    source,
                })?;
            registry = registry.with_restaurant(entry.id, entry.name, maitre_d);
        }
        Ok(registry)
    }

    /// Reads and parses a restaurants file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn get(&self, id: RestaurantId) -> Option<&Restaurant> {
        self.restaurants.get(&id)
    }

    pub fn maitre_d(&self, id: RestaurantId) -> Option<&MaitreD> {
        self.get(id).map(|r| &r.maitre_d)
    }

    /// Restaurants ordered by name.
    pub fn restaurants(&self) -> Vec<&Restaurant> {
        let mut all: Vec<_> = self.restaurants.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitred_seating::MaitreDError;

    const HIPGNOSTA: &str = "rst_01HV6Q1N8YB2W3X4Y5Z6A7B8C9";
    const NONO: &str = "rst_01HV6Q1N8YB2W3X4Y5Z6A7B8CA";

    fn restaurants_toml(second_id: &str, second_tables: &str) -> String {
        format!(
            r#"
[[restaurant]]
id = "{HIPGNOSTA}"
name = "Hipgnosta"
opens_at = "18:00:00"
last_seating = "21:00:00"
seating_duration_minutes = 150
tables = [{{ kind = "communal", seats = 10 }}]

[[restaurant]]
id = "{second_id}"
name = "Nono"
opens_at = "16:30:00"
last_seating = "22:00:00"
seating_duration_minutes = 90
tables = [{second_tables}]
"#
        )
    }

    #[test]
    fn test_from_toml() {
        let source = restaurants_toml(
            NONO,
            r#"{ kind = "standard", seats = 2 }, { kind = "standard", seats = 4 }"#,
        );
        let registry = RestaurantRegistry::from_toml(&source).unwrap();
        assert_eq!(registry.len(), 2);

        let id: RestaurantId = HIPGNOSTA.parse().unwrap();
        let hipgnosta = registry.get(id).unwrap();
        assert_eq!(hipgnosta.name, "Hipgnosta");
        assert_eq!(hipgnosta.maitre_d.total_capacity(), 10);

        let names: Vec<_> = registry.restaurants().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Hipgnosta", "Nono"]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let source = restaurants_toml(HIPGNOSTA, r#"{ kind = "standard", seats = 2 }"#);
        let err = RestaurantRegistry::from_toml(&source).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRestaurant(_)));
    }

    #[test]
    fn test_invalid_layout_names_the_restaurant() {
        let source = restaurants_toml(NONO, "");
        let err = RestaurantRegistry::from_toml(&source).unwrap_err();
        match err {
            ConfigError::InvalidRestaurant { id, source } => {
                assert_eq!(id.to_string(), NONO);
                assert_eq!(source, MaitreDError::NoTables);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_document_is_an_empty_registry() {
        let registry = RestaurantRegistry::from_toml("").unwrap();
        assert!(registry.is_empty());
    }
}
