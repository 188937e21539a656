//! Seed import
//!
//! Places, menus and tables are owned by the back office. The table service
//! only reads them, so a deployment imports them from a JSON file at startup
//! (`SEED_FILE`). Importing is an upsert: running it twice is harmless, and
//! the live occupancy of an existing table is preserved.

use anyhow::Context;
use serde::Deserialize;
use shared::models::{DiningTable, MenuItem, Place};
use std::path::Path;

use super::PosStorage;

/// Seed file layout
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub tables: Vec<DiningTable>,
}

/// Number of records written by a seed import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub places: usize,
    pub menu_items: usize,
    pub tables: usize,
}

/// Read and import a seed file
pub fn load_seed_file(storage: &PosStorage, path: impl AsRef<Path>) -> anyhow::Result<SeedSummary> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let data: SeedData = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid seed file {}", path.display()))?;
    apply_seed(storage, &data)
}

/// Import seed records into storage
pub fn apply_seed(storage: &PosStorage, data: &SeedData) -> anyhow::Result<SeedSummary> {
    for place in &data.places {
        storage.upsert_place(place)?;
    }
    for item in &data.menu_items {
        storage.upsert_menu_item(item)?;
    }
    for table in &data.tables {
        let merged = match storage.get_table(&table.id)? {
            // Keep live occupancy; refresh the descriptive fields
            Some(existing) => DiningTable {
                status: existing.status,
                current_group_id: existing.current_group_id,
                ..table.clone()
            },
            None => table.clone(),
        };
        storage.upsert_table(&merged)?;
    }

    let summary = SeedSummary {
        places: data.places.len(),
        menu_items: data.menu_items.len(),
        tables: data.tables.len(),
    };
    tracing::info!(
        places = summary.places,
        menu_items = summary.menu_items,
        tables = summary.tables,
        "Seed data imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::TableStatus;

    const SEED: &str = r#"{
        "places": [{ "id": "place-1", "business_id": "biz-1", "name": "Harbor" }],
        "menu_items": [
            { "id": "soup", "place_id": "place-1", "name": "Soup", "price": 5.0 }
        ],
        "tables": [
            { "id": "t-1", "place_id": "place-1", "name": "T1", "seats": 4, "salt": "s1" }
        ]
    }"#;

    #[test]
    fn test_load_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();

        let storage = PosStorage::open_in_memory().unwrap();
        let summary = load_seed_file(&storage, &path).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                places: 1,
                menu_items: 1,
                tables: 1
            }
        );

        let table = storage.get_table("t-1").unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Empty);
        assert!(!table.disabled);
    }

    #[test]
    fn test_reseed_keeps_occupancy() {
        let storage = PosStorage::open_in_memory().unwrap();
        let data: SeedData = serde_json::from_str(SEED).unwrap();
        apply_seed(&storage, &data).unwrap();

        let mut table = storage.get_table("t-1").unwrap().unwrap();
        table.status = TableStatus::Occupied;
        table.current_group_id = Some("g-1".to_string());
        storage.upsert_table(&table).unwrap();

        apply_seed(&storage, &data).unwrap();
        let table = storage.get_table("t-1").unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
        assert_eq!(table.current_group_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let storage = PosStorage::open_in_memory().unwrap();
        assert!(load_seed_file(&storage, "/definitely/not/here.json").is_err());
    }
}
