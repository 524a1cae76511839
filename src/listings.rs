//! Loader adapters for the two listing layouts. Both produce the same [`ListingStore`].

use crate::types::{ListingStore, RawListing};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

pub fn load_listings(path: &Path) -> Result<ListingStore> {
    let store = if path.is_dir() {
        load_county_dir(path)?
    } else if path.is_file() {
        load_bulk(path)?
    } else {
        return Err(anyhow!("Listing data not found: {:?}", path));
    };

    let total: usize = store.values().flat_map(|c| c.values()).map(Vec::len).sum();
    tracing::info!(
        "Loaded {} listings across {} states from {:?}",
        total,
        store.len(),
        path
    );
    Ok(store)
}

pub fn load_bulk(path: &Path) -> Result<ListingStore> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open listings file: {:?}", path))?;
    let store: ListingStore = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse listings JSON: {:?}", path))?;
    Ok(store)
}

pub fn load_county_dir(root: &Path) -> Result<ListingStore> {
    let mut store = ListingStore::new();

    let state_dirs = fs::read_dir(root)
        .with_context(|| format!("Failed to read listings directory: {:?}", root))?;

    for entry in state_dirs {
        let state_path = entry?.path();
        if !state_path.is_dir() {
            continue;
        }
        let Some(state) = file_name(&state_path) else { continue };

        let mut counties = BTreeMap::new();
        for county_entry in fs::read_dir(&state_path)
            .with_context(|| format!("Failed to read state directory: {:?}", state_path))?
        {
            let county_path = county_entry?.path();
            let is_json = county_path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if !county_path.is_file() || !is_json {
                continue;
            }
            let Some(county) = county_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let file = File::open(&county_path)
                .with_context(|| format!("Failed to open county file: {:?}", county_path))?;
            let listings: Vec<RawListing> = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse county file: {:?}", county_path))?;
            counties.insert(county.to_string(), listings);
        }

        store.insert(state, counties);
    }

    Ok(store)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}
