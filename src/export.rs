use crate::aggregate::MatchedListing;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    state: &'a str,
    county: &'a str,
    price: String,
    beds: String,
    baths: String,
    sqft: String,
    lotsize: String,
}

fn cell(value: &Option<crate::types::FieldValue>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub fn write_matches<W: Write>(writer: W, matches: &[MatchedListing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for m in matches {
        wtr.serialize(MatchRow {
            state: &m.county.state,
            county: &m.county.county,
            price: cell(&m.listing.price),
            beds: cell(&m.listing.beds),
            baths: cell(&m.listing.baths),
            sqft: cell(&m.listing.sqft),
            lotsize: cell(&m.listing.lotsize),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_matches(path: &Path, matches: &[MatchedListing]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {:?}", path))?;
    write_matches(file, matches)
        .with_context(|| format!("Failed to write matches to {:?}", path))?;
    tracing::info!("Exported {} matches to {:?}", matches.len(), path);
    Ok(())
}
