use crate::error::ListingError;
use crate::filter::{self, FilterCriteria};
use crate::types::{CountyKey, ListingStore, RawListing};
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedListing {
    pub county: CountyKey,
    pub listing: RawListing,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedListing {
    pub county: CountyKey,
    pub index: usize,
    pub error: ListingError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub counts: BTreeMap<CountyKey, usize>,
    pub matches: Vec<MatchedListing>,
    pub skipped: Vec<SkippedListing>,
}

impl SearchOutcome {
    pub fn total_matches(&self) -> usize {
        self.counts.values().sum()
    }
}

pub fn aggregate(store: &ListingStore, criteria: &FilterCriteria) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();

    for (state, counties) in store {
        for (county, listings) in counties {
            let key = CountyKey::new(state.as_str(), county.as_str());
            let mut count = 0;

            for (index, listing) in listings.iter().enumerate() {
                match filter::matches(listing, criteria) {
                    Ok(true) => {
                        count += 1;
                        outcome.matches.push(MatchedListing {
                            county: key.clone(),
                            listing: listing.clone(),
                            description: describe(listing, &key),
                        });
                    }
                    Ok(false) => {}
                    Err(error) => {
                        tracing::debug!("Skipping listing {} in {}: {}", index, key, error);
                        outcome.skipped.push(SkippedListing {
                            county: key.clone(),
                            index,
                            error,
                        });
                    }
                }
            }

            outcome.counts.insert(key, count);
        }
    }

    outcome
}

/// `"<price> - <beds> - <baths> - <sqft> - <lotsize> - <county> - <state>"`
pub fn describe(listing: &RawListing, key: &CountyKey) -> String {
    let mut line = String::new();
    for field in [
        &listing.price,
        &listing.beds,
        &listing.baths,
        &listing.sqft,
        &listing.lotsize,
    ] {
        match field {
            Some(value) => {
                let _ = write!(line, "{} - ", value);
            }
            None => line.push_str("? - "),
        }
    }
    let _ = write!(line, "{} - {}", key.county, key.state);
    line
}
