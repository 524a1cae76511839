use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Other(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub price: Option<FieldValue>,
    #[serde(default)]
    pub beds: Option<FieldValue>,
    #[serde(default)]
    pub baths: Option<FieldValue>,
    #[serde(default)]
    pub sqft: Option<FieldValue>,
    #[serde(default)]
    pub lotsize: Option<FieldValue>,
}

impl RawListing {
    pub fn has_missing_field(&self) -> bool {
        self.price.is_none()
            || self.beds.is_none()
            || self.baths.is_none()
            || self.sqft.is_none()
            || self.lotsize.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listing {
    pub price: f64,
    pub beds: f64,
    pub baths: f64,
    pub sqft: f64,
    pub lotsize: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountyKey {
    pub state: String,
    pub county: String,
}

impl CountyKey {
    pub fn new(state: impl Into<String>, county: impl Into<String>) -> Self {
        Self { state: state.into(), county: county.into() }
    }
}

impl fmt::Display for CountyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.county, self.state)
    }
}

/// state -> county -> listings, in file order within a county.
pub type ListingStore = BTreeMap<String, BTreeMap<String, Vec<RawListing>>>;
