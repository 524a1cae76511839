use crate::error::ListingError;
use crate::types::{FieldValue, Listing, RawListing};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterCriteria {
    pub max_price: Option<f64>,
    pub min_beds: Option<f64>,
    pub min_baths: Option<f64>,
    pub min_sqft: Option<f64>,
    pub min_lotsize: Option<f64>,
}

impl FilterCriteria {
    pub fn new(
        max_price: Option<f64>,
        min_beds: Option<f64>,
        min_baths: Option<f64>,
        min_sqft: Option<f64>,
        min_lotsize: Option<f64>,
    ) -> Self {
        Self {
            max_price: active(max_price),
            min_beds: active(min_beds),
            min_baths: active(min_baths),
            min_sqft: active(min_sqft),
            min_lotsize: active(min_lotsize),
        }
    }

    pub fn is_empty(&self) -> bool {
        [self.max_price, self.min_beds, self.min_baths, self.min_sqft, self.min_lotsize]
            .into_iter()
            .all(|t| active(t).is_none())
    }
}

fn active(threshold: Option<f64>) -> Option<f64> {
    threshold.filter(|v| *v != 0.0)
}

fn strip_formatting(text: &str) -> String {
    text.chars().filter(|c| *c != '$' && *c != ',').collect()
}

fn is_blank(text: &str) -> bool {
    strip_formatting(text).trim().is_empty()
}

/// Reduce a formatted string to a number: `"$1,250,000"` -> 1250000, `"3 beds"` -> 3.
pub fn parse_formatted(text: &str) -> Option<f64> {
    let cleaned = strip_formatting(text);
    let token = cleaned.split_whitespace().next()?;
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn normalize_field(
    field: &'static str,
    value: Option<&FieldValue>,
) -> Result<Option<f64>, ListingError> {
    match value {
        None => Ok(None),
        Some(FieldValue::Number(n)) => Ok(Some(*n)),
        Some(FieldValue::Text(text)) if is_blank(text) => Ok(None),
        Some(FieldValue::Text(text)) => parse_formatted(text)
            .map(Some)
            .ok_or_else(|| ListingError::Unparsable {
                field,
                value: text.clone(),
            }),
        Some(FieldValue::Other(_)) => Err(ListingError::NotNumeric { field }),
    }
}

pub fn normalize(raw: &RawListing) -> Result<Option<Listing>, ListingError> {
    let price = normalize_field("price", raw.price.as_ref())?;
    let beds = normalize_field("beds", raw.beds.as_ref())?;
    let baths = normalize_field("baths", raw.baths.as_ref())?;
    let sqft = normalize_field("sqft", raw.sqft.as_ref())?;
    let lotsize = normalize_field("lotsize", raw.lotsize.as_ref())?;

    Ok(match (price, beds, baths, sqft, lotsize) {
        (Some(price), Some(beds), Some(baths), Some(sqft), Some(lotsize)) => Some(Listing {
            price,
            beds,
            baths,
            sqft,
            lotsize,
        }),
        _ => None,
    })
}

pub fn matches(raw: &RawListing, criteria: &FilterCriteria) -> Result<bool, ListingError> {
    if raw.has_missing_field() {
        return Ok(false);
    }
    let Some(listing) = normalize(raw)? else {
        return Ok(false);
    };
    Ok(listing_matches(&listing, criteria))
}

pub fn listing_matches(listing: &Listing, criteria: &FilterCriteria) -> bool {
    let ceiling = |limit: Option<f64>, value: f64| active(limit).map_or(true, |l| value <= l);
    let floor = |limit: Option<f64>, value: f64| active(limit).map_or(true, |l| value >= l);

    ceiling(criteria.max_price, listing.price)
        && floor(criteria.min_beds, listing.beds)
        && floor(criteria.min_baths, listing.baths)
        && floor(criteria.min_sqft, listing.sqft)
        && floor(criteria.min_lotsize, listing.lotsize)
}

pub fn parse_threshold(input: &str) -> Result<f64, String> {
    if is_blank(input) {
        return Ok(0.0);
    }
    match parse_formatted(input) {
        Some(v) if v >= 0.0 => Ok(v),
        Some(_) => Err(format!("threshold must not be negative: {input}")),
        None => Err(format!("not a number: {input}")),
    }
}
