use crate::aggregate::SearchOutcome;
use crate::geometry::CountyGeometry;
use crate::states;
use std::collections::HashMap;

/// Case-folded county name with a trailing " County" removed, so that file stems such as
/// `los_angeles_county` line up with shapefile names such as `Los Angeles`.
pub fn county_slug(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ").to_lowercase();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.strip_suffix(" county") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => collapsed,
    }
}

#[derive(Debug, Default)]
pub struct CountLookup {
    by_fips: HashMap<(String, String), usize>,
    by_name: HashMap<String, usize>,
}

impl CountLookup {
    pub fn new(outcome: &SearchOutcome) -> Self {
        let mut lookup = Self::default();
        for (key, count) in &outcome.counts {
            let slug = county_slug(&key.county);
            match states::resolve(&key.state) {
                Some(state) => {
                    *lookup.by_fips.entry((state.fips.to_string(), slug)).or_insert(0) += count;
                }
                None => {
                    tracing::debug!("State key {:?} has no FIPS code, joining by name", key.state);
                    *lookup.by_name.entry(slug).or_insert(0) += count;
                }
            }
        }
        lookup
    }

    pub fn count_for(&self, state_fp: &str, name: &str) -> usize {
        let slug = county_slug(name);
        self.by_fips
            .get(&(state_fp.to_string(), slug.clone()))
            .or_else(|| self.by_name.get(&slug))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct JoinedCounty<'a> {
    pub geometry: &'a CountyGeometry,
    pub state_name: &'static str,
    pub count: usize,
}

pub fn join_counts<'a>(
    outcome: &SearchOutcome,
    counties: &'a [CountyGeometry],
) -> Vec<JoinedCounty<'a>> {
    let lookup = CountLookup::new(outcome);
    counties
        .iter()
        .map(|geometry| JoinedCounty {
            geometry,
            state_name: states::state_name(&geometry.state_fp),
            count: lookup.count_for(&geometry.state_fp, &geometry.name),
        })
        .collect()
}
