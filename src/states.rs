//! US state lookup by FIPS code, name, or postal abbreviation.

pub const UNKNOWN_STATE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub fips: &'static str,
    pub name: &'static str,
    pub abbr: &'static str,
}

const fn st(fips: &'static str, name: &'static str, abbr: &'static str) -> State {
    State { fips, name, abbr }
}

pub const STATES: &[State] = &[
    st("01", "Alabama", "AL"),
    st("02", "Alaska", "AK"),
    st("04", "Arizona", "AZ"),
    st("05", "Arkansas", "AR"),
    st("06", "California", "CA"),
    st("08", "Colorado", "CO"),
    st("09", "Connecticut", "CT"),
    st("10", "Delaware", "DE"),
    st("11", "District of Columbia", "DC"),
    st("12", "Florida", "FL"),
    st("13", "Georgia", "GA"),
    st("15", "Hawaii", "HI"),
    st("16", "Idaho", "ID"),
    st("17", "Illinois", "IL"),
    st("18", "Indiana", "IN"),
    st("19", "Iowa", "IA"),
    st("20", "Kansas", "KS"),
    st("21", "Kentucky", "KY"),
    st("22", "Louisiana", "LA"),
    st("23", "Maine", "ME"),
    st("24", "Maryland", "MD"),
    st("25", "Massachusetts", "MA"),
    st("26", "Michigan", "MI"),
    st("27", "Minnesota", "MN"),
    st("28", "Mississippi", "MS"),
    st("29", "Missouri", "MO"),
    st("30", "Montana", "MT"),
    st("31", "Nebraska", "NE"),
    st("32", "Nevada", "NV"),
    st("33", "New Hampshire", "NH"),
    st("34", "New Jersey", "NJ"),
    st("35", "New Mexico", "NM"),
    st("36", "New York", "NY"),
    st("37", "North Carolina", "NC"),
    st("38", "North Dakota", "ND"),
    st("39", "Ohio", "OH"),
    st("40", "Oklahoma", "OK"),
    st("41", "Oregon", "OR"),
    st("42", "Pennsylvania", "PA"),
    st("44", "Rhode Island", "RI"),
    st("45", "South Carolina", "SC"),
    st("46", "South Dakota", "SD"),
    st("47", "Tennessee", "TN"),
    st("48", "Texas", "TX"),
    st("49", "Utah", "UT"),
    st("50", "Vermont", "VT"),
    st("51", "Virginia", "VA"),
    st("53", "Washington", "WA"),
    st("54", "West Virginia", "WV"),
    st("55", "Wisconsin", "WI"),
    st("56", "Wyoming", "WY"),
];

pub fn by_fips(fips: &str) -> Option<&'static State> {
    STATES.iter().find(|s| s.fips == fips)
}

pub fn state_name(fips: &str) -> &'static str {
    by_fips(fips).map(|s| s.name).unwrap_or(UNKNOWN_STATE)
}

pub fn resolve(key: &str) -> Option<&'static State> {
    let key = key.trim();
    if key.chars().all(|c| c.is_ascii_digit()) && !key.is_empty() {
        return by_fips(&format!("{:0>2}", key));
    }
    let folded = key.replace(['_', '-'], " ");
    STATES.iter().find(|s| {
        s.name.eq_ignore_ascii_case(&folded) || s.abbr.eq_ignore_ascii_case(key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fips_is_sentinel() {
        assert_eq!(state_name("06"), "California");
        assert_eq!(state_name("72"), UNKNOWN_STATE);
        assert_eq!(state_name(""), UNKNOWN_STATE);
    }

    #[test]
    fn resolves_every_key_form() {
        let ca = by_fips("06");
        assert_eq!(resolve("California"), ca);
        assert_eq!(resolve("california"), ca);
        assert_eq!(resolve("CA"), ca);
        assert_eq!(resolve("06"), ca);
        assert_eq!(resolve("6"), ca);
        assert_eq!(resolve("new_york").map(|s| s.fips), Some("36"));
        assert_eq!(resolve("Atlantis"), None);
    }
}
