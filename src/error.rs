#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingError {
    #[error("field `{field}` has unparsable value {value:?}")]
    Unparsable {
        field: &'static str,
        value: String,
    },

    #[error("field `{field}` is not numeric")]
    NotNumeric { field: &'static str },
}
