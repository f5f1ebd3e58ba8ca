use once_cell::sync::Lazy;
use regex::Regex;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z]+$").expect("name pattern is valid")
});

static ENTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:[a-zA-Z]+|#[0-9]+|#x[0-9a-fA-F]+);$").expect("entity pattern is valid")
});

/// Tag and attribute names: one or more ASCII letters, nothing else.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Named (`&nbsp;`), decimal (`&#38;`) or hexadecimal (`&#x26AB;`) character reference.
pub fn is_valid_entity(value: &str) -> bool {
    ENTITY_PATTERN.is_match(value)
}
