//! Query string decoding

use url::form_urlencoded;

use crate::QueryParams;

/// Decode a raw query string into a map.
///
/// Accepts the string with or without its leading `?`. Decoding follows
/// `application/x-www-form-urlencoded` rules (`+` is a space, percent
/// escapes are decoded). When a key repeats, the last value wins.
pub fn parse_query(raw: &str) -> QueryParams {
    let raw = raw.strip_prefix('?').unwrap_or(raw);

    form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
