//! Table-driven mapping from loosely shaped marketplace JSON to products.
//!
//! Each marketplace describes its payload with a [`FieldTable`]: for every
//! product attribute an ordered list of dotted paths (`price.current_price`,
//! `images.0.url`). The first candidate that is present and non-empty wins.

use serde_json::Value;

use crate::data_source::SourceError;
use crate::domain::validate_currency_code;
use crate::normalize::normalize;
use crate::{CanonicalProduct, ProductDraft, ProviderId, MAX_RATING};

/// Candidate field paths per product attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    /// Where the product array lives. An empty path means the payload root.
    pub results: &'static [&'static str],
    pub id: &'static [&'static str],
    pub title: &'static [&'static str],
    pub price: &'static [&'static str],
    pub currency: &'static [&'static str],
    pub rating: &'static [&'static str],
    pub review_count: &'static [&'static str],
    pub image: &'static [&'static str],
    pub product_url: &'static [&'static str],
}

const IMAGE_KEYS: [&str; 5] = ["url", "src", "href", "url_570xN", "url_fullxfull"];

/// Parse a response body into normalized products.
///
/// Unparseable JSON fails the whole query. A payload without any recognised
/// result array is treated as an empty result. Records missing an id or a
/// title are dropped individually.
pub fn map_products(
    table: &FieldTable,
    provider: ProviderId,
    web_origin: &str,
    body: &str,
) -> Result<Vec<CanonicalProduct>, SourceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|error| SourceError::invalid_response(format!("{provider} payload is not JSON: {error}")))?;

    let Some(records) = locate_results(&payload, table.results) else {
        return Ok(Vec::new());
    };

    Ok(normalize(
        records
            .iter()
            .map(|record| map_record(table, provider, web_origin, record)),
    ))
}

fn locate_results<'v>(payload: &'v Value, candidates: &[&str]) -> Option<&'v Vec<Value>> {
    candidates
        .iter()
        .filter_map(|path| lookup(payload, path))
        .find_map(Value::as_array)
}

fn map_record(table: &FieldTable, provider: ProviderId, web_origin: &str, record: &Value) -> ProductDraft {
    let mut draft = ProductDraft::new(provider);
    draft.id = first(record, table.id).and_then(text).unwrap_or_default();
    draft.title = first(record, table.title).and_then(text).unwrap_or_default();
    draft.price = first(record, table.price).map_or(0.0, price_value);
    draft.currency = first(record, table.currency)
        .and_then(text)
        .and_then(|code| validate_currency_code(&code).ok());
    draft.rating = first(record, table.rating).map_or(0.0, parse_rating);
    draft.review_count = first(record, table.review_count).map_or(0, parse_review_count);
    draft.image_url = table
        .image
        .iter()
        .filter_map(|path| lookup(record, path))
        .find_map(image_url)
        .unwrap_or_default();
    draft.product_url = first(record, table.product_url)
        .and_then(text)
        .map(|url| resolve_url(web_origin, &url))
        .unwrap_or_default();
    draft
}

/// Resolve a dotted path. Numeric segments index into arrays.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

fn first<'v>(record: &'v Value, candidates: &[&str]) -> Option<&'v Value> {
    candidates
        .iter()
        .filter_map(|path| lookup(record, path))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn price_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0).max(0.0),
        Value::String(raw) => parse_price(raw),
        // Minor-unit amounts, e.g. {"amount": 1899, "divisor": 100}.
        Value::Object(map) => {
            let amount = map.get("amount").map_or(0.0, price_value);
            match map.get("divisor").and_then(Value::as_f64) {
                Some(divisor) if divisor > 0.0 => amount / divisor,
                _ => amount,
            }
        }
        _ => 0.0,
    }
}

/// Parse a display price such as `"$1,234.56"` or `"15,99 €"`.
///
/// A comma is the decimal separator only when no dot is present and it is
/// the last comma, followed by one or two trailing digits. Every other comma
/// is a thousands separator. Anything that does not parse yields `0.0`.
pub fn parse_price(raw: &str) -> f64 {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == ',')
        .collect();

    let decimal_comma = match kept.rfind(',') {
        Some(index) if !kept.contains('.') => {
            let fraction = &kept[index + 1..];
            (1..=2).contains(&fraction.len()).then_some(index)
        }
        _ => None,
    };

    let numeric: String = match decimal_comma {
        Some(index) => format!("{}.{}", kept[..index].replace(',', ""), &kept[index + 1..]),
        None => kept.replace(',', ""),
    };

    numeric
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Rating from a number or a string starting with one, clamped to `0..=5`.
pub fn parse_rating(value: &Value) -> f64 {
    let rating = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(raw) => leading_number(raw.trim()).unwrap_or(0.0),
        _ => 0.0,
    };

    if rating.is_nan() {
        return 0.0;
    }
    rating.clamp(0.0, MAX_RATING)
}

/// Review count from a number or strings like `"10,202"` and `"1.2K"`.
pub fn parse_review_count(value: &Value) -> u64 {
    let count = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(raw) => {
            let cleaned: String = raw.chars().filter(|ch| *ch != ',').collect();
            let start = cleaned.find(|ch: char| ch.is_ascii_digit()).unwrap_or(cleaned.len());
            let rest = &cleaned[start..];
            let digits_end = rest
                .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
                .unwrap_or(rest.len());
            let base = rest[..digits_end].parse::<f64>().unwrap_or(0.0);
            let multiplier = match rest[digits_end..].trim_start().chars().next() {
                Some('k' | 'K') => 1_000.0,
                Some('m' | 'M') => 1_000_000.0,
                _ => 1.0,
            };
            base * multiplier
        }
        _ => 0.0,
    };

    if count.is_finite() && count > 0.0 {
        count.round() as u64
    } else {
        0
    }
}

fn leading_number(raw: &str) -> Option<f64> {
    let end = raw
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// First usable image URL from a string, a `{url}`-style object, or an array
/// of either.
pub fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.trim().is_empty() => Some(url.trim().to_owned()),
        Value::Object(map) => IMAGE_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(image_url),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None,
    }
}

/// Make a product link absolute against the marketplace web origin.
pub fn resolve_url(web_origin: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return url.to_owned();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }

    let origin = web_origin.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{origin}{url}")
    } else {
        format!("{origin}/{url}")
    }
}
