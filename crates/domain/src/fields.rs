//! Field lookup tolerant of the service's mixed naming.
//!
//! The cadastre service answers with `snake_case` on some endpoints and
//! `PascalCase` on others (`building_presence` / `BuildingPresence`,
//! `id` / `ID`, `page_size` / `pageSize`). Lookups here try every spelling of
//! a logical field name.

use serde_json::Value;

/// Returns the spellings to try for a logical `snake_case` field name.
///
/// Order: as written, `camelCase`, `PascalCase`, then `PascalCase` with `id`
/// segments upper-cased (`cadastre_id` -> `CadastreID`).
#[must_use]
pub fn spellings(name: &str) -> Vec<String> {
    let segments: Vec<&str> = name.split('_').filter(|s| !s.is_empty()).collect();
    let mut out = vec![name.to_string()];

    if segments.is_empty() {
        return out;
    }

    let pascal: String = segments.iter().map(|s| capitalize(s)).collect();
    let camel = {
        let mut s = segments[0].to_string();
        s.extend(segments[1..].iter().map(|s| capitalize(s)));
        s
    };
    let pascal_acronym: String = segments
        .iter()
        .map(|s| {
            if s.eq_ignore_ascii_case("id") {
                "ID".to_string()
            } else {
                capitalize(s)
            }
        })
        .collect();

    for candidate in [camel, pascal, pascal_acronym] {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Looks up a single field on a JSON object under any of its spellings.
#[must_use]
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    spellings(name)
        .iter()
        .find_map(|candidate| object.get(candidate))
}

/// Looks up a dotted path such as `meta.page_size` or `data.0.id`.
///
/// Numeric segments index into arrays; every other segment is resolved with
/// [`field`].
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim().trim_start_matches('$').trim_start_matches('.');
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| {
        match (current, segment.parse::<usize>()) {
            (Value::Array(items), Ok(index)) => items.get(index),
            _ => field(current, segment),
        }
    })
}

/// Looks up a field and renders it as a string.
///
/// Strings are returned as-is and numbers in their JSON form, so IDs compare
/// the same whichever way the server encodes them.
#[must_use]
pub fn lookup_string(value: &Value, path: &str) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns true if the field is present and not null, empty string or `false`.
#[must_use]
pub fn is_truthy(value: &Value, path: &str) -> bool {
    match lookup(value, path) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(_)) => true,
    }
}
