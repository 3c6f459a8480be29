//! `snake_case` → `camelCase` identifier rewriting.
//!
//! The conversion is total and deterministic so that the same database column
//! always maps to the same GraphQL field, and so that converting an already
//! converted name is a no-op.

use serde_json_bytes::ByteString;

use crate::JsonMap;
use crate::JsonValue;

/// Convert a `snake_case` identifier to `camelCase`.
///
/// Rules:
///
/// * leading underscores are preserved verbatim, then the remainder is
///   converted (`_user_name` → `_userName`),
/// * runs of underscores separate segments and are consumed entirely
///   (`user__name` → `userName`, `user_name_` → `userName`),
/// * the first segment is copied as-is; every later segment has its first
///   character ASCII-upper-cased and the rest copied verbatim,
/// * digits are ordinary characters (`address_line_1` → `addressLine1`),
/// * input without underscores is returned unchanged.
///
/// ```
/// use graphql_rowset::to_camel_case;
///
/// assert_eq!(to_camel_case("user_name"), "userName");
/// assert_eq!(to_camel_case("_private"), "_private");
/// assert_eq!(to_camel_case("userName"), "userName");
/// ```
pub fn to_camel_case(identifier: &str) -> String {
    let mut out = Vec::with_capacity(identifier.len());
    write_camel_case(identifier.as_bytes(), &mut out);
    // Only bytes `a`..=`z` are ever rewritten, so the buffer stays UTF-8.
    String::from_utf8(out).expect("ASCII-only rewrites preserve UTF-8")
}

/// Byte-level form of [`to_camel_case`] used by the rewriter to emit a
/// converted key straight into the output buffer, without an intermediate
/// allocation.
pub(crate) fn write_camel_case(raw: &[u8], out: &mut Vec<u8>) {
    let lead = raw.iter().take_while(|&&b| b == b'_').count();
    out.extend_from_slice(&raw[..lead]);

    let mut upper_next = false;
    for &byte in &raw[lead..] {
        if byte == b'_' {
            upper_next = true;
        } else if upper_next {
            out.push(byte.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(byte);
        }
    }
}

/// Rewrite every object key of a JSON value via [`to_camel_case`].
///
/// With `recursive` set, keys of nested objects are rewritten too, including
/// objects reached through arrays. Values are never altered.
pub fn transform_keys(value: &JsonValue, recursive: bool) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut out = JsonMap::new();
            for (key, nested) in map {
                let nested = if recursive {
                    transform_keys(nested, true)
                } else {
                    nested.clone()
                };
                out.insert(ByteString::from(to_camel_case(key.as_str())), nested);
            }
            JsonValue::Object(out)
        }
        JsonValue::Array(items) if recursive => JsonValue::Array(
            items
                .iter()
                .map(|item| transform_keys(item, true))
                .collect(),
        ),
        other => other.clone(),
    }
}
