//! GraphQL mutation result shaping.
//!
//! Mutations come back from the database as one JSON object describing what
//! happened (`status`, `message`, the mutated `entity`, optional `cascade`
//! side effects and `metadata`). That payload is reshaped into the
//! success-or-error union GraphQL clients expect, with an `errors` array
//! that is always populated on the error side.

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::Error;
use crate::projection::Projection;
use crate::response::write_json_string;
use crate::response::ResponseBuilder;
use crate::response::ResponseBytes;

/// Field names and type names shaping one mutation's response.
///
/// ```
/// use graphql_rowset::MutationShape;
///
/// let shape = MutationShape::new("createUser", "CreateUserSuccess", "CreateUserError")
///     .entity("user", Some("User"));
/// # let _ = shape;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MutationShape<'a> {
    pub(crate) field_name: &'a str,
    pub(crate) success_type: &'a str,
    pub(crate) error_type: &'a str,
    pub(crate) entity_field: Option<&'a str>,
    pub(crate) entity_type: Option<&'a str>,
    pub(crate) entity_selection: Option<&'a Projection>,
    pub(crate) cascade_selections: Option<&'a Projection>,
}

impl<'a> MutationShape<'a> {
    pub fn new(field_name: &'a str, success_type: &'a str, error_type: &'a str) -> Self {
        Self {
            field_name,
            success_type,
            error_type,
            entity_field: None,
            entity_type: None,
            entity_selection: None,
            cascade_selections: None,
        }
    }

    /// Emit the mutated entity under `field`, typed as `type_name`. Without
    /// this, the entity is left out of the success shape entirely.
    pub fn entity(mut self, field: &'a str, type_name: Option<&'a str>) -> Self {
        self.entity_field = Some(field);
        self.entity_type = type_name;
        self
    }

    /// Project the emitted entity down to the selected fields.
    pub fn entity_selection(mut self, plan: &'a Projection) -> Self {
        self.entity_selection = Some(plan);
        self
    }

    /// Emit the payload's `cascade` side effects, projected by `plan`.
    /// Without this, cascade data is not part of the response.
    pub fn cascade_selections(mut self, plan: &'a Projection) -> Self {
        self.cascade_selections = Some(plan);
        self
    }
}

/// The mutation result payload, borrowed from the source text. Sub-payloads
/// stay raw so the streaming rewriter can shape them without a re-parse.
#[derive(Deserialize)]
struct Payload<'a> {
    #[serde(borrow)]
    status: Option<Cow<'a, str>>,
    #[serde(borrow)]
    message: Option<Cow<'a, str>>,
    #[serde(borrow)]
    entity: Option<&'a RawValue>,
    #[serde(borrow)]
    entity_type: Option<Cow<'a, str>>,
    #[serde(borrow)]
    entity_id: Option<&'a RawValue>,
    #[serde(borrow)]
    updated_fields: Option<&'a RawValue>,
    #[serde(borrow)]
    cascade: Option<&'a RawValue>,
    metadata: Option<Metadata<'a>>,
}

#[derive(Deserialize)]
struct Metadata<'a> {
    #[serde(borrow)]
    errors: Option<&'a RawValue>,
}

pub(crate) fn build(
    builder: &ResponseBuilder<'_>,
    payload_json: &str,
    shape: &MutationShape<'_>,
) -> Result<ResponseBytes, Error> {
    let payload: Payload<'_> = serde_json::from_str(payload_json).map_err(|e| {
        Error::invalid(
            format!("mutation payload: {e}"),
            offset_of(payload_json, e.line(), e.column()),
        )
    })?;

    let mut out = Vec::with_capacity(payload_json.len() + 128);
    out.extend_from_slice(b"{\"data\":{");
    write_json_string(shape.field_name, &mut out);
    out.push(b':');

    match payload.status.as_deref() {
        Some(status) if !is_error_status(status) => {
            render_success(builder, &payload, status, shape, &mut out)?;
        }
        status => render_error(&payload, status, shape, &mut out),
    }

    out.extend_from_slice(b"}}");
    Ok(ResponseBytes::new(out))
}

/// `failed`, `failed:<reason>`, and `noop:<reason>` select the error type;
/// everything else (`new`, `updated`, ...) is a success.
fn is_error_status(status: &str) -> bool {
    status == "failed" || status.starts_with("failed:") || status.starts_with("noop:")
}

/// The machine identifier encoded in a status string: the suffix after the
/// first `:`, or `general_error` for a bare `failed`.
fn status_identifier(status: &str) -> &str {
    match status.split_once(':') {
        Some((_, suffix)) => suffix,
        None => "general_error",
    }
}

fn error_code(identifier: &str) -> u16 {
    match identifier {
        "not_found" => 404,
        "authorization" => 403,
        "validation" => 400,
        _ => 500,
    }
}

fn render_error(
    payload: &Payload<'_>,
    status: Option<&str>,
    shape: &MutationShape<'_>,
    out: &mut Vec<u8>,
) {
    let identifier = status.map_or("general_error", status_identifier);
    let code = error_code(identifier);
    let message = match (&payload.message, status) {
        (Some(message), _) => message.as_ref(),
        (None, Some(_)) => "Mutation failed",
        (None, None) => "Mutation result did not include a status",
    };

    out.extend_from_slice(b"{\"__typename\":");
    write_json_string(shape.error_type, out);
    out.extend_from_slice(b",\"code\":");
    out.extend_from_slice(code.to_string().as_bytes());
    out.extend_from_slice(b",\"status\":");
    match status {
        Some(status) => write_json_string(status, out),
        None => out.extend_from_slice(b"null"),
    }
    out.extend_from_slice(b",\"message\":");
    write_json_string(message, out);
    out.extend_from_slice(b",\"errors\":");
    match explicit_errors(payload) {
        // An explicit error array from the database wins and is emitted
        // verbatim.
        Some(raw) => out.extend_from_slice(raw.get().as_bytes()),
        None => {
            out.extend_from_slice(b"[{\"code\":");
            out.extend_from_slice(code.to_string().as_bytes());
            out.extend_from_slice(b",\"identifier\":");
            write_json_string(identifier, out);
            out.extend_from_slice(b",\"message\":");
            write_json_string(message, out);
            out.extend_from_slice(b",\"details\":null}]");
        }
    }
    out.push(b'}');
}

fn render_success(
    builder: &ResponseBuilder<'_>,
    payload: &Payload<'_>,
    status: &str,
    shape: &MutationShape<'_>,
    out: &mut Vec<u8>,
) -> Result<(), Error> {
    out.extend_from_slice(b"{\"__typename\":");
    write_json_string(shape.success_type, out);
    out.extend_from_slice(b",\"status\":");
    write_json_string(status, out);
    if let Some(message) = &payload.message {
        out.extend_from_slice(b",\"message\":");
        write_json_string(message, out);
    }

    if let Some(entity_field) = shape.entity_field {
        out.push(b',');
        write_json_string(entity_field, out);
        out.push(b':');
        match non_null(payload.entity) {
            Some(entity) => {
                let entity_type = shape
                    .entity_type
                    .or(payload.entity_type.as_deref());
                builder.rewrite_fragment(
                    entity.get(),
                    entity_type,
                    shape.entity_selection,
                    out,
                )?;
            }
            None => out.extend_from_slice(b"null"),
        }
    }

    if let Some(entity_id) = non_null(payload.entity_id) {
        out.push(b',');
        write_json_string(result_key(builder, "entityId", "entity_id"), out);
        out.push(b':');
        out.extend_from_slice(entity_id.get().as_bytes());
    }

    if let Some(updated) = non_null(payload.updated_fields) {
        out.push(b',');
        write_json_string(result_key(builder, "updatedFields", "updated_fields"), out);
        out.push(b':');
        out.extend_from_slice(updated.get().as_bytes());
    }

    if let (Some(plan), Some(cascade)) = (shape.cascade_selections, non_null(payload.cascade)) {
        out.extend_from_slice(b",\"cascade\":");
        builder.rewrite_fragment(cascade.get(), None, Some(plan), out)?;
    }

    out.push(b'}');
    Ok(())
}

fn explicit_errors<'a>(payload: &Payload<'a>) -> Option<&'a RawValue> {
    non_null(payload.metadata.as_ref()?.errors).filter(|raw| raw.get().starts_with('['))
}

fn non_null<'a>(raw: Option<&'a RawValue>) -> Option<&'a RawValue> {
    raw.filter(|raw| raw.get() != "null")
}

/// Keys synthesized into the success shape follow the builder's case mode.
fn result_key<'k>(builder: &ResponseBuilder<'_>, camel: &'k str, snake: &'k str) -> &'k str {
    if builder.camel_case {
        camel
    } else {
        snake
    }
}

/// serde_json reports line/column; the error contract wants a byte offset.
fn offset_of(input: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let mut offset = 0;
    let mut remaining = line - 1;
    for (i, byte) in input.bytes().enumerate() {
        if remaining == 0 {
            break;
        }
        if byte == b'\n' {
            remaining -= 1;
            offset = i + 1;
        }
    }
    (offset + column.saturating_sub(1)).min(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(is_error_status("failed"));
        assert!(is_error_status("failed:validation"));
        assert!(is_error_status("noop:not_found"));
        assert!(!is_error_status("new"));
        assert!(!is_error_status("updated"));
        assert!(!is_error_status("noop"));
    }

    #[test]
    fn identifier_extraction() {
        assert_eq!(status_identifier("failed:validation"), "validation");
        assert_eq!(status_identifier("noop:not_found"), "not_found");
        assert_eq!(status_identifier("failed"), "general_error");
    }

    #[test]
    fn code_table() {
        assert_eq!(error_code("not_found"), 404);
        assert_eq!(error_code("authorization"), 403);
        assert_eq!(error_code("validation"), 400);
        assert_eq!(error_code("general_error"), 500);
        assert_eq!(error_code("anything_else"), 500);
    }

    #[test]
    fn offsets_from_line_and_column() {
        let input = "{\n  \"status\" 1\n}";
        assert_eq!(offset_of(input, 2, 3), 4);
        assert_eq!(offset_of(input, 1, 1), 0);
        assert_eq!(offset_of(input, 99, 99), input.len());
    }
}
