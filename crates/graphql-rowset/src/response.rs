//! GraphQL response envelopes.
//!
//! Everything here produces the outer `{"data":{"<field>":...}}` wrapper
//! around rewritten row fragments. The envelope formats are bit-exact: no
//! whitespace padding, a single `,` between array elements, source key order
//! preserved.

use std::fmt;

use crate::error::Error;
use crate::mutation;
use crate::mutation::MutationShape;
use crate::projection::Projection;
use crate::rewrite;
use crate::schema::SchemaRegistry;

/// Finished response bytes, plus the out-of-band content type the HTTP
/// transport writes alongside them.
///
/// The payload is always valid UTF-8 JSON starting with `{"data":`.
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseBytes {
    bytes: Vec<u8>,
}

impl ResponseBytes {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The HTTP content type for this payload.
    pub fn content_type(&self) -> &'static str {
        "application/json"
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for ResponseBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ResponseBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResponseBytes({}, {} bytes)",
            self.content_type(),
            self.bytes.len()
        )
    }
}

/// Builds client-ready response bytes out of database row fragments.
///
/// A builder is cheap to construct per request; the registry it points at is
/// the long-lived, read-only piece.
///
/// ```
/// use graphql_rowset::ResponseBuilder;
///
/// let response = ResponseBuilder::new()
///     .list(
///         &[r#"{"user_id":1}"#, r#"{"user_id":2}"#],
///         "users",
///         None,
///         None,
///     )
///     .unwrap();
/// assert_eq!(
///     response.as_bytes(),
///     br#"{"data":{"users":[{"userId":1},{"userId":2}]}}"#,
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder<'a> {
    pub(crate) registry: Option<&'a SchemaRegistry>,
    pub(crate) camel_case: bool,
    pub(crate) depth_limit: Option<usize>,
}

impl Default for ResponseBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ResponseBuilder<'a> {
    pub fn new() -> Self {
        Self {
            registry: None,
            camel_case: true,
            depth_limit: None,
        }
    }

    /// Inject `__typename` at positions this registry declares.
    pub fn registry(mut self, registry: &'a SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Toggle `snake_case` → `camelCase` key rewriting. On by default.
    pub fn camel_case(mut self, enabled: bool) -> Self {
        self.camel_case = enabled;
        self
    }

    /// Cap the nesting depth the rewriter will follow before failing the
    /// build. The default (128) is far deeper than anything a composing
    /// view produces.
    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// `{"data":{"<field>":[<row>,<row>,...]}}`
    ///
    /// Each row is rewritten independently; `type_name` types every row's
    /// root object. An empty `rows` produces the [`empty_list`] form.
    ///
    /// [`empty_list`]: Self::empty_list
    pub fn list<S: AsRef<str>>(
        &self,
        rows: &[S],
        field: &str,
        type_name: Option<&str>,
        projection: Option<&Projection>,
    ) -> Result<ResponseBytes, Error> {
        if rows.is_empty() {
            return Ok(self.empty_list(field));
        }
        let rows_len: usize = rows.iter().map(|row| row.as_ref().len()).sum();
        let mut out = Vec::with_capacity(rows_len + rows.len() + envelope_overhead(field));
        self.open_envelope(field, &mut out);
        out.push(b'[');
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            self.rewrite_fragment(row.as_ref(), type_name, projection, &mut out)?;
        }
        out.extend_from_slice(b"]}}");
        Ok(ResponseBytes::new(out))
    }

    /// `{"data":{"<field>":<row>}}`
    pub fn single(
        &self,
        row: &str,
        field: &str,
        type_name: Option<&str>,
        projection: Option<&Projection>,
    ) -> Result<ResponseBytes, Error> {
        let mut out = Vec::with_capacity(row.len() + envelope_overhead(field));
        self.open_envelope(field, &mut out);
        self.rewrite_fragment(row, type_name, projection, &mut out)?;
        out.extend_from_slice(b"}}");
        Ok(ResponseBytes::new(out))
    }

    /// `{"data":{"<field>":[]}}` — the shape for a query that matched no
    /// rows.
    pub fn empty_list(&self, field: &str) -> ResponseBytes {
        let mut out = Vec::with_capacity(envelope_overhead(field));
        self.open_envelope(field, &mut out);
        out.extend_from_slice(b"[]}}");
        ResponseBytes::new(out)
    }

    /// `{"data":{"<field>":null}}` — the shape for a single-object query
    /// that found nothing.
    pub fn null(&self, field: &str) -> ResponseBytes {
        let mut out = Vec::with_capacity(envelope_overhead(field));
        self.open_envelope(field, &mut out);
        out.extend_from_slice(b"null}}");
        ResponseBytes::new(out)
    }

    /// Shape a mutation result payload; see [`MutationShape`].
    pub fn mutation(
        &self,
        payload: &str,
        shape: &MutationShape<'_>,
    ) -> Result<ResponseBytes, Error> {
        mutation::build(self, payload, shape)
    }

    fn open_envelope(&self, field: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(b"{\"data\":{");
        write_json_string(field, out);
        out.push(b':');
    }

    /// Rewrite one fragment into `out` with this builder's settings and no
    /// envelope.
    pub(crate) fn rewrite_fragment(
        &self,
        src: &str,
        root_type: Option<&str>,
        projection: Option<&Projection>,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        rewrite::rewrite_into(
            out,
            src,
            root_type,
            projection.map(Projection::root),
            self.registry,
            self.camel_case,
            self.depth_limit,
        )
    }
}

fn envelope_overhead(field: &str) -> usize {
    50 + field.len() * 2
}

/// Write `s` as a JSON string, quotes included.
pub(crate) fn write_json_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    write_json_string_contents(s, out);
    out.push(b'"');
}

pub(crate) fn write_json_string_contents(s: &str, out: &mut Vec<u8>) {
    for &byte in s.as_bytes() {
        match byte {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            byte if byte < 0x20 => {
                let mut escape = *b"\\u0000";
                escape[4] = HEX[usize::from(byte >> 4)];
                escape[5] = HEX[usize::from(byte & 0xF)];
                out.extend_from_slice(&escape);
            }
            byte => out.push(byte),
        }
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";
