//! Streaming builder for GraphQL HTTP responses over database JSON rows.
//!
//! Databases that compose JSONB in views and functions already produce the
//! response payload — minus three rewrites GraphQL clients expect:
//!
//! 1. the `{"data":{"<field>":...}}` envelope,
//! 2. field projection down to the selection the client asked for,
//! 3. `snake_case` → `camelCase` keys plus `__typename` at schema-declared
//!    positions.
//!
//! This crate applies all three in a single forward pass over the row
//! bytes. No intermediate value tree is built; everything the pass does not
//! have to touch is copied verbatim into one output buffer, ready to be
//! written to the wire as `application/json`.
//!
//! ```
//! use graphql_rowset::ResponseBuilder;
//! use graphql_rowset::SchemaRegistry;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register_type("User", [
//!     ("id".to_string(), "Int"),
//!     ("name".to_string(), "String"),
//! ])?;
//!
//! let rows = vec![r#"{"id":1,"name":"A"}"#, r#"{"id":2,"name":"B"}"#];
//! let response = ResponseBuilder::new()
//!     .registry(&registry)
//!     .list(&rows, "users", Some("User"), None)?;
//!
//! assert_eq!(
//!     std::str::from_utf8(response.as_bytes()).unwrap(),
//!     r#"{"data":{"users":[{"__typename":"User","id":1,"name":"A"},{"__typename":"User","id":2,"name":"B"}]}}"#,
//! );
//! # Ok::<(), graphql_rowset::Error>(())
//! ```
//!
//! The registry is built once at startup and shared read-only across
//! requests; a [`ResponseBuilder`] and a [`Projection`] are per-request and
//! cheap. The builder never performs I/O and never calls back into the
//! host — parallelism is simply many invocations on separate cores.

mod case;
mod error;
mod limit;
mod mutation;
mod projection;
mod response;
mod rewrite;
mod scan;
mod schema;

pub use crate::case::to_camel_case;
pub use crate::case::transform_keys;
pub use crate::error::Error;
pub use crate::mutation::MutationShape;
pub use crate::projection::Projection;
pub use crate::projection::ProjectionNode;
pub use crate::response::ResponseBuilder;
pub use crate::response::ResponseBytes;
pub use crate::rewrite::transform_json;
pub use crate::schema::transform_with_schema;
pub use crate::schema::FieldType;
pub use crate::schema::IntoFieldType;
pub use crate::schema::SchemaRegistry;

/// A JSON value, as used by the batch [`transform_keys`] API.
pub type JsonValue = serde_json_bytes::Value;

/// A JSON object, with insertion order preserved.
pub type JsonMap = serde_json_bytes::Map<serde_json_bytes::ByteString, serde_json_bytes::Value>;
