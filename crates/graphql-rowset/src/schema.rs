//! Registry of GraphQL object types used for `__typename` injection.
//!
//! The host framework registers its types once at startup; requests then
//! share the registry read-only. Lookups answer one question for the
//! rewriter: at field `f` of type `T`, what sits underneath?

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Deserialize;
use triomphe::Arc;

use crate::error::Error;
use crate::response::ResponseBuilder;

/// Scalar names that never resolve to object types, no matter what is
/// registered.
const BUILTIN_SCALARS: &[&str] = &["Int", "String", "Boolean", "Float", "ID"];

/// Describes what sits at a field position.
///
/// Bare type names are kept symbolic: whether `Object("Post")` actually
/// refers to an object type is decided at lookup time against the registered
/// type set, so registration order does not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// An opaque leaf. No typename injection, no schema-driven recursion.
    Scalar,
    /// A nested object of the named type.
    Object(String),
    /// A list applying the inner descriptor to every element.
    List(Box<FieldType>),
    /// Transparent wrapper; `null` short-circuits, any other value is
    /// treated as the inner descriptor.
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Parse the compact descriptor notation: a bare name, `[T]` for lists,
    /// `T?` for nullable positions, composable as in `[Post]?`.
    ///
    /// GraphQL's non-null marker is accepted and transparent (`String!` is
    /// `String`): positions are non-null unless wrapped in `?`, so schema
    /// exporters can hand their type strings through unmodified.
    pub fn parse(descriptor: &str) -> Result<Self, Error> {
        Self::parse_at(descriptor.trim(), 0)
    }

    fn parse_at(descriptor: &str, offset: usize) -> Result<Self, Error> {
        if let Some(inner) = descriptor.strip_suffix('!') {
            return Self::parse_at(inner, offset);
        }
        if let Some(inner) = descriptor.strip_suffix('?') {
            return Ok(Self::Nullable(Box::new(Self::parse_at(inner, offset)?)));
        }
        if let Some(open) = descriptor.strip_prefix('[') {
            let Some(inner) = open.strip_suffix(']') else {
                return Err(Error::invalid(
                    format!("unterminated list descriptor `{descriptor}`"),
                    offset,
                ));
            };
            return Ok(Self::List(Box::new(Self::parse_at(inner, offset + 1)?)));
        }
        if descriptor.is_empty() {
            return Err(Error::invalid("empty field descriptor", offset));
        }
        if let Some(bad) = descriptor
            .bytes()
            .position(|b| !b.is_ascii_alphanumeric() && b != b'_')
        {
            return Err(Error::invalid(
                format!("invalid character in field descriptor `{descriptor}`"),
                offset + bad,
            ));
        }
        if BUILTIN_SCALARS.contains(&descriptor) {
            Ok(Self::Scalar)
        } else {
            Ok(Self::Object(descriptor.to_string()))
        }
    }
}

/// Field table of one registered type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct TypeEntry {
    fields: IndexMap<String, FieldType>,
}

impl TypeEntry {
    pub(crate) fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }
}

/// Process-wide map from GraphQL type names to their field descriptors.
///
/// Effectively immutable once requests start flowing; shared by reference
/// across concurrent response builds. Entries sit behind an [`Arc`] so
/// cloning a registry is cheap.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    version: String,
    features: Vec<String>,
    types: HashMap<String, Arc<TypeEntry>>,
}

/// Schema IR accepted by [`SchemaRegistry::from_json`]. Descriptors come
/// either in compact notation or in the structured form emitted by older
/// schema exporters; unknown extra keys are tolerated for forward
/// compatibility.
#[derive(Deserialize)]
struct SchemaIr {
    #[serde(default)]
    version: String,
    #[serde(default)]
    features: Vec<String>,
    types: HashMap<String, TypeIr>,
}

#[derive(Deserialize)]
struct TypeIr {
    fields: IndexMap<String, FieldIr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldIr {
    Compact(String),
    Structured {
        type_name: String,
        #[serde(default)]
        is_nested_object: bool,
        #[serde(default)]
        is_list: bool,
    },
}

impl FieldIr {
    fn into_field_type(self) -> Result<FieldType, Error> {
        match self {
            FieldIr::Compact(descriptor) => FieldType::parse(&descriptor),
            FieldIr::Structured {
                type_name,
                is_nested_object,
                is_list,
            } => {
                let inner = if is_nested_object {
                    FieldType::Object(type_name)
                } else {
                    FieldType::Scalar
                };
                Ok(if is_list {
                    FieldType::List(Box::new(inner))
                } else {
                    inner
                })
            }
        }
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from its JSON IR:
    /// `{"version": "...", "features": [...], "types": {"User": {"fields": ...}}}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let ir: SchemaIr = serde_json::from_str(json)
            .map_err(|e| Error::invalid(format!("schema IR: {e}"), 0))?;
        let mut registry = Self {
            version: ir.version,
            features: ir.features,
            types: HashMap::with_capacity(ir.types.len()),
        };
        for (name, entry) in ir.types {
            registry.register_type(
                name,
                entry
                    .fields
                    .into_iter()
                    .map(|(field, ir)| Ok((field, ir.into_field_type()?)))
                    .collect::<Result<Vec<_>, Error>>()?,
            )?;
        }
        Ok(registry)
    }

    /// Register (or replace) a type. `fields` maps field names to compact
    /// descriptors or pre-parsed [`FieldType`]s.
    ///
    /// A type with an empty field map is rejected: it could never drive a
    /// lookup and almost certainly indicates a broken exporter.
    pub fn register_type<N, F, D>(&mut self, name: N, fields: F) -> Result<(), Error>
    where
        N: Into<String>,
        F: IntoIterator<Item = (String, D)>,
        D: IntoFieldType,
    {
        let mut table = IndexMap::new();
        for (field, descriptor) in fields {
            table.insert(field, descriptor.into_field_type()?);
        }
        if table.is_empty() {
            return Err(Error::invalid("type registered with no fields", 0));
        }
        self.types
            .insert(name.into(), Arc::new(TypeEntry { fields: table }));
        Ok(())
    }

    /// Whether `name` refers to a registered object type.
    pub fn is_known_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// The descriptor of `field_name` within `type_name`, if both are known.
    pub fn lookup(&self, type_name: &str, field_name: &str) -> Option<&FieldType> {
        self.types.get(type_name)?.field(field_name)
    }

    pub(crate) fn entry(&self, type_name: &str) -> Option<&TypeEntry> {
        self.types.get(type_name).map(Arc::as_ref)
    }

    /// Schema IR version, when loaded from JSON.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the loaded IR advertises a capability flag.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Rewrite `json` as an instance of `root_type`: camelCase keys plus
    /// `__typename` at the root and at every schema-declared nested
    /// position. No response envelope is added.
    ///
    /// An unregistered `root_type` is not an error; the value is rewritten
    /// without typename injection.
    pub fn transform(&self, json: &str, root_type: &str) -> Result<Vec<u8>, Error> {
        transform_with_schema(json, root_type, self)
    }

    /// Install this registry as the process-wide instance.
    ///
    /// The first install wins; later calls return `false` and drop their
    /// argument. Intended for hosts that configure the schema once at
    /// startup and do not want to thread a reference through every request
    /// path. Nothing in this crate requires the global — every API also
    /// takes a registry by reference.
    pub fn install(self) -> bool {
        GLOBAL.set(self).is_ok()
    }

    /// The process-wide registry, if [`install`](Self::install) has run.
    pub fn global() -> Option<&'static SchemaRegistry> {
        GLOBAL.get()
    }
}

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Free-function form of [`SchemaRegistry::transform`].
pub fn transform_with_schema(
    json: &str,
    root_type: &str,
    registry: &SchemaRegistry,
) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(json.len() + json.len() / 4 + 16);
    ResponseBuilder::new()
        .registry(registry)
        .rewrite_fragment(json, Some(root_type), None, &mut out)?;
    Ok(out)
}

/// Conversion accepted by [`SchemaRegistry::register_type`] descriptors.
pub trait IntoFieldType {
    fn into_field_type(self) -> Result<FieldType, Error>;
}

impl IntoFieldType for FieldType {
    fn into_field_type(self) -> Result<FieldType, Error> {
        Ok(self)
    }
}

impl IntoFieldType for &str {
    fn into_field_type(self) -> Result<FieldType, Error> {
        FieldType::parse(self)
    }
}

impl IntoFieldType for String {
    fn into_field_type(self) -> Result<FieldType, Error> {
        FieldType::parse(&self)
    }
}
