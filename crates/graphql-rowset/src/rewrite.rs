//! The streaming JSON rewriter.
//!
//! One forward pass over the source bytes applies the three rewrites at
//! once: field projection (decided on raw source keys), camelCase key
//! renaming, and schema-driven `__typename` injection. Values the pass does
//! not need to inspect are copied span-wise, byte for byte, so numbers,
//! escape sequences, and unicode survive untouched.

use std::borrow::Cow;

use crate::case;
use crate::error::Error;
use crate::limit::LimitTracker;
use crate::projection::ProjectionNode;
use crate::response::write_json_string;
use crate::response::write_json_string_contents;
use crate::scan::unescape;
use crate::scan::Scanner;
use crate::schema::FieldType;
use crate::schema::SchemaRegistry;
use crate::schema::TypeEntry;

/// Rewrite a complete JSON document's keys to camelCase, with no envelope
/// and no typename injection.
///
/// ```
/// use graphql_rowset::transform_json;
///
/// let out = transform_json(r#"{"user_name":"John"}"#).unwrap();
/// assert_eq!(out, r#"{"userName":"John"}"#);
/// ```
pub fn transform_json(input: &str) -> Result<String, Error> {
    let mut out = Vec::with_capacity(input.len() + 16);
    rewrite_into(&mut out, input, None, None, None, true, None)?;
    String::from_utf8(out).map_err(|_| Error::Internal {
        message: "rewritten buffer is not UTF-8".into(),
    })
}

/// Rewrite one JSON fragment into `out`.
///
/// Without a registry, a declared `root_type` is taken at the caller's word
/// and injected at the root object. With a registry, the root follows the
/// same rule as nested positions: a `__typename` is only injected for types
/// the registry can resolve.
pub(crate) fn rewrite_into(
    out: &mut Vec<u8>,
    src: &str,
    root_type: Option<&str>,
    plan: Option<&ProjectionNode>,
    registry: Option<&SchemaRegistry>,
    camel_case: bool,
    depth_limit: Option<usize>,
) -> Result<(), Error> {
    let mut rewriter = Rewriter {
        scanner: Scanner::new(src),
        out,
        registry,
        camel_case,
        depth: depth_limit.map_or_else(LimitTracker::default, LimitTracker::new),
    };
    rewriter.root_value(root_type, normalize(plan))?;
    rewriter.scanner.finish()
}

/// A leaf trie node means "emit the whole subtree": below it there is no
/// projection to apply.
fn normalize(plan: Option<&ProjectionNode>) -> Option<&ProjectionNode> {
    plan.filter(|node| node.has_children())
}

struct Rewriter<'a, 'out> {
    scanner: Scanner<'a>,
    out: &'out mut Vec<u8>,
    registry: Option<&'a SchemaRegistry>,
    camel_case: bool,
    depth: LimitTracker,
}

impl<'a> Rewriter<'a, '_> {
    fn root_value(
        &mut self,
        root_type: Option<&str>,
        plan: Option<&ProjectionNode>,
    ) -> Result<(), Error> {
        self.scanner.skip_ws();
        if !self.camel_case && root_type.is_none() && plan.is_none() {
            return self.pass_through();
        }
        match self.scanner.peek() {
            Some(b'{') => {
                let (typename, entry) = match (root_type, self.registry) {
                    (Some(name), Some(registry)) => match registry.entry(name) {
                        Some(entry) => (Some(name), Some(entry)),
                        None => {
                            tracing::debug!(
                                type_name = %name,
                                "root type not registered; no __typename injected"
                            );
                            (None, None)
                        }
                    },
                    (Some(name), None) => (Some(name), None),
                    (None, _) => (None, None),
                };
                self.object(typename, entry, plan)
            }
            // A root array applies the declared type element-wise.
            Some(b'[') => {
                self.enter()?;
                self.scanner.expect(b'[')?;
                self.out.push(b'[');
                let mut first = true;
                loop {
                    self.scanner.skip_ws();
                    if self.scanner.eat(b']') {
                        break;
                    }
                    if !first {
                        self.scanner.expect(b',')?;
                        self.out.push(b',');
                    }
                    first = false;
                    self.root_value(root_type, plan)?;
                }
                self.out.push(b']');
                self.leave();
                Ok(())
            }
            _ => self.pass_through(),
        }
    }

    fn value(
        &mut self,
        ty: Option<&FieldType>,
        plan: Option<&ProjectionNode>,
    ) -> Result<(), Error> {
        self.scanner.skip_ws();

        // Nullable is transparent: `null` takes the scalar path below, any
        // other value is treated as the inner descriptor.
        let mut ty = ty;
        while let Some(FieldType::Nullable(inner)) = ty {
            ty = Some(inner.as_ref());
        }

        if !self.camel_case && plan.is_none() && !matches!(ty, Some(FieldType::Object(_) | FieldType::List(_))) {
            return self.pass_through();
        }

        match self.scanner.peek() {
            Some(b'{') => {
                let (typename, entry) = match ty {
                    Some(FieldType::Object(name)) => match self.registry.and_then(|r| r.entry(name)) {
                        Some(entry) => (Some(name.as_str()), Some(entry)),
                        None => {
                            tracing::debug!(type_name = %name, "type not registered; no __typename injected");
                            (None, None)
                        }
                    },
                    Some(FieldType::List(_)) => {
                        tracing::debug!("schema declared a list, found an object");
                        (None, None)
                    }
                    _ => (None, None),
                };
                self.object(typename, entry, plan)
            }
            Some(b'[') => {
                let element_ty = match ty {
                    Some(FieldType::List(inner)) => Some(inner.as_ref()),
                    Some(FieldType::Object(name)) => {
                        tracing::debug!(type_name = %name, "schema declared an object, found a list");
                        None
                    }
                    _ => None,
                };
                self.array(element_ty, plan)
            }
            _ => self.pass_through(),
        }
    }

    fn object(
        &mut self,
        typename: Option<&str>,
        entry: Option<&TypeEntry>,
        plan: Option<&ProjectionNode>,
    ) -> Result<(), Error> {
        self.enter()?;
        self.scanner.expect(b'{')?;
        self.out.push(b'{');

        let mut emitted = false;
        if let Some(name) = typename {
            self.out.extend_from_slice(b"\"__typename\":");
            write_json_string(name, self.out);
            emitted = true;
        }

        let mut first_pair = true;
        loop {
            self.scanner.skip_ws();
            if self.scanner.eat(b'}') {
                break;
            }
            if !first_pair {
                self.scanner.expect(b',')?;
                self.scanner.skip_ws();
            }
            first_pair = false;

            let span = self.scanner.scan_string()?;
            self.scanner.skip_ws();
            self.scanner.expect(b':')?;

            let raw = &self.scanner.text()[span.start..span.end];
            let key: Cow<'_, str> = if span.has_escapes {
                Cow::Owned(unescape(raw, span.start)?)
            } else {
                Cow::Borrowed(raw)
            };

            // A schema-typed object replaces any __typename the source
            // carried; the schema-derived value was already emitted.
            if typename.is_some() && key == "__typename" {
                self.scanner.skip_value()?;
                continue;
            }

            let child_plan = match plan {
                Some(node) => match node.child(&key) {
                    Some(child) => normalize(Some(child)),
                    None => {
                        // Not selected: skip the pair without emitting.
                        self.scanner.skip_value()?;
                        continue;
                    }
                },
                None => None,
            };

            let child_ty = entry.and_then(|e| e.field(&key));

            if emitted {
                self.out.push(b',');
            }
            emitted = true;

            self.out.push(b'"');
            if self.camel_case {
                if span.has_escapes {
                    let converted = case::to_camel_case(&key);
                    write_json_string_contents(&converted, self.out);
                } else {
                    case::write_camel_case(raw.as_bytes(), self.out);
                }
            } else {
                self.out.extend_from_slice(raw.as_bytes());
            }
            self.out.extend_from_slice(b"\":");

            self.value(child_ty, child_plan)?;
        }

        self.out.push(b'}');
        self.leave();
        Ok(())
    }

    fn array(
        &mut self,
        element_ty: Option<&FieldType>,
        plan: Option<&ProjectionNode>,
    ) -> Result<(), Error> {
        self.enter()?;
        self.scanner.expect(b'[')?;
        self.out.push(b'[');
        let mut first = true;
        loop {
            self.scanner.skip_ws();
            if self.scanner.eat(b']') {
                break;
            }
            if !first {
                self.scanner.expect(b',')?;
                self.out.push(b',');
            }
            first = false;
            // The same trie node applies to every element: union-of-paths.
            self.value(element_ty, plan)?;
        }
        self.out.push(b']');
        self.leave();
        Ok(())
    }

    /// Copy one whole value without inspecting it.
    fn pass_through(&mut self) -> Result<(), Error> {
        let span = self.scanner.skip_value()?;
        self.out
            .extend_from_slice(&self.scanner.text().as_bytes()[span]);
        Ok(())
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth.consume();
        if self.depth.limited() {
            return Err(Error::invalid(
                "nesting depth limit exceeded",
                self.scanner.pos(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth.release();
    }
}
