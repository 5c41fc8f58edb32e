//! Hydration shape: the handler-free description of a route declaration.
//!
//! The shape is the only artifact describing route topology that leaves the
//! server. Every procedure is replaced by its bare method name, every group by
//! the list of its methods (optionally followed by one nested shape), and
//! every nested declaration by a nested shape:
//!
//! ```json
//! {
//!   "testGET": "GET",
//!   "multipleMethods": ["GET", "POST"],
//!   "experiment": ["GET", {"aa": "GET"}],
//!   "admin": {"users": "GET"}
//! }
//! ```
//!
//! Entry order follows the declaration.

use crate::Method;
use crate::RouterError;
use crate::router::declaration::{Declaration, Node, check_depth, join_path, split_group};
use crate::tree::{Branch, ROOT, TreeBuilder};
use crate::validation::validate_route_key;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Ordered map of route keys to shape nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    entries: Vec<(String, ShapeNode)>,
}

/// One value of a [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeNode {
    /// A single procedure: `"GET"`
    Method(Method),
    /// A procedure group: `["GET", "POST", {...}]`
    Methods {
        /// Methods served at this path, in declaration order
        methods: Vec<Method>,
        /// Nested routes of the group, if it declared any
        routes: Option<Shape>,
    },
    /// Nested routes: `{...}`
    Routes(Shape),
}

impl Shape {
    /// Create an empty shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Node stored under `key`
    pub fn get(&self, key: &str) -> Option<&ShapeNode> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, node)| node)
    }

    /// Keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &ShapeNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shape has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every callable path with its methods, depth-first in declaration order.
    pub fn paths(&self) -> Vec<(String, Vec<Method>)> {
        let mut paths = Vec::new();
        let mut stack: Vec<(String, &ShapeNode)> = self
            .iter()
            .rev()
            .map(|(key, node)| (key.to_string(), node))
            .collect();

        while let Some((path, node)) = stack.pop() {
            let nested = match node {
                ShapeNode::Method(method) => {
                    paths.push((path, vec![*method]));
                    continue;
                }
                ShapeNode::Methods { methods, routes } => {
                    paths.push((path.clone(), methods.clone()));
                    match routes {
                        Some(routes) => routes,
                        None => continue,
                    }
                }
                ShapeNode::Routes(routes) => routes,
            };
            for (key, child) in nested.iter().rev() {
                stack.push((join_path(&path, key), child));
            }
        }
        paths
    }

    fn from_entries(entries: Vec<(String, ShapeNode)>) -> Self {
        Self { entries }
    }
}

impl Drop for Shape {
    fn drop(&mut self) {
        let mut pending: Vec<Shape> = Vec::new();
        let mut entries = std::mem::take(&mut self.entries);
        loop {
            for (_, node) in entries.drain(..) {
                match node {
                    ShapeNode::Method(_) | ShapeNode::Methods { routes: None, .. } => {}
                    ShapeNode::Methods {
                        routes: Some(routes),
                        ..
                    }
                    | ShapeNode::Routes(routes) => pending.push(routes),
                }
            }
            match pending.pop() {
                Some(mut shape) => entries = std::mem::take(&mut shape.entries),
                None => break,
            }
        }
    }
}

impl Branch for ShapeNode {
    fn attach(&mut self, children: Vec<(String, Self)>) {
        match self {
            Self::Methods { routes, .. } => *routes = Some(Shape::from_entries(children)),
            Self::Routes(shape) => *shape = Shape::from_entries(children),
            Self::Method(_) => {}
        }
    }
}

/// Encode a declaration into its hydration shape.
///
/// Pure and idempotent: only method tags are inspected, no handler or
/// middleware is touched. Fails on invalid route keys, on groups holding
/// more than one nested declaration and on nesting deeper than
/// [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH).
pub fn encode<Ctx: Clone + Send + Sync + 'static>(
    declaration: &Declaration<Ctx>,
) -> Result<Shape, RouterError> {
    let mut builder = TreeBuilder::new();
    // (frame, path, key, node, nesting depth of the frame)
    let mut stack: Vec<(usize, String, String, &Node<Ctx>, usize)> = Vec::new();
    push_entries(&mut stack, ROOT, "", declaration, 1)?;

    while let Some((frame, path, key, node, depth)) = stack.pop() {
        match node {
            Node::Procedure(procedure) => {
                builder.push(frame, key, ShapeNode::Method(procedure.method()));
            }
            Node::Group(items) => {
                let (procedures, routes) = split_group(items);
                if routes.len() > 1 {
                    return Err(RouterError::MultipleSubDeclarations {
                        path,
                        count: routes.len(),
                    });
                }
                check_depth(&path, depth + 1)?;
                let mut methods = Vec::with_capacity(procedures.len());
                for procedure in procedures {
                    if !methods.contains(&procedure.method()) {
                        methods.push(procedure.method());
                    }
                }
                let nested = routes.first().copied().filter(|routes| !routes.is_empty());
                let entry = builder.push(
                    frame,
                    key,
                    ShapeNode::Methods {
                        methods,
                        routes: nested.map(|_| Shape::new()),
                    },
                );
                if let Some(nested) = nested {
                    check_depth(&path, depth + 2)?;
                    let child = builder.open(frame, entry);
                    push_entries(&mut stack, child, &path, nested, depth + 2)?;
                }
            }
            Node::Routes(nested) => {
                check_depth(&path, depth + 1)?;
                let entry = builder.push(frame, key, ShapeNode::Routes(Shape::new()));
                let child = builder.open(frame, entry);
                push_entries(&mut stack, child, &path, nested, depth + 1)?;
            }
        }
    }

    let shape = Shape::from_entries(builder.finish());
    trace!(keys = shape.len(), "Encoded hydration shape");
    Ok(shape)
}

fn push_entries<'a, Ctx: Clone + Send + Sync + 'static>(
    stack: &mut Vec<(usize, String, String, &'a Node<Ctx>, usize)>,
    frame: usize,
    parent: &str,
    declaration: &'a Declaration<Ctx>,
    depth: usize,
) -> Result<(), RouterError> {
    for (key, node) in declaration.iter().rev() {
        validate_route_key(key, parent)?;
        stack.push((frame, join_path(parent, key), key.to_string(), node, depth));
    }
    Ok(())
}

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl Serialize for ShapeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Method(method) => method.serialize(serializer),
            Self::Methods { methods, routes } => {
                let len = methods.len() + usize::from(routes.is_some());
                let mut seq = serializer.serialize_seq(Some(len))?;
                for method in methods {
                    seq.serialize_element(method)?;
                }
                if let Some(routes) = routes {
                    seq.serialize_element(routes)?;
                }
                seq.end()
            }
            Self::Routes(shape) => shape.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShapeVisitor;

        impl<'de> Visitor<'de> for ShapeVisitor {
            type Value = Shape;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a hydration shape object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Shape, A::Error> {
                let mut entries: Vec<(String, ShapeNode)> = Vec::new();
                while let Some((key, node)) = access.next_entry::<String, ShapeNode>()? {
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some((_, slot)) => *slot = node,
                        None => entries.push((key, node)),
                    }
                }
                Ok(Shape::from_entries(entries))
            }
        }

        deserializer.deserialize_map(ShapeVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireNode {
    Method(Method),
    Methods(Vec<WireElement>),
    Routes(Shape),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireElement {
    Method(Method),
    Routes(Shape),
}

impl<'de> Deserialize<'de> for ShapeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireNode::deserialize(deserializer)? {
            WireNode::Method(method) => Ok(Self::Method(method)),
            WireNode::Routes(shape) => Ok(Self::Routes(shape)),
            WireNode::Methods(elements) => {
                let total = elements.len();
                let mut methods = Vec::with_capacity(total);
                let mut routes = None;
                for (index, element) in elements.into_iter().enumerate() {
                    match element {
                        WireElement::Method(method) => methods.push(method),
                        WireElement::Routes(shape) if index + 1 == total => routes = Some(shape),
                        WireElement::Routes(_) => {
                            return Err(de::Error::custom(
                                "nested routes may only appear as the last element of a method list",
                            ));
                        }
                    }
                }
                Ok(Self::Methods { methods, routes })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_shapes_drop_without_recursion() {
        let mut shape = Shape::new();
        for depth in 0..100_000 {
            let node = if depth % 2 == 0 {
                ShapeNode::Routes(shape)
            } else {
                ShapeNode::Methods {
                    methods: vec![Method::Get],
                    routes: Some(shape),
                }
            };
            shape = Shape::from_entries(vec![("n".to_string(), node)]);
        }
        drop(shape);
    }
}
