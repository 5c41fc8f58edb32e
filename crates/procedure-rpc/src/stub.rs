//! Stub trees mirroring a hydration shape.
//!
//! A [`StubTree`] has the same keys and nesting as the declaration it was
//! derived from; its leaves are whatever the caller binds to each
//! (path, method) pair: remote procedures on a client, in-process endpoints
//! for server rendering.

use crate::Method;
use crate::hydrate::{Shape, ShapeNode};
use crate::router::declaration::join_path;
use crate::tree::{Branch, ROOT, TreeBuilder};

/// Ordered tree of bound endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct StubTree<L> {
    entries: Vec<(String, StubNode<L>)>,
}

/// One value of a [`StubTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum StubNode<L> {
    /// A single procedure
    Endpoint(Method, L),
    /// A procedure group: one endpoint per method plus nested routes
    Methods(MethodStubs<L>),
    /// Nested routes
    Routes(StubTree<L>),
}

/// Endpoints of a procedure group, keyed by method, with the group's nested
/// routes alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodStubs<L> {
    endpoints: Vec<(Method, L)>,
    routes: StubTree<L>,
}

impl<L> MethodStubs<L> {
    /// Endpoint bound to `method`
    pub fn method(&self, method: Method) -> Option<&L> {
        self.endpoints
            .iter()
            .find(|(bound, _)| *bound == method)
            .map(|(_, leaf)| leaf)
    }

    /// Methods of the group, in declaration order
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.endpoints.iter().map(|(method, _)| *method)
    }

    /// Nested routes of the group
    pub fn routes(&self) -> &StubTree<L> {
        &self.routes
    }
}

impl<L> Default for StubTree<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<L> StubTree<L> {
    /// Build a stub tree from a shape, binding every (path, method) pair
    /// with `bind`.
    pub fn from_shape(shape: &Shape, mut bind: impl FnMut(&str, Method) -> L) -> Self {
        let mut builder = TreeBuilder::new();
        let mut stack: Vec<(usize, String, &str, &ShapeNode)> = Vec::new();
        for (key, node) in shape.iter().rev() {
            stack.push((ROOT, key.to_string(), key, node));
        }

        while let Some((frame, path, key, node)) = stack.pop() {
            let nested = match node {
                ShapeNode::Method(method) => {
                    let leaf = bind(&path, *method);
                    builder.push(frame, key, StubNode::Endpoint(*method, leaf));
                    continue;
                }
                ShapeNode::Methods { methods, routes } => {
                    let endpoints = methods
                        .iter()
                        .map(|method| (*method, bind(&path, *method)))
                        .collect();
                    let entry = builder.push(
                        frame,
                        key,
                        StubNode::Methods(MethodStubs {
                            endpoints,
                            routes: StubTree::default(),
                        }),
                    );
                    match routes {
                        Some(routes) => (entry, routes),
                        None => continue,
                    }
                }
                ShapeNode::Routes(routes) => {
                    let entry = builder.push(frame, key, StubNode::Routes(StubTree::default()));
                    (entry, routes)
                }
            };

            let (entry, routes) = nested;
            let child = builder.open(frame, entry);
            for (child_key, child_node) in routes.iter().rev() {
                stack.push((child, join_path(&path, child_key), child_key, child_node));
            }
        }

        Self {
            entries: builder.finish(),
        }
    }

    /// Node stored under `key`
    pub fn get(&self, key: &str) -> Option<&StubNode<L>> {
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
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StubNode<L>)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Node at a `/`-separated path, descending through groups and routes
    pub fn lookup(&self, path: &str) -> Option<&StubNode<L>> {
        let mut segments = path.split('/');
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = match node {
                StubNode::Endpoint(..) => return None,
                StubNode::Methods(stubs) => stubs.routes.get(segment)?,
                StubNode::Routes(tree) => tree.get(segment)?,
            };
        }
        Some(node)
    }

    /// Endpoint bound to `method` at `path`
    pub fn endpoint(&self, path: &str, method: Method) -> Option<&L> {
        match self.lookup(path)? {
            StubNode::Endpoint(bound, leaf) if *bound == method => Some(leaf),
            StubNode::Endpoint(..) | StubNode::Routes(_) => None,
            StubNode::Methods(stubs) => stubs.method(method),
        }
    }
}

impl<L> StubNode<L> {
    /// The leaf of a single-procedure node
    pub fn as_endpoint(&self) -> Option<&L> {
        match self {
            Self::Endpoint(_, leaf) => Some(leaf),
            _ => None,
        }
    }

    /// The endpoints of a group node
    pub fn as_methods(&self) -> Option<&MethodStubs<L>> {
        match self {
            Self::Methods(stubs) => Some(stubs),
            _ => None,
        }
    }
}

impl<L> Drop for StubTree<L> {
    fn drop(&mut self) {
        let mut pending: Vec<StubTree<L>> = Vec::new();
        let mut entries = std::mem::take(&mut self.entries);
        loop {
            for (_, node) in entries.drain(..) {
                match node {
                    StubNode::Endpoint(..) => {}
                    StubNode::Methods(stubs) => pending.push(stubs.routes),
                    StubNode::Routes(tree) => pending.push(tree),
                }
            }
            match pending.pop() {
                Some(mut tree) => entries = std::mem::take(&mut tree.entries),
                None => break,
            }
        }
    }
}

impl<L> Branch for StubNode<L> {
    fn attach(&mut self, children: Vec<(String, Self)>) {
        match self {
            Self::Methods(stubs) => stubs.routes = StubTree { entries: children },
            Self::Routes(tree) => tree.entries = children,
            Self::Endpoint(..) => {}
        }
    }
}
