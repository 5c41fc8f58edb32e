//! Route declarations: the author-written tree of procedures.

use crate::RouterError;
use crate::procedure::Procedure;
use std::fmt;
use std::sync::Arc;

/// Deepest nesting of objects and arrays a hydration payload may reach.
///
/// Counts the payload's root object. Both the compiler and the encoder reject
/// declarations that go deeper, so every payload stays parseable by clients.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Ordered mapping from route keys to nodes.
///
/// Keys keep their insertion order; inserting an existing key replaces the
/// node in place.
///
/// ```rust,ignore
/// let api = Declaration::new()
///     .procedure("testGET", base.get().query(test_get))
///     .group("multipleMethods", vec![
///         base.get().query(list).into(),
///         base.post().input(json::<String>())?.query(create).into(),
///     ])
///     .route("admin", admin_routes());
/// ```
pub struct Declaration<Ctx: Clone + Send + Sync + 'static> {
    entries: Vec<(String, Node<Ctx>)>,
}

/// One value of a declaration.
pub enum Node<Ctx: Clone + Send + Sync + 'static> {
    /// A single procedure served at this key's path
    Procedure(Arc<Procedure<Ctx>>),
    /// Procedures sharing this key's path, plus at most one nested declaration
    Group(Vec<GroupItem<Ctx>>),
    /// A nested declaration extending the path
    Routes(Declaration<Ctx>),
}

/// One member of a procedure group.
pub enum GroupItem<Ctx: Clone + Send + Sync + 'static> {
    /// A procedure served at the group's path
    Procedure(Arc<Procedure<Ctx>>),
    /// Nested routes below the group's path
    Routes(Declaration<Ctx>),
}

impl<Ctx: Clone + Send + Sync + 'static> Declaration<Ctx> {
    /// Create an empty declaration
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a node
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<Node<Ctx>>) {
        let key = key.into();
        let node = node.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Builder-style [`Declaration::insert`] of a procedure
    pub fn procedure(mut self, key: impl Into<String>, procedure: Procedure<Ctx>) -> Self {
        self.insert(key, procedure);
        self
    }

    /// Builder-style [`Declaration::insert`] of a procedure group
    pub fn group(mut self, key: impl Into<String>, items: Vec<GroupItem<Ctx>>) -> Self {
        self.insert(key, Node::Group(items));
        self
    }

    /// Builder-style [`Declaration::insert`] of nested routes
    pub fn route(mut self, key: impl Into<String>, routes: Declaration<Ctx>) -> Self {
        self.insert(key, routes);
        self
    }

    /// Merge another declaration's keys into this one; its nodes win on conflict.
    pub fn merge(mut self, mut other: Declaration<Ctx>) -> Self {
        for (key, node) in std::mem::take(&mut other.entries) {
            self.insert(key, node);
        }
        self
    }

    /// Node stored under `key`
    pub fn get(&self, key: &str) -> Option<&Node<Ctx>> {
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
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Node<Ctx>)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the declaration has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Ctx: Clone + Send + Sync + 'static> Default for Declaration<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

// Nested declarations are detached onto a worklist so dropping a deep tree
// does not recurse.
impl<Ctx: Clone + Send + Sync + 'static> Drop for Declaration<Ctx> {
    fn drop(&mut self) {
        let mut pending = detach(&mut self.entries, Vec::new());
        while let Some(mut declaration) = pending.pop() {
            pending = detach(&mut declaration.entries, pending);
        }
    }
}

fn detach<Ctx: Clone + Send + Sync + 'static>(
    entries: &mut Vec<(String, Node<Ctx>)>,
    mut pending: Vec<Declaration<Ctx>>,
) -> Vec<Declaration<Ctx>> {
    for (_, node) in entries.drain(..) {
        match node {
            Node::Procedure(_) => {}
            Node::Group(items) => {
                pending.extend(items.into_iter().filter_map(|item| match item {
                    GroupItem::Procedure(_) => None,
                    GroupItem::Routes(routes) => Some(routes),
                }));
            }
            Node::Routes(routes) => pending.push(routes),
        }
    }
    pending
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for Declaration<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for Node<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedure(procedure) => fmt::Debug::fmt(procedure, f),
            Self::Group(items) => f.debug_list().entries(items).finish(),
            Self::Routes(routes) => fmt::Debug::fmt(routes, f),
        }
    }
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for GroupItem<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedure(procedure) => fmt::Debug::fmt(procedure, f),
            Self::Routes(routes) => fmt::Debug::fmt(routes, f),
        }
    }
}

impl<Ctx: Clone + Send + Sync + 'static> From<Procedure<Ctx>> for Node<Ctx> {
    fn from(procedure: Procedure<Ctx>) -> Self {
        Self::Procedure(Arc::new(procedure))
    }
}

impl<Ctx: Clone + Send + Sync + 'static> From<Declaration<Ctx>> for Node<Ctx> {
    fn from(routes: Declaration<Ctx>) -> Self {
        Self::Routes(routes)
    }
}

impl<Ctx: Clone + Send + Sync + 'static> From<Vec<GroupItem<Ctx>>> for Node<Ctx> {
    fn from(items: Vec<GroupItem<Ctx>>) -> Self {
        Self::Group(items)
    }
}

impl<Ctx: Clone + Send + Sync + 'static> From<Procedure<Ctx>> for GroupItem<Ctx> {
    fn from(procedure: Procedure<Ctx>) -> Self {
        Self::Procedure(Arc::new(procedure))
    }
}

impl<Ctx: Clone + Send + Sync + 'static> From<Declaration<Ctx>> for GroupItem<Ctx> {
    fn from(routes: Declaration<Ctx>) -> Self {
        Self::Routes(routes)
    }
}

/// Procedures and nested declarations of a group, in order.
pub(crate) fn split_group<Ctx: Clone + Send + Sync + 'static>(
    items: &[GroupItem<Ctx>],
) -> (Vec<&Arc<Procedure<Ctx>>>, Vec<&Declaration<Ctx>>) {
    let mut procedures = Vec::new();
    let mut routes = Vec::new();
    for item in items {
        match item {
            GroupItem::Procedure(procedure) => procedures.push(procedure),
            GroupItem::Routes(declaration) => routes.push(declaration),
        }
    }
    (procedures, routes)
}

/// Path of `key` below `parent` (`""` is the root).
pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", parent, key)
    }
}

/// Reject a container opened at `depth` below the node at `path`.
pub(crate) fn check_depth(path: &str, depth: usize) -> Result<(), RouterError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(RouterError::NestingTooDeep {
            path: path.to_string(),
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}
