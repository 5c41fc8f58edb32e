//! Router compilation: flattening a declaration into a path table.

use super::declaration::{Declaration, Node, check_depth, join_path, split_group};
use crate::hydrate::{Shape, encode};
use crate::procedure::Procedure;
use crate::validation::validate_route_key;
use crate::{Method, RouterError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Procedures registered at one path, by method.
pub struct MethodTable<Ctx: Clone + Send + Sync + 'static> {
    procedures: BTreeMap<Method, Arc<Procedure<Ctx>>>,
}

impl<Ctx: Clone + Send + Sync + 'static> MethodTable<Ctx> {
    fn new() -> Self {
        Self {
            procedures: BTreeMap::new(),
        }
    }

    /// Procedure bound to `method`
    pub fn get(&self, method: Method) -> Option<&Arc<Procedure<Ctx>>> {
        self.procedures.get(&method)
    }

    /// Methods served at this path, in canonical order
    pub fn methods(&self) -> Vec<Method> {
        self.procedures.keys().copied().collect()
    }

    /// Whether no procedure is registered at this path
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    fn register(&mut self, path: &str, procedure: &Arc<Procedure<Ctx>>) {
        let method = procedure.method();
        if method != Method::Get && !procedure.is_typed() {
            warn!(
                path = %path,
                method = %method,
                "Untyped procedure bound to a non-GET method is unreachable"
            );
        }
        if self
            .procedures
            .insert(method, Arc::clone(procedure))
            .is_some()
        {
            warn!(path = %path, method = %method, "Procedure registered twice; keeping the later one");
        }
    }
}

/// Compiled, immutable index of a route declaration.
///
/// Built once with [`Router::new`]; afterwards it is only read, so a single
/// instance can be shared across any number of concurrent dispatches.
pub struct Router<Ctx: Clone + Send + Sync + 'static> {
    declaration: Declaration<Ctx>,
    table: HashMap<String, MethodTable<Ctx>>,
    shape: Shape,
}

impl<Ctx: Clone + Send + Sync + 'static> Router<Ctx> {
    /// Compile a declaration.
    ///
    /// The walk uses an explicit stack and visits keys depth-first in
    /// declaration order. A later registration of the same path and method
    /// replaces the earlier one. Declarations whose hydration payload would
    /// nest deeper than [`MAX_NESTING_DEPTH`](super::MAX_NESTING_DEPTH) are
    /// rejected. Construction either fully succeeds or fails.
    pub fn new(declaration: Declaration<Ctx>) -> Result<Self, RouterError> {
        let table = compile(&declaration)?;
        let shape = encode(&declaration)?;
        debug!(paths = table.len(), "Router compiled");
        Ok(Self {
            declaration,
            table,
            shape,
        })
    }

    /// Whether `path` is a known path
    pub fn includes(&self, path: &str) -> bool {
        self.table.contains_key(path)
    }

    /// Method table of `path`
    pub fn get_path(&self, path: &str) -> Option<&MethodTable<Ctx>> {
        self.table.get(path)
    }

    /// Procedure registered at `path` for `method`
    pub fn procedure(&self, path: &str, method: Method) -> Option<&Arc<Procedure<Ctx>>> {
        self.table.get(path).and_then(|methods| methods.get(method))
    }

    /// All known paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.table.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Hydration shape of the declaration
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The declaration this router was compiled from
    pub fn declaration(&self) -> &Declaration<Ctx> {
        &self.declaration
    }
}

impl<Ctx: Clone + Send + Sync + 'static> std::fmt::Debug for Router<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("paths", &self.paths())
            .finish()
    }
}

fn compile<Ctx: Clone + Send + Sync + 'static>(
    declaration: &Declaration<Ctx>,
) -> Result<HashMap<String, MethodTable<Ctx>>, RouterError> {
    let mut table: HashMap<String, MethodTable<Ctx>> = HashMap::new();
    // (path, node, nesting depth of the container holding the node)
    let mut stack: Vec<(String, &Node<Ctx>, usize)> = Vec::new();
    push_entries(&mut stack, "", declaration, 1)?;

    while let Some((path, node, depth)) = stack.pop() {
        match node {
            Node::Procedure(procedure) => {
                trace!(path = %path, method = %procedure.method(), "Registering procedure");
                table
                    .entry(path.clone())
                    .or_insert_with(MethodTable::new)
                    .register(&path, procedure);
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
                let methods = table.entry(path.clone()).or_insert_with(MethodTable::new);
                for procedure in procedures {
                    trace!(path = %path, method = %procedure.method(), "Registering grouped procedure");
                    methods.register(&path, procedure);
                }
                if let Some(nested) = routes.first().filter(|nested| !nested.is_empty()) {
                    check_depth(&path, depth + 2)?;
                    push_entries(&mut stack, &path, nested, depth + 2)?;
                }
            }
            Node::Routes(nested) => {
                check_depth(&path, depth + 1)?;
                push_entries(&mut stack, &path, nested, depth + 1)?;
            }
        }
    }

    Ok(table)
}

fn push_entries<'a, Ctx: Clone + Send + Sync + 'static>(
    stack: &mut Vec<(String, &'a Node<Ctx>, usize)>,
    parent: &str,
    declaration: &'a Declaration<Ctx>,
    depth: usize,
) -> Result<(), RouterError> {
    for (key, node) in declaration.iter().rev() {
        validate_route_key(key, parent)?;
        stack.push((join_path(parent, key), node, depth));
    }
    Ok(())
}
