//! Depth-first traversal of a [`Routing`] tree.

use crate::routing::{RouteTarget, Routing, RoutingNode, ServeStatic};
use indexmap::IndexSet;
use std::collections::VecDeque;
use std::sync::Arc;
use tessera_core::Method;
use thiserror::Error;

/// Errors found while walking a routing tree.
///
/// All of them are configuration mistakes and fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// A segment contains `/`.
    #[error("The entry '{segment}' must avoid having slashes: use nesting instead.")]
    SlashInSegment {
        /// The offending segment.
        segment: String,
    },

    /// The same method and path are registered twice.
    #[error("Route {method} {path} is defined more than once.")]
    DuplicateRoute {
        /// The method.
        method: Method,
        /// The path.
        path: String,
    },

    /// A `DependsOnMethod` entry points at an endpoint that does not accept the method.
    #[error("Endpoint assigned to {method} method of {path} must support {method} method.")]
    UnsupportedMethod {
        /// The method key.
        method: Method,
        /// The path.
        path: String,
    },
}

/// An endpoint registration produced by the walker.
#[derive(Debug)]
pub struct EndpointEntry<E> {
    /// Full path, e.g. `/v1/user/:id`.
    pub path: String,
    /// The method this entry is registered on.
    pub method: Method,
    /// The endpoint.
    pub endpoint: Arc<E>,
    /// Every method served on the same path by the same routing node.
    pub siblings: Vec<Method>,
}

impl<E> Clone for EndpointEntry<E> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method,
            endpoint: Arc::clone(&self.endpoint),
            siblings: self.siblings.clone(),
        }
    }
}

/// One item produced by [`Routing::walk`].
#[derive(Debug)]
pub enum Visit<E> {
    /// An endpoint registration.
    Endpoint(EndpointEntry<E>),
    /// A static file mount.
    Static {
        /// Mount path.
        path: String,
        /// The mount.
        serve: ServeStatic,
    },
}

impl<E> Clone for Visit<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Endpoint(entry) => Self::Endpoint(entry.clone()),
            Self::Static { path, serve } => Self::Static {
                path: path.clone(),
                serve: serve.clone(),
            },
        }
    }
}

type Entries<'a, E> = indexmap::map::Iter<'a, String, RoutingNode<E>>;

/// Lazy iterator returned by [`Routing::walk`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Walk<'a, E> {
    stack: Vec<(String, Entries<'a, E>)>,
    pending: VecDeque<Visit<E>>,
    seen: IndexSet<(Method, String)>,
    failed: bool,
}

impl<'a, E: RouteTarget> Walk<'a, E> {
    fn new(routing: &'a Routing<E>) -> Self {
        let entries = routing_entries(routing);
        Self {
            stack: vec![(String::new(), entries)],
            pending: VecDeque::new(),
            seen: IndexSet::new(),
            failed: false,
        }
    }

    fn register(&mut self, entry: EndpointEntry<E>) -> Result<(), RoutingError> {
        if !self.seen.insert((entry.method, entry.path.clone())) {
            return Err(RoutingError::DuplicateRoute {
                method: entry.method,
                path: entry.path,
            });
        }
        self.pending.push_back(Visit::Endpoint(entry));
        Ok(())
    }

    fn expand(&mut self, parent: &str, segment: &str, node: &'a RoutingNode<E>) -> Result<(), RoutingError> {
        let segment = segment.trim();
        if segment.contains('/') {
            return Err(RoutingError::SlashInSegment {
                segment: segment.to_string(),
            });
        }
        let path = if segment.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}/{segment}")
        };
        match node {
            RoutingNode::Nested(routing) => {
                self.stack.push((path, routing_entries(routing)));
            }
            RoutingNode::Endpoint(endpoint) => {
                let path = display_path(path);
                let siblings = endpoint.methods().to_vec();
                for method in &siblings {
                    self.register(EndpointEntry {
                        path: path.clone(),
                        method: *method,
                        endpoint: Arc::clone(endpoint),
                        siblings: siblings.clone(),
                    })?;
                }
            }
            RoutingNode::DependsOnMethod(map) => {
                let path = display_path(path);
                let siblings: Vec<Method> = map.methods().collect();
                for (method, endpoint) in map.iter() {
                    if !endpoint.methods().contains(&method) {
                        return Err(RoutingError::UnsupportedMethod { method, path });
                    }
                    self.register(EndpointEntry {
                        path: path.clone(),
                        method,
                        endpoint: Arc::clone(endpoint),
                        siblings: siblings.clone(),
                    })?;
                }
            }
            RoutingNode::Static(serve) => {
                self.pending.push_back(Visit::Static {
                    path: display_path(path),
                    serve: serve.clone(),
                });
            }
        }
        Ok(())
    }
}

impl<E: RouteTarget> Iterator for Walk<'_, E> {
    type Item = Result<Visit<E>, RoutingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(visit) = self.pending.pop_front() {
                return Some(Ok(visit));
            }
            let (parent, next) = {
                let (parent, entries) = self.stack.last_mut()?;
                (parent.clone(), entries.next())
            };
            match next {
                Some((segment, node)) => {
                    if let Err(err) = self.expand(&parent, segment, node) {
                        self.failed = true;
                        self.pending.clear();
                        return Some(Err(err));
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl<E: RouteTarget> std::iter::FusedIterator for Walk<'_, E> {}

fn routing_entries<E>(routing: &Routing<E>) -> Entries<'_, E> {
    routing.entries_map().iter()
}

fn display_path(path: String) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

impl<E: RouteTarget> Routing<E> {
    /// Walks the tree depth-first in insertion order.
    ///
    /// A bare endpoint yields one entry per declared method; a
    /// `DependsOnMethod` yields one entry per key. Walking is pure: the same
    /// tree always produces the same sequence.
    pub fn walk(&self) -> Walk<'_, E> {
        Walk::new(self)
    }

    /// Collects every endpoint entry, failing on the first error.
    pub fn collect_routes(&self) -> Result<Vec<EndpointEntry<E>>, RoutingError> {
        let mut routes = Vec::new();
        for visit in self.walk() {
            if let Visit::Endpoint(entry) = visit? {
                routes.push(entry);
            }
        }
        Ok(routes)
    }

    /// Collects every visit, failing on the first error.
    pub fn collect_visits(&self) -> Result<Vec<Visit<E>>, RoutingError> {
        self.walk().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::DependsOnMethod;

    #[derive(Debug)]
    struct Stub(Vec<Method>);

    impl RouteTarget for Stub {
        fn methods(&self) -> &[Method] {
            &self.0
        }
    }

    fn get() -> Stub {
        Stub(vec![Method::Get])
    }

    fn paths(routing: &Routing<Stub>) -> Vec<(Method, String)> {
        routing
            .collect_routes()
            .unwrap()
            .into_iter()
            .map(|entry| (entry.method, entry.path))
            .collect()
    }

    #[test]
    fn test_nested_param_path() {
        let routing = Routing::new().nest(
            "v1",
            Routing::new().nest("user", Routing::new().endpoint(":id", get())),
        );
        assert_eq!(paths(&routing), vec![(Method::Get, "/v1/user/:id".to_string())]);
    }

    #[test]
    fn test_empty_and_trimmed_segments() {
        let shared = Arc::new(get());
        let routing = Routing::new().nest(
            "v1",
            Routing::new().nest(
                "user",
                Routing::new().nest(
                    ":id",
                    Routing::new()
                        .endpoint("", Arc::clone(&shared))
                        .endpoint(" download ", shared),
                ),
            ),
        );
        assert_eq!(
            paths(&routing),
            vec![
                (Method::Get, "/v1/user/:id".to_string()),
                (Method::Get, "/v1/user/:id/download".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_endpoint() {
        let routing = Routing::new().endpoint("", get());
        assert_eq!(paths(&routing), vec![(Method::Get, "/".to_string())]);
    }

    #[test]
    fn test_slash_in_segment() {
        let routing = Routing::new().nest("v1", Routing::new().endpoint("user/retrieve", get()));
        let err = routing.collect_routes().unwrap_err();
        assert_eq!(
            err,
            RoutingError::SlashInSegment {
                segment: "user/retrieve".into()
            }
        );
    }

    #[test]
    fn test_duplicate_route() {
        let routing = Routing::new()
            .endpoint("a", get())
            .endpoint(" a ", get());
        let err = routing.collect_routes().unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateRoute { method: Method::Get, .. }));
    }

    #[test]
    fn test_depends_on_method_siblings() {
        let both = Arc::new(Stub(vec![Method::Put, Method::Patch]));
        let routing = Routing::new().depends_on_method(
            "hello",
            DependsOnMethod::new()
                .with(Method::Get, get())
                .with(Method::Post, Stub(vec![Method::Post]))
                .with(Method::Put, Arc::clone(&both))
                .with(Method::Patch, both),
        );
        let routes = routing.collect_routes().unwrap();
        assert_eq!(routes.len(), 4);
        assert_eq!(
            routes[0].siblings,
            vec![Method::Get, Method::Post, Method::Put, Method::Patch]
        );
    }

    #[test]
    fn test_depends_on_method_unsupported() {
        let both = Arc::new(Stub(vec![Method::Put, Method::Patch]));
        let routing = Routing::new().nest(
            "v1",
            Routing::<Stub>::new().depends_on_method(
                "user",
                DependsOnMethod::new()
                    .with(Method::Put, Arc::clone(&both))
                    .with(Method::Patch, Arc::clone(&both))
                    .with(Method::Post, both),
            ),
        );
        let err = routing.collect_routes().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Endpoint assigned to POST method of /v1/user must support POST method."
        );
    }

    #[test]
    fn test_walk_is_lazy_and_fused() {
        let routing = Routing::new()
            .endpoint("ok", get())
            .endpoint("bad/one", get())
            .endpoint("never", get());
        let mut walk = routing.walk();
        assert!(matches!(walk.next(), Some(Ok(Visit::Endpoint(_)))));
        assert!(matches!(walk.next(), Some(Err(_))));
        assert!(walk.next().is_none());
    }

    #[test]
    fn test_static_mount() {
        let routing: Routing<Stub> = Routing::new().serve_static("public", ServeStatic::new("./assets"));
        let visits = routing.collect_visits().unwrap();
        assert!(matches!(&visits[0], Visit::Static { path, .. } if path == "/public"));
    }
}
