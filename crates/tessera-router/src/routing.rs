//! The declarative routing tree.

use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use tessera_core::Method;

/// Something that can be mounted in a [`Routing`] tree.
pub trait RouteTarget {
    /// Methods the target accepts, in declaration order.
    fn methods(&self) -> &[Method];
}

/// Options for a static file mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticOptions {
    /// File served for directory requests.
    pub index: Option<String>,
    /// Whether files and directories starting with `.` may be served.
    pub dotfiles: bool,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            index: Some("index.html".to_string()),
            dotfiles: false,
        }
    }
}

/// Marks a subtree as served from a directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeStatic {
    root: PathBuf,
    options: StaticOptions,
}

impl ServeStatic {
    /// Serves files below `root` with default options.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: StaticOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: StaticOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &StaticOptions {
        &self.options
    }
}

/// Different endpoints on the same path, keyed by method.
#[derive(Debug)]
pub struct DependsOnMethod<E> {
    endpoints: IndexMap<Method, Arc<E>>,
}

impl<E> Default for DependsOnMethod<E> {
    fn default() -> Self {
        Self {
            endpoints: IndexMap::new(),
        }
    }
}

impl<E> Clone for DependsOnMethod<E> {
    fn clone(&self) -> Self {
        Self {
            endpoints: self.endpoints.clone(),
        }
    }
}

impl<E> DependsOnMethod<E> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `endpoint` to `method`.
    #[must_use]
    pub fn with(mut self, method: Method, endpoint: impl Into<Arc<E>>) -> Self {
        self.endpoints.insert(method, endpoint.into());
        self
    }

    /// Returns the assigned methods in insertion order.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.endpoints.keys().copied()
    }

    /// Iterates the assignments.
    pub fn iter(&self) -> impl Iterator<Item = (Method, &Arc<E>)> {
        self.endpoints.iter().map(|(method, endpoint)| (*method, endpoint))
    }
}

/// One entry of a [`Routing`] tree.
#[derive(Debug)]
pub enum RoutingNode<E> {
    /// A nested subtree.
    Nested(Routing<E>),
    /// An endpoint served on every method it declares.
    Endpoint(Arc<E>),
    /// Endpoints selected by method.
    DependsOnMethod(DependsOnMethod<E>),
    /// A static file mount.
    Static(ServeStatic),
}

impl<E> Clone for RoutingNode<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Nested(routing) => Self::Nested(routing.clone()),
            Self::Endpoint(endpoint) => Self::Endpoint(Arc::clone(endpoint)),
            Self::DependsOnMethod(map) => Self::DependsOnMethod(map.clone()),
            Self::Static(serve) => Self::Static(serve.clone()),
        }
    }
}

/// An insertion-ordered tree of path segments.
///
/// Segments are trimmed when walked; an empty segment mounts its value on
/// the parent path.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tessera_core::Method;
/// use tessera_router::{RouteTarget, Routing};
///
/// struct Ping(Vec<Method>);
///
/// impl RouteTarget for Ping {
///     fn methods(&self) -> &[Method] {
///         &self.0
///     }
/// }
///
/// let routing = Routing::new().nest(
///     "v1",
///     Routing::new().endpoint("ping", Ping(vec![Method::Get])),
/// );
///
/// let routes = routing.collect_routes().unwrap();
/// assert_eq!(routes[0].path, "/v1/ping");
/// assert_eq!(routes[0].method, Method::Get);
/// ```
#[derive(Debug)]
pub struct Routing<E> {
    entries: IndexMap<String, RoutingNode<E>>,
}

impl<E> Default for Routing<E> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<E> Clone for Routing<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<E> Routing<E> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds any node under `segment`.
    #[must_use]
    pub fn entry(mut self, segment: impl Into<String>, node: RoutingNode<E>) -> Self {
        self.entries.insert(segment.into(), node);
        self
    }

    /// Adds a nested subtree.
    #[must_use]
    pub fn nest(self, segment: impl Into<String>, routing: Routing<E>) -> Self {
        self.entry(segment, RoutingNode::Nested(routing))
    }

    /// Adds an endpoint.
    #[must_use]
    pub fn endpoint(self, segment: impl Into<String>, endpoint: impl Into<Arc<E>>) -> Self {
        self.entry(segment, RoutingNode::Endpoint(endpoint.into()))
    }

    /// Adds endpoints selected by method.
    #[must_use]
    pub fn depends_on_method(self, segment: impl Into<String>, map: DependsOnMethod<E>) -> Self {
        self.entry(segment, RoutingNode::DependsOnMethod(map))
    }

    /// Adds a static file mount.
    #[must_use]
    pub fn serve_static(self, segment: impl Into<String>, serve: ServeStatic) -> Self {
        self.entry(segment, RoutingNode::Static(serve))
    }

    /// Returns the entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &RoutingNode<E>)> {
        self.entries.iter()
    }

    pub(crate) fn entries_map(&self) -> &IndexMap<String, RoutingNode<E>> {
        &self.entries
    }

    /// Returns `true` if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
