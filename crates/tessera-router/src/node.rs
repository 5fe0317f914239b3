//! Segment tree used to dispatch concrete request paths.
//!
//! Patterns use the same syntax as the routing tree: `:name` captures one
//! segment, and a trailing `*name` captures the rest of the path (possibly
//! empty).

use crate::params::{rewind, Params};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentKind {
    Static(String),
    Param(String),
    Wildcard(String),
}

impl SegmentKind {
    fn parse(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            Self::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            Self::Wildcard(name.to_string())
        } else {
            Self::Static(segment.to_string())
        }
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    segment: String,
    value: Option<T>,
    static_children: Vec<Node<T>>,
    param_child: Option<(String, Box<Node<T>>)>,
    wildcard_child: Option<(String, Box<Node<T>>)>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            value: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    fn insert(&mut self, segments: &[SegmentKind], value: T) -> Option<T> {
        let Some((first, remaining)) = segments.split_first() else {
            return self.value.replace(value);
        };
        match first {
            SegmentKind::Static(segment) => {
                let index = match self
                    .static_children
                    .binary_search_by(|child| child.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new(segment.clone()));
                        index
                    }
                };
                self.static_children[index].insert(remaining, value)
            }
            SegmentKind::Param(name) => {
                let (_, child) = self
                    .param_child
                    .get_or_insert_with(|| (name.clone(), Box::new(Node::new(format!(":{name}")))));
                child.insert(remaining, value)
            }
            SegmentKind::Wildcard(name) => {
                let (_, child) = self
                    .wildcard_child
                    .get_or_insert_with(|| (name.clone(), Box::new(Node::new(format!("*{name}")))));
                child.value.replace(value)
            }
        }
    }

    fn find<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a T> {
        if let Some((first, remaining)) = segments.split_first() {
            if let Ok(index) = self
                .static_children
                .binary_search_by(|child| child.segment.as_str().cmp(first))
            {
                if let Some(found) = self.static_children[index].find(remaining, params) {
                    return Some(found);
                }
            }
            if let Some((name, child)) = &self.param_child {
                let mark = params.len();
                params.push(name.clone(), (*first).to_string());
                if let Some(found) = child.find(remaining, params) {
                    return Some(found);
                }
                rewind(params, mark);
            }
        } else if let Some(value) = &self.value {
            return Some(value);
        }
        let (name, child) = self.wildcard_child.as_ref()?;
        let value = child.value.as_ref()?;
        params.push(name.clone(), segments.join("/"));
        Some(value)
    }
}

/// Maps path patterns to values.
///
/// Static segments win over parameters, which win over wildcards.
///
/// # Example
///
/// ```rust
/// use tessera_router::PathTree;
///
/// let mut tree = PathTree::new();
/// tree.insert("/v1/user/:id", "user");
/// tree.insert("/v1/user/me", "me");
///
/// let (value, params) = tree.find("/v1/user/42").unwrap();
/// assert_eq!(*value, "user");
/// assert_eq!(params.get("id"), Some("42"));
///
/// let (value, _) = tree.find("/v1/user/me").unwrap();
/// assert_eq!(*value, "me");
/// ```
#[derive(Debug, Clone)]
pub struct PathTree<T> {
    root: Node<T>,
    len: usize,
}

impl<T> Default for PathTree<T> {
    fn default() -> Self {
        Self {
            root: Node::new(""),
            len: 0,
        }
    }
}

impl<T> PathTree<T> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pattern, returning the value it replaces.
    pub fn insert(&mut self, pattern: &str, value: T) -> Option<T> {
        let segments: Vec<SegmentKind> = split(pattern).map(SegmentKind::parse).collect();
        let replaced = self.root.insert(&segments, value);
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// Finds the value for a concrete path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<(&T, Params)> {
        let segments: Vec<&str> = split(path).collect();
        let mut params = Params::new();
        let value = self.root.find(&segments, &mut params)?;
        Some((value, params))
    }

    /// Returns a mutable reference to the value stored for an exact pattern.
    pub fn get_mut(&mut self, pattern: &str) -> Option<&mut T> {
        let mut node = &mut self.root;
        for segment in split(pattern).map(SegmentKind::parse) {
            node = match segment {
                SegmentKind::Static(segment) => {
                    let index = node
                        .static_children
                        .binary_search_by(|child| child.segment.as_str().cmp(&segment))
                        .ok()?;
                    &mut node.static_children[index]
                }
                SegmentKind::Param(_) => node.param_child.as_mut().map(|(_, child)| child.as_mut())?,
                SegmentKind::Wildcard(_) => node.wildcard_child.as_mut().map(|(_, child)| child.as_mut())?,
            };
        }
        node.value.as_mut()
    }

    /// Returns the number of stored patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no pattern is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
