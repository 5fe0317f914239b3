//! Property tests for the routing walker.

use proptest::prelude::*;
use std::sync::Arc;
use tessera_core::Method;
use tessera_router::{RouteTarget, Routing, RoutingError, Visit};

#[derive(Debug)]
struct Stub(Vec<Method>);

impl RouteTarget for Stub {
    fn methods(&self) -> &[Method] {
        &self.0
    }
}

fn method() -> impl Strategy<Value = Method> {
    prop::sample::select(Method::ALL.to_vec())
}

fn routing() -> impl Strategy<Value = Routing<Stub>> {
    let leaf = prop::collection::vec(("[a-z]{1,4}", prop::collection::btree_set(method(), 1..3)), 0..4)
        .prop_map(|entries| {
            entries.into_iter().fold(Routing::new(), |routing, (segment, methods)| {
                routing.endpoint(segment, Stub(methods.into_iter().collect()))
            })
        });
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop::collection::vec(("[a-z]{1,4}", inner), 0..3).prop_map(|entries| {
            entries
                .into_iter()
                .fold(Routing::new(), |routing, (segment, nested)| routing.nest(segment, nested))
        })
    })
}

fn describe(routing: &Routing<Stub>) -> Vec<Result<(Method, String), RoutingError>> {
    routing
        .walk()
        .map(|visit| {
            visit.map(|visit| match visit {
                Visit::Endpoint(entry) => (entry.method, entry.path),
                Visit::Static { path, .. } => (Method::Get, path),
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn walking_twice_yields_the_same_sequence(routing in routing()) {
        prop_assert_eq!(describe(&routing), describe(&routing));
    }

    #[test]
    fn successful_walks_never_repeat_a_route(routing in routing()) {
        if let Ok(routes) = routing.collect_routes() {
            let mut seen = std::collections::HashSet::new();
            for entry in routes {
                prop_assert!(seen.insert((entry.method, entry.path)));
            }
        }
    }
}

#[test]
fn test_shared_endpoint_on_two_paths() {
    let shared = Arc::new(Stub(vec![Method::Get, Method::Post]));
    let routing: Routing<Stub> = Routing::new()
        .endpoint("a", Arc::clone(&shared))
        .endpoint("b", shared);
    let routes = routing.collect_routes().unwrap();
    assert_eq!(routes.len(), 4);
    assert!(Arc::ptr_eq(&routes[0].endpoint, &routes[3].endpoint));
}
