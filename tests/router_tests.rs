//! Resolution properties of the routing table.
//!
//! The table is generic over the stored binding, so these tests register
//! plain string markers and assert on identity — no coroutines involved.

use microrouter::{RouteError, RouteTable};

#[test]
fn test_resolve_is_case_insensitive_on_path_and_method() {
    let mut table = RouteTable::new();
    table.add_handler("/items", "GET", "list_items");

    for (path, method) in [
        ("/items", "GET"),
        ("/items", "get"),
        ("/Items", "Get"),
        ("/ITEMS", "gEt"),
    ] {
        assert_eq!(
            table.resolve(path, method),
            Ok(&"list_items"),
            "case variant ({path}, {method}) should resolve"
        );
    }
}

#[test]
fn test_unregistered_path_is_no_handler_for_path() {
    let mut table = RouteTable::new();
    table.add_handler("/items", "get", "list_items");

    assert_eq!(
        table.resolve("/missing", "get"),
        Err(RouteError::NoHandlerForPath)
    );
}

#[test]
fn test_unregistered_method_is_method_not_supported() {
    let mut table = RouteTable::new();
    table.add_handler("/items", "get", "list_items");
    table.add_handler("/items", "post", "create_item");

    assert_eq!(
        table.resolve("/items", "DELETE"),
        Err(RouteError::MethodNotSupported {
            allowed: vec!["GET".to_string(), "POST".to_string()],
        })
    );
}

#[test]
fn test_duplicate_registration_replaces_first_handler() {
    let mut table = RouteTable::new();
    table.add_handler("/items", "get", "first");
    table.add_handler("/Items", "GET", "second");

    assert_eq!(table.resolve("/items", "get"), Ok(&"second"));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_same_path_different_methods_coexist() {
    let mut table = RouteTable::new();
    table.add_handler("/items", "get", "list_items");
    table.add_handler("/items", "post", "create_item");

    assert_eq!(table.resolve("/items", "GET"), Ok(&"list_items"));
    assert_eq!(table.resolve("/items", "POST"), Ok(&"create_item"));
}
