//! The process-wide bound-parameter default.
//!
//! Kept in its own test binary: flipping the global would race with the
//! other tests.

use myqb::{Query, QueryConfig, default_bound_parameters, select, set_default_bound_parameters};

#[test]
fn test_default_applies_to_new_queries_only() {
    assert!(default_bound_parameters());

    let mut before = select();
    before.from("users").where_eq("name", "bob").unwrap();

    set_default_bound_parameters(false);
    let mut after = select();
    after.from("users").where_eq("name", "bob").unwrap();
    let explicit = Query::with_config(QueryConfig::new().bound_parameters(true));
    set_default_bound_parameters(true);

    assert_eq!(before.compile().unwrap().query, "SELECT * FROM `users` WHERE name = ?");
    assert_eq!(
        after.compile().unwrap().query,
        "SELECT * FROM `users` WHERE name = 'bob'"
    );
    assert!(after.compile().unwrap().data.is_empty());
    assert!(explicit.attributes().use_bound_parameters);
}
