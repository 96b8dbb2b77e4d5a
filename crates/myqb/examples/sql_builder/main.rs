//! Example demonstrating myqb's fluent statement builder.
//!
//! Run with:
//!   cargo run --example sql_builder -p myqb

use myqb::{Column, Fields, JoinOptions, Operand, QbResult, Query, Value, delete_from, insert, select, update};
use std::convert::Infallible;

fn list_active_users(search: Option<&str>, page: u64) -> QbResult<Query> {
    let mut q = select();
    q.columns(["u.id", "u.name", "COUNT(p.id) AS posts"])?
        .from_as("users", "u")
        .left_join_with(
            "posts",
            JoinOptions::new()
                .alias("p")
                .on(Fields::new().field("p.userid", "u.id")),
        )?
        .where_clause(Fields::new().field("u.active", true).not().field("u.role", "guest"))?
        .group_by(["u.id"])
        .order_by(["posts DESC"])
        .limit_offset(20, page * 20);

    if let Some(search) = search {
        q.where_like(["u.name", "u.email"], format!("%{search}%"))?;
    }

    Ok(q)
}

fn top_spenders() -> QbResult<Query> {
    let mut totals = select();
    totals
        .columns(["userid", "SUM(total) AS spent"])?
        .from("orders")
        .where_in_range("created", Value::from("2024-01-01"), Value::Null)?
        .group_by(["userid"]);

    let mut q = select();
    q.columns(["u.name", "t.spent"])?
        .from_as("users", "u")
        .inner_join_with(&totals, JoinOptions::new().alias("t").on("t.userid = u.id"))?
        .order_by(["t.spent DESC"])
        .limit(10);
    Ok(q)
}

fn main() -> QbResult<()> {
    println!("=== select with join ===");
    let q = list_active_users(Some("bob"), 1)?;
    let compiled = q.compile()?;
    println!("{}", compiled.query);
    println!("data: {:?}", compiled.data);
    println!("literal: {}", q.to_literal_sql()?);

    println!("\n=== sub-query join ===");
    println!("{}", top_spenders()?.compile()?.query);

    println!("\n=== column sub-query ===");
    let mut orders = select();
    orders
        .columns(["COUNT(*)"])?
        .from("orders")
        .where_clause("orders.userid = u.id")?
        .as_name("order_count");
    let mut q = select();
    q.columns([Column::from("u.id"), Column::from(&orders)])?
        .from_as("users", "u");
    println!("{}", q.compile()?.query);

    println!("\n=== insert ===");
    let mut q = insert();
    q.into_table("users").set_fields(
        Fields::new()
            .field("name", "Bob")
            .field("email", "bob@example.com")
            .field("created", Operand::raw("NOW()")),
    )?;
    println!("{}", q.compile()?.query);

    println!("\n=== multi-row insert ===");
    let mut q = insert();
    q.into_table("tags").columns(["name", "weight"])?;
    for (name, weight) in [("rust", 3), ("sql", 2), ("mysql", 1)] {
        q.add_row_values([Operand::from(name), Operand::from(weight)])?;
    }
    let compiled = q.compile()?;
    println!("{}", compiled.query);
    println!("data: {:?}", compiled.data);

    println!("\n=== update ===");
    let mut q = update("users");
    q.set_with("name", "bob", Some("UPPER"))?
        .set_raw("updated = NOW()")
        .where_eq("id", vec![1, 2, 3])?;
    println!("{}", q.compile()?.query);

    println!("\n=== delete ===");
    let mut q = delete_from("sessions");
    q.where_op("expires", Value::from("2024-01-01 00:00:00"), "<")?;
    println!("{}", q.compile()?.query);

    println!("\n=== exec with a closure ===");
    let mut runner = |sql: &str, values: &[Value]| -> Result<usize, Infallible> {
        println!("would run: {sql} with {} value(s)", values.len());
        Ok(0)
    };
    q.exec(&mut runner)?;

    println!("\n=== precondition errors ===");
    let mut q = update("users");
    q.set("name", "bob")?;
    match q.compile() {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("refused: {e}"),
    }

    Ok(())
}
