//! Planner integration tests

use shardplan::planner::{DeletePlan, PlanTree, PlanType, PlannerError};
use shardplan::router::mock::mock_router;
use shardplan::router::{RouterConfig, TableConfig, TableKind};
use shardplan::sql::{DeleteStatement, Parser};

/// Build one DELETE against the fixture topology and return its JSON
fn plan_json(database: &str, sql: &str) -> Result<String, PlannerError> {
    let router = mock_router("sbtest");
    let stmt = Parser::parse_delete(sql).unwrap();
    let mut plan = DeletePlan::new(database, sql, &stmt, &router);
    plan.build()?;
    assert_eq!(plan.plan_type(), PlanType::Delete);
    plan.to_json()
}

/// Backends a DELETE reaches, in output order
fn plan_backends(sql: &str) -> Vec<String> {
    let router = mock_router("sbtest");
    let stmt = Parser::parse_delete(sql).unwrap();
    let mut plan = DeletePlan::new("sbtest", sql, &stmt, &router);
    plan.build().unwrap();
    plan.partitions().iter().map(|p| p.backend.clone()).collect()
}

// ============ Serialized Plans ============

#[test]
fn test_delete_plans() {
    let cases = [
        (
            "delete LOW_PRIORITY LOW_PRIORITY from sbtest.A where id=1",
            r#"{
	"RawQuery": "delete LOW_PRIORITY LOW_PRIORITY from sbtest.A where id=1",
	"Partitions": [
		{
			"Query": "delete low_priority low_priority from sbtest.A6 where id = 1",
			"Backend": "backend6",
			"Range": "[512-4096)"
		}
	]
}"#,
        ),
        (
            "delete QUICK QUICK from sbtest.A where id=1 order by xx",
            r#"{
	"RawQuery": "delete QUICK QUICK from sbtest.A where id=1 order by xx",
	"Partitions": [
		{
			"Query": "delete quick quick from sbtest.A6 where id = 1 order by xx asc",
			"Backend": "backend6",
			"Range": "[512-4096)"
		}
	]
}"#,
        ),
        (
            "delete IGNORE IGNORE from sbtest.A where name='xx'",
            r#"{
	"RawQuery": "delete IGNORE IGNORE from sbtest.A where name='xx'",
	"Partitions": [
		{
			"Query": "delete ignore ignore from sbtest.A1 where name = 'xx'",
			"Backend": "backend1",
			"Range": "[0-32)"
		},
		{
			"Query": "delete ignore ignore from sbtest.A2 where name = 'xx'",
			"Backend": "backend2",
			"Range": "[32-64)"
		},
		{
			"Query": "delete ignore ignore from sbtest.A3 where name = 'xx'",
			"Backend": "backend3",
			"Range": "[64-96)"
		},
		{
			"Query": "delete ignore ignore from sbtest.A4 where name = 'xx'",
			"Backend": "backend4",
			"Range": "[96-256)"
		},
		{
			"Query": "delete ignore ignore from sbtest.A5 where name = 'xx'",
			"Backend": "backend5",
			"Range": "[256-512)"
		},
		{
			"Query": "delete ignore ignore from sbtest.A6 where name = 'xx'",
			"Backend": "backend6",
			"Range": "[512-4096)"
		}
	]
}"#,
        ),
        (
            "delete LOW_PRIORITY QUICK IGNORE from sbtest.A where id in (1, 2,3)",
            r#"{
	"RawQuery": "delete LOW_PRIORITY QUICK IGNORE from sbtest.A where id in (1, 2,3)",
	"Partitions": [
		{
			"Query": "delete low_priority quick ignore from sbtest.A6 where id in (1, 2, 3)",
			"Backend": "backend6",
			"Range": "[512-4096)"
		}
	]
}"#,
        ),
        (
            "delete from sbtest.G where id in (1, 2,3)",
            r#"{
	"RawQuery": "delete from sbtest.G where id in (1, 2,3)",
	"Partitions": [
		{
			"Query": "delete from sbtest.G where id in (1, 2, 3)",
			"Backend": "backend1",
			"Range": ""
		},
		{
			"Query": "delete from sbtest.G where id in (1, 2, 3)",
			"Backend": "backend2",
			"Range": ""
		}
	]
}"#,
        ),
        (
            "delete from sbtest.S where id in (1, 2,3)",
            r#"{
	"RawQuery": "delete from sbtest.S where id in (1, 2,3)",
	"Partitions": [
		{
			"Query": "delete from sbtest.S where id in (1, 2, 3)",
			"Backend": "backend1",
			"Range": ""
		}
	]
}"#,
        ),
        (
            "delete from sbtest.A order by xx limit 1",
            r#"{
	"RawQuery": "delete from sbtest.A order by xx limit 1",
	"Partitions": [
		{
			"Query": "delete from sbtest.A1 order by xx asc limit 1",
			"Backend": "backend1",
			"Range": "[0-32)"
		},
		{
			"Query": "delete from sbtest.A2 order by xx asc limit 1",
			"Backend": "backend2",
			"Range": "[32-64)"
		},
		{
			"Query": "delete from sbtest.A3 order by xx asc limit 1",
			"Backend": "backend3",
			"Range": "[64-96)"
		},
		{
			"Query": "delete from sbtest.A4 order by xx asc limit 1",
			"Backend": "backend4",
			"Range": "[96-256)"
		},
		{
			"Query": "delete from sbtest.A5 order by xx asc limit 1",
			"Backend": "backend5",
			"Range": "[256-512)"
		},
		{
			"Query": "delete from sbtest.A6 order by xx asc limit 1",
			"Backend": "backend6",
			"Range": "[512-4096)"
		}
	]
}"#,
        ),
        (
            "delete from sbtest.G order by xx limit 2",
            r#"{
	"RawQuery": "delete from sbtest.G order by xx limit 2",
	"Partitions": [
		{
			"Query": "delete from sbtest.G order by xx asc limit 2",
			"Backend": "backend1",
			"Range": ""
		},
		{
			"Query": "delete from sbtest.G order by xx asc limit 2",
			"Backend": "backend2",
			"Range": ""
		}
	]
}"#,
        ),
        (
            "delete from sbtest.S",
            r#"{
	"RawQuery": "delete from sbtest.S",
	"Partitions": [
		{
			"Query": "delete from sbtest.S",
			"Backend": "backend1",
			"Range": ""
		}
	]
}"#,
        ),
    ];

    for (sql, want) in cases {
        assert_eq!(plan_json("sbtest", sql).unwrap(), want, "{}", sql);
    }
}

#[test]
fn test_built_plans_join_a_tree() {
    let router = mock_router("sbtest");
    let queries = [
        "delete from sbtest.A where id=1",
        "delete from sbtest.G",
        "delete from sbtest.S",
    ];
    let stmts: Vec<DeleteStatement> = queries
        .iter()
        .map(|q| Parser::parse_delete(q).unwrap())
        .collect();

    let mut tree = PlanTree::new();
    for (query, stmt) in queries.iter().zip(&stmts) {
        let mut plan = DeletePlan::new("sbtest", *query, stmt, &router);
        plan.build().unwrap();
        tree.add(plan).unwrap();
    }
    tree.build().unwrap();

    let counts: Vec<usize> = tree.iter().map(|p| p.partitions().len()).collect();
    assert_eq!(counts, vec![1, 2, 1]);
    assert_eq!(tree.into_plans().unwrap().len(), 3);
}

// ============ Unsupported Statements ============

#[test]
fn test_unsupported_deletes() {
    let cases = [
        (
            "delete from sbtest.A where id in (select id from t1)",
            "unsupported: subqueries.in.delete",
        ),
        (
            "DELETE a1,a2 FROM db1.t1, db2.t2",
            "unsupported: currently.not.support.multitables.in.delete",
        ),
        (
            "delete a1, a2 from db3.t1 as a1, db4.t2 as a2",
            "unsupported: currently.not.support.multitables.in.delete",
        ),
        (
            "delete a from a join b on a.id = b.id where b.name = 'test'",
            "unsupported: currently.not.support.multitables.in.delete",
        ),
        (
            "DELETE FROM t1, alias USING t1, t2 alias WHERE t1.a = alias.a",
            "unsupported: currently.not.support.multitables.in.delete",
        ),
        (
            "delete from t partition (p0) where a = 1",
            "unsupported: currently.not.support.partitions.in.delete",
        ),
    ];

    for (sql, want) in cases {
        let err = plan_json("sbtest", sql).unwrap_err();
        assert_eq!(err.to_string(), want, "{}", sql);
    }
}

#[test]
fn test_subquery_anywhere_in_where() {
    for sql in [
        "delete from sbtest.A where exists (select 1 from t1)",
        "delete from sbtest.A where id = (select max(id) from t1)",
        "delete from sbtest.A where name = 'x' and (id = 1 or id in (select id from t1))",
    ] {
        let err = plan_json("sbtest", sql).unwrap_err();
        assert_eq!(err.to_string(), "unsupported: subqueries.in.delete", "{}", sql);
    }
}

#[test]
fn test_empty_database_fails_tree_build() {
    let router = mock_router("sbtest");
    let query = "delete from A where id=1";
    let stmt = Parser::parse_delete(query).unwrap();

    let mut tree = PlanTree::new();
    tree.add(DeletePlan::new("", query, &stmt, &router)).unwrap();
    let err = tree.build().unwrap_err();
    assert_eq!(err.to_string(), "database can't be empty");
    assert!(!tree.is_built());
}

// ============ Routing ============

#[test]
fn test_in_list_union_is_router_ordered() {
    assert_eq!(
        plan_backends("delete from sbtest.A where id in (173, 1, 156)"),
        vec!["backend1", "backend2", "backend6"]
    );
    assert_eq!(
        plan_backends("delete from sbtest.A where id in (1, 2, 3)"),
        vec!["backend6"]
    );
}

#[test]
fn test_broadcast_without_shard_predicate() {
    for sql in [
        "delete from sbtest.A",
        "delete from sbtest.A where name = 'bob'",
        "delete from sbtest.A where id = 1 or name = 'bob'",
        "delete from sbtest.A where id + 1 = 2",
        "delete from sbtest.A where id between 1 and 3",
    ] {
        assert_eq!(plan_backends(sql).len(), 6, "{}", sql);
    }
}

#[test]
fn test_global_and_single_ignore_where() {
    for sql in [
        "delete from sbtest.G",
        "delete from sbtest.G where id = 156",
        "delete from sbtest.G where name = 'x' or id > 2",
    ] {
        assert_eq!(plan_backends(sql), vec!["backend1", "backend2"], "{}", sql);
    }
    assert_eq!(plan_backends("delete from sbtest.S where id = 173"), vec!["backend1"]);
}

#[test]
fn test_unqualified_table_uses_plan_database() {
    let json = plan_json("sbtest", "delete from A where id = 156").unwrap();
    assert!(json.contains("\"Query\": \"delete from sbtest.A1 where id = 156\""));
}

#[test]
fn test_custom_topology() {
    let config = RouterConfig::from_json(
        r#"{
            "slots": 16,
            "schemas": [{
                "database": "shop",
                "tables": [{
                    "name": "orders",
                    "kind": "sharded",
                    "shard_key": "user_id",
                    "partitions": [
                        { "backend": "east", "suffix": "_0000", "segment": "0-8" },
                        { "backend": "west", "suffix": "_0001", "segment": "8-16" }
                    ]
                }]
            }]
        }"#,
    )
    .unwrap();
    let router = shardplan::router::Router::from_config(&config).unwrap();
    let sql = "delete from orders where status = 'void'";
    let stmt = Parser::parse_delete(sql).unwrap();
    let mut plan = DeletePlan::new("shop", sql, &stmt, &router);
    plan.build().unwrap();

    let queries: Vec<&str> = plan.partitions().iter().map(|p| p.query.as_str()).collect();
    assert_eq!(
        queries,
        vec![
            "delete from shop.orders_0000 where status = 'void'",
            "delete from shop.orders_0001 where status = 'void'",
        ]
    );
    assert_eq!(plan.partitions()[1].range, "[8-16)");
}

#[test]
fn test_table_added_at_runtime() {
    let router = mock_router("sbtest");
    router
        .add_table(
            "sbtest",
            &TableConfig {
                name: "L".to_string(),
                kind: TableKind::Single,
                shard_key: None,
                partitions: vec![shardplan::router::PartitionConfig {
                    backend: "backend3".to_string(),
                    suffix: String::new(),
                    segment: None,
                }],
            },
        )
        .unwrap();

    let sql = "delete from L";
    let stmt = Parser::parse_delete(sql).unwrap();
    let mut plan = DeletePlan::new("sbtest", sql, &stmt, &router);
    plan.build().unwrap();
    assert_eq!(plan.partitions()[0].backend, "backend3");
}

// ============ Properties ============

#[test]
fn test_partition_queries_reparse() {
    let router = mock_router("sbtest");
    for sql in [
        "delete LOW_PRIORITY QUICK IGNORE from sbtest.A where id in (1, 2,3)",
        "delete from sbtest.A as t where t.name like 'a%' order by t.id desc, k limit 10",
        "delete from sbtest.A where A.id = 156 and `select` = 'x\\'y'",
        "delete from `sbtest`.`G` where a is not null and b not between -1 and 2",
        "delete sbtest.A from sbtest.A where name regexp '^x' or k <=> null",
        "delete from sbtest.S where !a = 1",
        "delete from sbtest.A where !a is null and not id = 1",
        "delete from sbtest.G where - -a = 1 and ! !b",
    ] {
        let stmt = Parser::parse_delete(sql).unwrap();
        let mut plan = DeletePlan::new("sbtest", sql, &stmt, &router);
        plan.build().unwrap();
        for partition in plan.partitions() {
            let reparsed = Parser::parse_delete(&partition.query)
                .unwrap_or_else(|e| panic!("{}: {}", partition.query, e));
            assert_eq!(reparsed.to_string(), partition.query);

            // Same tree as the source, with only the table substituted
            let table = reparsed.single_table().unwrap().name.clone();
            let expected = stmt.with_table(&table);
            assert_eq!(reparsed.selection, expected.selection, "{}", partition.query);
            assert_eq!(reparsed.modifiers, expected.modifiers);
            assert_eq!(reparsed.targets, expected.targets);
            assert_eq!(reparsed.limit, expected.limit);
            let exprs = |s: &DeleteStatement| -> Vec<_> {
                s.order_by.iter().map(|o| o.expr.clone()).collect()
            };
            assert_eq!(exprs(&reparsed), exprs(&expected));
        }
    }
}

#[test]
fn test_build_is_deterministic() {
    let sql = "delete QUICK from sbtest.A where name = 'xx' order by id";
    let first = plan_json("sbtest", sql).unwrap();
    for _ in 0..5 {
        assert_eq!(plan_json("sbtest", sql).unwrap(), first);
    }
}
