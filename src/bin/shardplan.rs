//! shardplan CLI binary
//!
//! Usage: shardplan [--config file] [--database name] <sql>...
//!
//! Prints the plan of every statement as JSON, in order.
//!
//! Exit codes:
//!   0 - Every statement planned
//!   1 - Config could not be loaded
//!   2 - A statement failed to parse or plan

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shardplan::planner::{DeletePlan, PlanTree};
use shardplan::router::mock::mock_router;
use shardplan::router::{Router, RouterConfig};
use shardplan::sql::Parser as SqlParser;

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan DELETE statements against a sharded topology")]
struct Cli {
    /// Router topology (JSON); the built-in fixture topology when absent
    #[arg(long, env = "SHARDPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Database for unqualified tables
    #[arg(long, default_value = "sbtest")]
    database: String,

    /// Statements to plan
    #[arg(required = true)]
    sql: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        config,
        database,
        sql,
    } = Cli::parse();

    let router = match &config {
        Some(path) => match RouterConfig::load(path).and_then(|c| Router::from_config(&c)) {
            Ok(router) => router,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => mock_router(&database),
    };
    tracing::info!(?config, database = %database, statements = sql.len(), "Planning");

    // Plans borrow their statements, so parse everything up front
    let mut statements = Vec::with_capacity(sql.len());
    for text in &sql {
        match SqlParser::parse_delete(text) {
            Ok(stmt) => statements.push(stmt),
            Err(e) => {
                eprintln!("ERROR: {}: {}", text, e);
                process::exit(2);
            }
        }
    }

    let mut tree = PlanTree::new();
    for (text, stmt) in sql.iter().zip(&statements) {
        if let Err(e) = tree.add(DeletePlan::new(database.as_str(), text.as_str(), stmt, &router)) {
            eprintln!("ERROR: {}", e);
            process::exit(2);
        }
    }
    if let Err(e) = tree.build() {
        eprintln!("ERROR: {}", e);
        process::exit(2);
    }

    for plan in &tree {
        match plan.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(2);
            }
        }
    }
}
