//! `recordwatch` command-line entry point.
//!
//! # Responsibility
//! - Load configuration and start file logging when configured.
//! - Drive the record store, sales order endpoints and change detector.

mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use recordwatch_core::db::open_db;
use recordwatch_core::{
    init_logging, ChangeDetector, CoreConfig, Record, RecordSnapshot, RecordStore,
    RestletRequest, SalesOrderRestlet, SalesOrderService, SqliteRecordSearch, SqliteRecordStore,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CoreConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db_path) = &cli.db {
        config.db_path = db_path.clone();
    }
    if let Some(log_dir) = config.log_dir.as_deref().and_then(Path::to_str) {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: file logging disabled: {err}");
        }
    }

    match cli.command {
        Command::Ping => {
            println!("recordwatch_core ping={}", recordwatch_core::ping());
            println!("recordwatch_core version={}", recordwatch_core::core_version());
        }
        Command::Import { file } => {
            let mut record: Record = read_json(&file)?;
            let conn = open_db(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            let id = SqliteRecordStore::new(&conn)
                .save(&mut record)
                .context("saving record")?;
            print_json(&json!({ "type": record.record_type, "id": id }))?;
        }
        Command::Fetch { id } => {
            let conn = open_db(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            let restlet = SalesOrderRestlet::new(SalesOrderService::new(
                SqliteRecordStore::new(&conn),
                SqliteRecordSearch::new(&conn),
            ));
            let params = id
                .map(|id| BTreeMap::from([("id".to_string(), id)]))
                .unwrap_or_default();
            print_json(&restlet.dispatch(&RestletRequest::get(params)))?;
        }
        Command::Fulfill {
            sales_order_id,
            items,
        } => {
            let conn = open_db(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            let restlet = SalesOrderRestlet::new(SalesOrderService::new(
                SqliteRecordStore::new(&conn),
                SqliteRecordSearch::new(&conn),
            ));
            let item_details = items
                .iter()
                .map(|item| json!({ "itemId": item.item_id, "quantity": item.quantity }))
                .collect::<Vec<_>>();
            let body = json!({
                "salesOrderId": sales_order_id,
                "itemDetails": item_details,
            });
            print_json(&restlet.dispatch(&RestletRequest::post(body)))?;
        }
        Command::Detect {
            current,
            previous,
            sublist,
        } => {
            let current: Record = read_json(&current)?;
            let previous: Option<Record> = previous.as_deref().map(read_json).transpose()?;
            let sublist = sublist.unwrap_or_else(|| config.address_sublist.clone());
            let changed = ChangeDetector::new().has_changed(
                previous.as_ref().map(|record| record as &dyn RecordSnapshot),
                &current,
                &sublist,
            );
            println!("{changed}");
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| anyhow!("parsing {}: {err}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
