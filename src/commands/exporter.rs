// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dashboard::search_loans;
use crate::repository::SqliteStore;
use crate::utils::arg;
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("loans", sub)) => export_loans(conn, sub),
        _ => Ok(()),
    }
}

fn export_loans(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    let out = arg(sub, "out")?;

    let store = SqliteStore::new(conn);
    let mut rows = search_loans(&store, &store, None, None)?;
    // oldest first, matching the order loans were taken on
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "id", "user_name", "user_email", "amount", "term_days", "status", "applied_date",
                "purpose",
            ])?;
            for r in &rows {
                wtr.write_record([
                    r.id.clone(),
                    r.user_name.clone(),
                    r.user_email.clone(),
                    r.amount.to_string(),
                    r.term_days.to_string(),
                    r.status.to_string(),
                    r.applied_date.to_string(),
                    r.purpose.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)
                .with_context(|| format!("Write {}", out))?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    log::info!("exported {} loans to {}", rows.len(), out);
    println!("Exported {} loans to {}", rows.len(), out);
    Ok(())
}
