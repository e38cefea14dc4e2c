// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::LendingConfig;
use crate::dashboard::admin_stats;
use crate::repository::SqliteStore;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("stats", sub)) = m.subcommand() {
        let store = SqliteStore::new(conn);
        let stats = admin_stats(&store, &store)?;
        if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
            return Ok(());
        }
        let sym = LendingConfig::load(conn)?.currency_symbol;
        let rows = vec![
            vec!["Total Loans".into(), stats.total_loans.to_string()],
            vec!["Active Loans".into(), stats.active_loans.to_string()],
            vec!["Pending Review".into(), stats.pending_loans.to_string()],
            vec!["Total Users".into(), stats.total_users.to_string()],
            vec!["Total Repayments".into(), fmt_money(&stats.total_repayments, &sym)],
            vec!["Average Loan".into(), fmt_money(&stats.average_loan_amount, &sym)],
            vec!["Rejection Rate".into(), format!("{}%", stats.rejection_rate_pct)],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}
