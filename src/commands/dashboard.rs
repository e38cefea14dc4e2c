// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::LendingConfig;
use crate::dashboard::borrower_dashboard;
use crate::repository::SqliteStore;
use crate::utils::{arg, fmt_money, maybe_print_json, pretty_table, today};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    let dash = borrower_dashboard(&store, &store, arg(sub, "user")?, today())?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &dash)? {
        return Ok(());
    }
    let sym = LendingConfig::load(conn)?.currency_symbol;

    println!("Welcome back, {}!", dash.user.first_name);
    match &dash.active {
        Some(a) => {
            let next = match a.loan.next_payment {
                Some(d) => format!("{} due {}", fmt_money(&a.loan.next_payment_amount, &sym), d),
                None => "-".to_string(),
            };
            println!(
                "{}",
                pretty_table(
                    &["Active Loan", "Amount", "Paid", "Remaining", "Progress", "Next Payment", "Days Left"],
                    vec![vec![
                        a.loan.id.clone(),
                        fmt_money(&a.loan.amount, &sym),
                        fmt_money(&a.loan.total_paid, &sym),
                        fmt_money(&a.remaining, &sym),
                        format!("{}%", a.progress_pct),
                        next,
                        a.days_remaining.to_string(),
                    ]],
                )
            );
        }
        None => println!("No active loan."),
    }

    for l in &dash.pending {
        println!("Application for loan {} ({}) is under review.", l.id, fmt_money(&l.amount, &sym));
    }

    if !dash.completed.is_empty() {
        let rows = dash
            .completed
            .iter()
            .map(|l| {
                vec![
                    l.id.clone(),
                    fmt_money(&l.amount, &sym),
                    fmt_money(&l.total_amount, &sym),
                    l.applied_date.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Loan History", "Amount", "Total Repaid", "Applied"], rows)
        );
    }
    println!("Total borrowed: {}", fmt_money(&dash.total_borrowed, &sym));
    Ok(())
}
