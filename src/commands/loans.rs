// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::LendingConfig;
use crate::dashboard::{LoanRow, search_loans};
use crate::models::{Loan, LoanStatus};
use crate::repository::{LoanRepository, SqliteStore, UserRepository};
use crate::utils::{arg, fmt_money, maybe_print_json, opt_arg, parse_choice, pretty_table, today};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("approve", sub)) => transition(conn, sub, LoanStatus::Active)?,
        Some(("reject", sub)) => transition(conn, sub, LoanStatus::Rejected)?,
        Some(("complete", sub)) => transition(conn, sub, LoanStatus::Completed)?,
        _ => {}
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LoanRow>> {
    let store = SqliteStore::new(conn);
    let status = opt_arg(sub, "status")
        .map(parse_choice::<LoanStatus>)
        .transpose()?;
    let mut rows = search_loans(&store, &store, status, opt_arg(sub, "search"))?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    Ok(rows)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let sym = LendingConfig::load(conn)?.currency_symbol;
    let rows = data
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                format!("{}\n{}", r.user_name, r.user_email),
                fmt_money(&r.amount, &sym),
                format!("{} days", r.term_days),
                r.status.to_string(),
                r.applied_date.to_string(),
                r.purpose.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Loan ID", "Borrower", "Amount", "Term", "Status", "Applied", "Purpose"],
            rows,
        )
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    let loan = LoanRepository::get(&store, arg(sub, "id")?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &loan)? {
        return Ok(());
    }
    let user = UserRepository::get(&store, &loan.user_id)?;
    let reference = store.application_for_loan(&loan.id)?.unwrap_or_default();
    let sym = LendingConfig::load(conn)?.currency_symbol;
    println!("{}", pretty_table(&["Field", "Value"], detail_rows(&loan, &sym, today())));
    println!("Borrower: {} <{}> ({})", user.full_name(), user.email, user.id);
    if !reference.is_empty() {
        println!("Application: {}", reference);
    }
    Ok(())
}

fn detail_rows(loan: &Loan, sym: &str, today: chrono::NaiveDate) -> Vec<Vec<String>> {
    vec![
        vec!["Loan ID".into(), loan.id.clone()],
        vec!["Status".into(), loan.status.to_string()],
        vec!["Amount".into(), fmt_money(&loan.amount, sym)],
        vec!["Term".into(), format!("{} days", loan.term_days)],
        vec!["Purpose".into(), loan.purpose.label().into()],
        vec!["Applied".into(), loan.applied_date.to_string()],
        vec!["Total Repayment".into(), fmt_money(&loan.total_amount, sym)],
        vec!["Paid".into(), format!("{} ({}%)", fmt_money(&loan.total_paid, sym), loan.progress_pct())],
        vec![
            "Next Payment".into(),
            match loan.next_payment {
                Some(d) => format!("{} on {}", fmt_money(&loan.next_payment_amount, sym), d),
                None => "-".into(),
            },
        ],
        vec!["Days Remaining".into(), loan.days_remaining(today).to_string()],
    ]
}

fn transition(conn: &Connection, sub: &clap::ArgMatches, to: LoanStatus) -> Result<()> {
    let mut store = SqliteStore::new(conn);
    let id = arg(sub, "id")?;
    let loan = store.update_status(id, to, today())?;
    println!("Loan {} is now {}", loan.id, loan.status);
    Ok(())
}
