// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::LendingConfig;
use crate::models::Bank;
use crate::repository::SqliteStore;
use crate::utils::{
    arg, fmt_money, maybe_print_json, opt_arg, parse_choice, parse_decimal, pretty_table,
};
use crate::wizard::{FiledApplication, LoanWizard, file_application};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cfg = LendingConfig::load(conn)?;
    let filed = submit(conn, &cfg, sub, chrono::Local::now().naive_local())?;

    let out = json!({
        "reference": filed.application.reference,
        "loan_id": filed.loan.id,
        "user_id": filed.user.id,
        "new_user": filed.new_user,
        "status": filed.loan.status,
        "daily_payment": filed.loan.next_payment_amount,
        "total_repayment": filed.loan.total_amount,
    });
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }
    let sym = cfg.currency_symbol.as_str();
    println!("Application submitted! Reference: {}", filed.application.reference);
    println!(
        "{}",
        pretty_table(
            &["Loan", "Borrower", "Amount", "Daily Payment", "Total Repayment"],
            vec![vec![
                filed.loan.id.clone(),
                format!("{} ({})", filed.user.full_name(), filed.user.id),
                fmt_money(&filed.loan.amount, sym),
                fmt_money(&filed.loan.next_payment_amount, sym),
                fmt_money(&filed.loan.total_amount, sym),
            ]],
        )
    );
    println!("We're reviewing your application and will get back to you within 24 hours.");
    Ok(())
}

/// Walks the wizard step by step with the values given on the command line,
/// so each step's guard reports the first missing or invalid field.
pub fn submit(
    conn: &mut Connection,
    cfg: &LendingConfig,
    sub: &clap::ArgMatches,
    now: chrono::NaiveDateTime,
) -> Result<FiledApplication> {
    let mut wizard = LoanWizard::new(cfg.clone());

    {
        let d = wizard.draft_mut()?;
        d.amount = parse_decimal(arg(sub, "amount")?)?;
        let term_raw = arg(sub, "term")?;
        d.term_days = term_raw
            .parse::<u32>()
            .with_context(|| format!("Invalid term '{}', expected days", term_raw))?;
        d.purpose = Some(parse_choice(arg(sub, "purpose")?)?);
    }
    wizard.next()?;

    {
        let d = wizard.draft_mut()?;
        d.first_name = arg(sub, "first-name")?.to_string();
        d.last_name = arg(sub, "last-name")?.to_string();
        d.id_number = arg(sub, "id-number")?.to_string();
        d.email = arg(sub, "email")?.to_string();
        d.phone = opt_arg(sub, "phone").unwrap_or_default().to_string();
    }
    wizard.next()?;

    {
        let d = wizard.draft_mut()?;
        d.employment_status = Some(parse_choice(arg(sub, "employment")?)?);
        d.employer = opt_arg(sub, "employer").unwrap_or_default().to_string();
        d.monthly_income = Some(parse_decimal(arg(sub, "income")?)?);
        d.bank = opt_arg(sub, "bank").map(parse_choice::<Bank>).transpose()?;
        d.account_type = opt_arg(sub, "account-type").unwrap_or_default().to_string();
        d.account_number = opt_arg(sub, "account-number").unwrap_or_default().to_string();
    }
    wizard.next()?;

    let tx = conn.transaction()?;
    let seq: i64 = tx.query_row("SELECT COUNT(*) FROM applications", [], |r| r.get(0))?;
    let submitted = wizard.submit(now, seq.unsigned_abs())?;
    let filed = {
        let mut loans = SqliteStore::new(&tx);
        let mut users = SqliteStore::new(&tx);
        let filed = file_application(&submitted, &mut loans, &mut users, now.date())?;
        loans.insert_application(&filed.application)?;
        filed
    };
    tx.commit()?;
    log::info!(
        "loan {} filed for {} under {}",
        filed.loan.id,
        filed.user.id,
        filed.application.reference
    );
    Ok(filed)
}
