// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{KycStatus, LoanStatus, User};
use crate::repository::{LoanRepository, SqliteStore, UserRepository};
use crate::utils::{arg, fmt_money, maybe_print_json, opt_arg, parse_choice, pretty_table, today};
use crate::wizard::{EMAIL_RE, ID_NUMBER_RE, PHONE_RE};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = add(conn, sub)?;
            println!("Added user {} ({}) <{}>", user.id, user.full_name(), user.email);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => {
            let store = SqliteStore::new(conn);
            let user = UserRepository::get(&store, arg(sub, "id")?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &user)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Field", "Value"],
                        vec![
                            vec!["User ID".into(), user.id.clone()],
                            vec!["Name".into(), user.full_name()],
                            vec!["Email".into(), user.email.clone()],
                            vec!["Phone".into(), user.phone.clone().unwrap_or_default()],
                            vec!["KYC".into(), user.kyc_status.to_string()],
                            vec!["Joined".into(), user.joined_date.to_string()],
                        ],
                    )
                );
            }
        }
        Some(("kyc", sub)) => {
            let mut store = SqliteStore::new(conn);
            let status: KycStatus = parse_choice(arg(sub, "status")?)?;
            let user = store.update_kyc_status(arg(sub, "id")?, status)?;
            println!("KYC for {} set to {}", user.id, user.kyc_status);
        }
        _ => {}
    }
    Ok(())
}

pub fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<User> {
    let mut store = SqliteStore::new(conn);
    let email = arg(sub, "email")?;
    if !EMAIL_RE.is_match(email) {
        return Err(anyhow!("'{}' is not a valid email address", email));
    }
    let id_number = opt_arg(sub, "id-number");
    if let Some(id) = id_number.filter(|id| !ID_NUMBER_RE.is_match(id)) {
        return Err(anyhow!("ID number '{}' must be 13 digits", id));
    }
    let phone = opt_arg(sub, "phone");
    if let Some(p) = phone.filter(|p| !PHONE_RE.is_match(p)) {
        return Err(anyhow!("'{}' is not a valid phone number", p));
    }
    let user = User {
        id: UserRepository::next_id(&store)?,
        first_name: arg(sub, "first-name")?.to_string(),
        last_name: arg(sub, "last-name")?.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
        id_number: id_number.map(str::to_string),
        kyc_status: KycStatus::Pending,
        joined_date: today(),
    };
    UserRepository::insert(&mut store, user.clone())?;
    Ok(user)
}

#[derive(Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub kyc_status: KycStatus,
    pub active_loans: usize,
    pub total_borrowed: Decimal,
    pub joined_date: String,
}

pub fn query_rows(conn: &Connection) -> Result<Vec<UserRow>> {
    let store = SqliteStore::new(conn);
    let mut out = Vec::new();
    for u in UserRepository::list(&store)? {
        let loans = store.list_for_user(&u.id)?;
        let active_loans = loans.iter().filter(|l| l.status == LoanStatus::Active).count();
        let total_borrowed = loans
            .iter()
            .filter(|l| matches!(l.status, LoanStatus::Active | LoanStatus::Completed))
            .map(|l| l.amount)
            .sum();
        out.push(UserRow {
            name: u.full_name(),
            id: u.id,
            email: u.email,
            phone: u.phone.unwrap_or_default(),
            kyc_status: u.kyc_status,
            active_loans,
            total_borrowed,
            joined_date: u.joined_date.to_string(),
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let sym = crate::config::LendingConfig::load(conn)?.currency_symbol;
    let rows = data
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                format!("{}\n{}", r.name, r.email),
                r.phone.clone(),
                r.kyc_status.to_string(),
                r.active_loans.to_string(),
                fmt_money(&r.total_borrowed, &sym),
                r.joined_date.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["User ID", "User", "Phone", "KYC", "Active Loans", "Total Borrowed", "Joined"],
            rows,
        )
    );
    Ok(())
}
