// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("za.ezlend", "EzLend", "ezlend"));

pub const DB_ENV: &str = "EZLEND_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("ezlend.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    log::debug!("opened database at {}", path.display());
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        phone TEXT,
        id_number TEXT,
        kyc_status TEXT NOT NULL DEFAULT 'pending'
            CHECK(kyc_status IN ('verified','pending','rejected')),
        joined_date TEXT NOT NULL
    );

    -- amounts stored as decimal text
    CREATE TABLE IF NOT EXISTS loans(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        amount TEXT NOT NULL,
        term_days INTEGER NOT NULL CHECK(term_days > 0),
        purpose TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('pending','active','completed','rejected')),
        applied_date TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        total_paid TEXT NOT NULL DEFAULT '0',
        next_payment TEXT,
        next_payment_amount TEXT NOT NULL DEFAULT '0',
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_loans_user ON loans(user_id);
    CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status);

    CREATE TABLE IF NOT EXISTS applications(
        reference TEXT PRIMARY KEY,
        loan_id TEXT NOT NULL UNIQUE,
        employment_status TEXT NOT NULL,
        employer TEXT,
        monthly_income TEXT NOT NULL,
        bank TEXT,
        account_type TEXT,
        account_number TEXT,
        submitted_at TEXT NOT NULL,
        FOREIGN KEY(loan_id) REFERENCES loans(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
