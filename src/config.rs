// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

pub const KEYS: &[&str] = &[
    "annual_rate",
    "day_count_basis",
    "min_principal",
    "max_principal",
    "min_term_days",
    "max_term_days",
    "min_term_months",
    "max_term_months",
    "currency_symbol",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LendingConfig {
    pub annual_rate: Decimal,
    pub day_count_basis: u32,
    pub min_principal: Decimal,
    pub max_principal: Decimal,
    pub min_term_days: u32,
    pub max_term_days: u32,
    pub min_term_months: u32,
    pub max_term_months: u32,
    pub currency_symbol: String,
}

impl Default for LendingConfig {
    fn default() -> Self {
        LendingConfig {
            annual_rate: dec!(0.24),
            day_count_basis: 365,
            min_principal: dec!(500),
            max_principal: dec!(50000),
            min_term_days: 7,
            max_term_days: 365,
            min_term_months: 3,
            max_term_months: 24,
            currency_symbol: "R".to_string(),
        }
    }
}

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

fn parse_u32(key: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid {} '{}', expected a whole number", key, raw))
}

fn parse_dec(key: &str, raw: &str) -> Result<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}', expected a decimal", key, raw))
}

impl LendingConfig {
    /// Stored settings layered over the defaults.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = LendingConfig::default();
        for key in KEYS {
            if let Some(raw) = get_setting(conn, key)? {
                cfg.apply(key, &raw)?;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply(&mut self, key: &str, raw: &str) -> Result<()> {
        match key {
            "annual_rate" => self.annual_rate = parse_dec(key, raw)?,
            "day_count_basis" => self.day_count_basis = parse_u32(key, raw)?,
            "min_principal" => self.min_principal = parse_dec(key, raw)?,
            "max_principal" => self.max_principal = parse_dec(key, raw)?,
            "min_term_days" => self.min_term_days = parse_u32(key, raw)?,
            "max_term_days" => self.max_term_days = parse_u32(key, raw)?,
            "min_term_months" => self.min_term_months = parse_u32(key, raw)?,
            "max_term_months" => self.max_term_months = parse_u32(key, raw)?,
            "currency_symbol" => self.currency_symbol = raw.trim().to_string(),
            _ => {
                return Err(anyhow!(
                    "Unknown setting '{}' (known: {})",
                    key,
                    KEYS.join(", ")
                ));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.annual_rate < Decimal::ZERO {
            return Err(anyhow!("annual_rate must not be negative"));
        }
        if self.day_count_basis == 0 {
            return Err(anyhow!("day_count_basis must be positive"));
        }
        if self.min_principal <= Decimal::ZERO || self.min_principal > self.max_principal {
            return Err(anyhow!(
                "principal bounds {}..={} are not a positive range",
                self.min_principal,
                self.max_principal
            ));
        }
        if self.min_term_days == 0 || self.min_term_days > self.max_term_days {
            return Err(anyhow!(
                "term bounds {}..={} days are not a positive range",
                self.min_term_days,
                self.max_term_days
            ));
        }
        if self.min_term_months == 0 || self.min_term_months > self.max_term_months {
            return Err(anyhow!(
                "term bounds {}..={} months are not a positive range",
                self.min_term_months,
                self.max_term_months
            ));
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        vec![
            ("annual_rate".into(), self.annual_rate.to_string()),
            ("day_count_basis".into(), self.day_count_basis.to_string()),
            ("min_principal".into(), self.min_principal.to_string()),
            ("max_principal".into(), self.max_principal.to_string()),
            ("min_term_days".into(), self.min_term_days.to_string()),
            ("max_term_days".into(), self.max_term_days.to_string()),
            ("min_term_months".into(), self.min_term_months.to_string()),
            ("max_term_months".into(), self.max_term_months.to_string()),
            ("currency_symbol".into(), self.currency_symbol.clone()),
        ]
    }
}

/// Validates against the full resulting configuration before writing.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let mut cfg = LendingConfig::load(conn)?;
    cfg.apply(key, value)?;
    cfg.validate()?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    log::info!("setting {} updated to {}", key, value.trim());
    Ok(())
}
