// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::LendingConfig;
use crate::estimator::{LoanQuoteRequest, LoanQuoteResult, QuoteLimits, RateConvention, estimate};
use crate::utils::{arg, fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cfg = LendingConfig::load(conn)?;
    let quote = compute(&cfg, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &quote)? {
        return Ok(());
    }
    let payment_label = match quote.convention {
        RateConvention::DailySimple { .. } => "Daily Payment",
        RateConvention::MonthlyBlended => "Monthly Payment",
    };
    let sym = cfg.currency_symbol.as_str();
    let rows = vec![
        vec![payment_label.to_string(), fmt_money(&quote.periodic_payment, sym)],
        vec!["Total Interest".to_string(), fmt_money(&quote.total_interest, sym)],
        vec!["Total Repayment".to_string(), fmt_money(&quote.total_repayment, sym)],
        vec![
            "Term".to_string(),
            format!("{} {}", quote.periods, quote.convention.term_unit()),
        ],
    ];
    println!("{}", pretty_table(&["", ""], rows));
    println!(
        "Interest rate: {}% APR",
        (cfg.annual_rate * Decimal::ONE_HUNDRED).normalize()
    );
    Ok(())
}

pub fn compute(cfg: &LendingConfig, sub: &clap::ArgMatches) -> Result<LoanQuoteResult> {
    let principal = parse_decimal(arg(sub, "amount")?)?;
    let term_raw = arg(sub, "term")?;
    let term = term_raw
        .parse::<u32>()
        .with_context(|| format!("Invalid term '{}', expected a whole number", term_raw))?;
    let convention = match sub.get_one::<String>("convention").map(|s| s.as_str()) {
        Some("monthly") => RateConvention::MonthlyBlended,
        _ => RateConvention::daily(cfg),
    };
    let req = LoanQuoteRequest {
        principal,
        term,
        convention,
    };
    // a zero term or principal reports as invalid rather than out of range
    if !sub.get_flag("unbounded") && principal > Decimal::ZERO && term > 0 {
        QuoteLimits::for_convention(cfg, convention).check(principal, term)?;
    }
    Ok(estimate(&req, cfg.annual_rate)?)
}
