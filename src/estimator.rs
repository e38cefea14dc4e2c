// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Repayment estimation for short-term loans.
//!
//! Two interest conventions exist and they are not equivalent for the same
//! principal/term pair, so callers pick one explicitly:
//!
//! * [`RateConvention::DailySimple`] charges `principal * rate / basis` per day
//!   and reports a daily payment. This is the canonical quote.
//! * [`RateConvention::MonthlyBlended`] charges a flat `rate / 12` surcharge on
//!   the full principal every month plus straight-line principal.
//!
//! All figures are derived from unrounded intermediates and rounded once, each
//! on its own, to whole currency units (half-up).

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::LendingConfig;
use crate::errors::QuoteError;

const MONTHS_PER_YEAR: Decimal = dec!(12);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateConvention {
    DailySimple { basis_days: u32 },
    MonthlyBlended,
}

impl RateConvention {
    pub fn daily(cfg: &LendingConfig) -> Self {
        RateConvention::DailySimple {
            basis_days: cfg.day_count_basis,
        }
    }

    pub fn term_unit(&self) -> &'static str {
        match self {
            RateConvention::DailySimple { .. } => "days",
            RateConvention::MonthlyBlended => "months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuoteRequest {
    pub principal: Decimal,
    /// Days for `DailySimple`, months for `MonthlyBlended`.
    pub term: u32,
    pub convention: RateConvention,
}

/// Unrounded figures, kept for callers that need to aggregate or compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteFigures {
    pub periodic_payment: Decimal,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuoteResult {
    pub periodic_payment: Decimal,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
    pub periods: u32,
    pub convention: RateConvention,
}

pub fn round_whole(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn too_large() -> QuoteError {
    QuoteError::InvalidInput("amount too large to quote".into())
}

pub fn estimate_raw(req: &LoanQuoteRequest, annual_rate: Decimal) -> Result<QuoteFigures, QuoteError> {
    if req.principal <= Decimal::ZERO {
        return Err(QuoteError::InvalidInput(format!(
            "principal must be positive, got {}",
            req.principal
        )));
    }
    if req.term == 0 {
        return Err(QuoteError::InvalidInput(
            "term must be at least one period".into(),
        ));
    }
    if annual_rate < Decimal::ZERO {
        return Err(QuoteError::InvalidInput(format!(
            "annual rate must not be negative, got {}",
            annual_rate
        )));
    }

    let principal = req.principal;
    let term = Decimal::from(req.term);

    let figures = match req.convention {
        RateConvention::DailySimple { basis_days } => {
            if basis_days == 0 {
                return Err(QuoteError::InvalidInput(
                    "day-count basis must be positive".into(),
                ));
            }
            // principal * (rate / basis) * days, multiplied first so whole-year
            // terms come out exact
            let interest = principal
                .checked_mul(annual_rate)
                .and_then(|v| v.checked_mul(term))
                .and_then(|v| v.checked_div(Decimal::from(basis_days)))
                .ok_or_else(too_large)?;
            let total = principal.checked_add(interest).ok_or_else(too_large)?;
            QuoteFigures {
                periodic_payment: total.checked_div(term).ok_or_else(too_large)?,
                total_interest: interest,
                total_repayment: total,
            }
        }
        RateConvention::MonthlyBlended => {
            let monthly_rate = annual_rate / MONTHS_PER_YEAR;
            let surcharge = principal.checked_mul(monthly_rate).ok_or_else(too_large)?;
            let interest = surcharge.checked_mul(term).ok_or_else(too_large)?;
            let payment = principal
                .checked_div(term)
                .and_then(|v| v.checked_add(surcharge))
                .ok_or_else(too_large)?;
            QuoteFigures {
                periodic_payment: payment,
                total_interest: interest,
                total_repayment: principal.checked_add(interest).ok_or_else(too_large)?,
            }
        }
    };
    Ok(figures)
}

pub fn estimate(req: &LoanQuoteRequest, annual_rate: Decimal) -> Result<LoanQuoteResult, QuoteError> {
    let raw = estimate_raw(req, annual_rate)?;
    Ok(LoanQuoteResult {
        periodic_payment: round_whole(raw.periodic_payment),
        total_interest: round_whole(raw.total_interest),
        total_repayment: round_whole(raw.total_repayment),
        periods: req.term,
        convention: req.convention,
    })
}

/// Canonical daily quote using the configured rate and basis.
pub fn quote_daily(
    cfg: &LendingConfig,
    principal: Decimal,
    term_days: u32,
) -> Result<LoanQuoteResult, QuoteError> {
    let req = LoanQuoteRequest {
        principal,
        term: term_days,
        convention: RateConvention::daily(cfg),
    };
    estimate(&req, cfg.annual_rate)
}

/// Product bounds offered on the application and calculator screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLimits {
    pub min_principal: Decimal,
    pub max_principal: Decimal,
    pub min_term: u32,
    pub max_term: u32,
}

impl QuoteLimits {
    pub fn for_convention(cfg: &LendingConfig, convention: RateConvention) -> Self {
        let (min_term, max_term) = match convention {
            RateConvention::DailySimple { .. } => (cfg.min_term_days, cfg.max_term_days),
            RateConvention::MonthlyBlended => (cfg.min_term_months, cfg.max_term_months),
        };
        QuoteLimits {
            min_principal: cfg.min_principal,
            max_principal: cfg.max_principal,
            min_term,
            max_term,
        }
    }

    pub fn check(&self, principal: Decimal, term: u32) -> Result<(), QuoteError> {
        if principal < self.min_principal || principal > self.max_principal {
            return Err(QuoteError::OutOfRange {
                field: "principal",
                value: principal,
                min: self.min_principal,
                max: self.max_principal,
            });
        }
        if term < self.min_term || term > self.max_term {
            return Err(QuoteError::OutOfRange {
                field: "term",
                value: Decimal::from(term),
                min: Decimal::from(self.min_term),
                max: Decimal::from(self.max_term),
            });
        }
        Ok(())
    }
}
