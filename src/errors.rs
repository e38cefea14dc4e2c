// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::LoanStatus;
use crate::wizard::ApplicationStep;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{field} {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot leave step '{step}': {reason}")]
    Incomplete {
        step: ApplicationStep,
        reason: String,
    },
    #[error("no transition from '{from}' via {action}")]
    NoTransition {
        from: ApplicationStep,
        action: &'static str,
    },
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error("loan '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: LoanStatus,
        to: LoanStatus,
    },
    #[error("corrupt {field} value '{value}' in stored record")]
    Corrupt { field: &'static str, value: String },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
