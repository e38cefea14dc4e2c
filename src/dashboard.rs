// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::RepoError;
use crate::estimator::round_whole;
use crate::models::{Loan, LoanStatus, User};
use crate::repository::{LoanRepository, UserRepository};

#[derive(Debug, Clone, Serialize)]
pub struct ActiveLoanSummary {
    pub loan: Loan,
    pub progress_pct: Decimal,
    pub remaining: Decimal,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorrowerDashboard {
    pub user: User,
    pub active: Option<ActiveLoanSummary>,
    pub pending: Vec<Loan>,
    pub completed: Vec<Loan>,
    pub total_borrowed: Decimal,
}

pub fn borrower_dashboard<L, U>(
    loans: &L,
    users: &U,
    user_id: &str,
    today: NaiveDate,
) -> Result<BorrowerDashboard, RepoError>
where
    L: LoanRepository,
    U: UserRepository,
{
    let user = users.get(user_id)?;
    let history = loans.list_for_user(user_id)?;

    let active = history
        .iter()
        .find(|l| l.status == LoanStatus::Active)
        .map(|l| ActiveLoanSummary {
            progress_pct: l.progress_pct(),
            remaining: (l.total_amount - l.total_paid).max(Decimal::ZERO),
            days_remaining: l.days_remaining(today),
            loan: l.clone(),
        });
    let pending = history
        .iter()
        .filter(|l| l.status == LoanStatus::Pending)
        .cloned()
        .collect();
    let completed = history
        .iter()
        .filter(|l| l.status == LoanStatus::Completed)
        .cloned()
        .collect();
    let total_borrowed = history
        .iter()
        .filter(|l| matches!(l.status, LoanStatus::Active | LoanStatus::Completed))
        .map(|l| l.amount)
        .sum();

    Ok(BorrowerDashboard {
        user,
        active,
        pending,
        completed,
        total_borrowed,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_loans: usize,
    pub active_loans: usize,
    pub pending_loans: usize,
    pub total_users: usize,
    pub total_repayments: Decimal,
    pub average_loan_amount: Decimal,
    /// Share of decided applications (active, completed, rejected) that were
    /// rejected, as a percentage with one decimal.
    pub rejection_rate_pct: Decimal,
}

pub fn admin_stats<L, U>(loans: &L, users: &U) -> Result<AdminStats, RepoError>
where
    L: LoanRepository,
    U: UserRepository,
{
    let all = loans.list()?;
    let total_users = users.list()?.len();
    let count = |s: LoanStatus| all.iter().filter(|l| l.status == s).count();

    let total_loans = all.len();
    let rejected = count(LoanStatus::Rejected);
    let decided = total_loans - count(LoanStatus::Pending);

    let total_repayments: Decimal = all.iter().map(|l| l.total_paid).sum();
    let average_loan_amount = if all.is_empty() {
        Decimal::ZERO
    } else {
        round_whole(all.iter().map(|l| l.amount).sum::<Decimal>() / Decimal::from(total_loans))
    };
    let rejection_rate_pct = if decided == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(rejected) * Decimal::ONE_HUNDRED / Decimal::from(decided)).round_dp(1)
    };

    Ok(AdminStats {
        total_loans,
        active_loans: count(LoanStatus::Active),
        pending_loans: count(LoanStatus::Pending),
        total_users,
        total_repayments,
        average_loan_amount,
        rejection_rate_pct,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub amount: Decimal,
    pub term_days: u32,
    pub status: LoanStatus,
    pub applied_date: NaiveDate,
    pub purpose: String,
}

/// Loans joined with their borrower, filtered by status and a case-insensitive
/// search over loan id, borrower name and email.
pub fn search_loans<L, U>(
    loans: &L,
    users: &U,
    status: Option<LoanStatus>,
    term: Option<&str>,
) -> Result<Vec<LoanRow>, RepoError>
where
    L: LoanRepository,
    U: UserRepository,
{
    let people: HashMap<String, User> = users
        .list()?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();
    let needle = term
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let mut rows = Vec::new();
    for loan in loans.list()? {
        if status.is_some_and(|s| s != loan.status) {
            continue;
        }
        let (user_name, user_email) = match people.get(&loan.user_id) {
            Some(u) => (u.full_name(), u.email.clone()),
            None => (String::new(), String::new()),
        };
        if let Some(ref n) = needle {
            let hit = loan.id.to_lowercase().contains(n)
                || user_name.to_lowercase().contains(n)
                || user_email.to_lowercase().contains(n);
            if !hit {
                continue;
            }
        }
        rows.push(LoanRow {
            id: loan.id,
            user_name,
            user_email,
            amount: loan.amount,
            term_days: loan.term_days,
            status: loan.status,
            applied_date: loan.applied_date,
            purpose: loan.purpose.label().to_string(),
        });
    }
    Ok(rows)
}
