// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The loan application flow as an explicit state machine.
//!
//! Steps run `Amount -> Personal -> Employment -> Review -> Complete`. Each
//! forward move is gated on the current step's fields; there is no way to
//! skip ahead, and `Complete` is only reachable through [`LoanWizard::submit`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::LendingConfig;
use crate::errors::{RepoError, WizardError};
use crate::estimator::{LoanQuoteResult, QuoteLimits, RateConvention, quote_daily};
use crate::models::{
    Application, Bank, EmploymentStatus, KycStatus, Loan, LoanPurpose, LoanStatus, User,
};
use crate::repository::{LoanRepository, UserRepository};

pub(crate) static ID_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{13}$").expect("valid regex"));
pub(crate) static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));
pub(crate) static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ]{8,14}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationStep {
    Amount,
    Personal,
    Employment,
    Review,
    Complete,
}

/// Steps shown in the progress indicator; `Complete` is not one of them.
pub const VISIBLE_STEPS: [ApplicationStep; 4] = [
    ApplicationStep::Amount,
    ApplicationStep::Personal,
    ApplicationStep::Employment,
    ApplicationStep::Review,
];

impl ApplicationStep {
    pub fn title(&self) -> &'static str {
        match self {
            ApplicationStep::Amount => "Loan Details",
            ApplicationStep::Personal => "Personal Info",
            ApplicationStep::Employment => "Employment",
            ApplicationStep::Review => "Review",
            ApplicationStep::Complete => "Complete",
        }
    }

    fn index(&self) -> usize {
        match self {
            ApplicationStep::Amount => 0,
            ApplicationStep::Personal => 1,
            ApplicationStep::Employment => 2,
            ApplicationStep::Review => 3,
            ApplicationStep::Complete => 4,
        }
    }
}

impl fmt::Display for ApplicationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStep::Amount => "amount",
            ApplicationStep::Personal => "personal",
            ApplicationStep::Employment => "employment",
            ApplicationStep::Review => "review",
            ApplicationStep::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDraft {
    pub amount: Decimal,
    pub term_days: u32,
    pub purpose: Option<LoanPurpose>,
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub phone: String,
    pub email: String,
    pub employment_status: Option<EmploymentStatus>,
    pub employer: String,
    pub monthly_income: Option<Decimal>,
    pub bank: Option<Bank>,
    pub account_type: String,
    pub account_number: String,
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        ApplicationDraft {
            amount: Decimal::from(5000),
            term_days: 30,
            purpose: None,
            first_name: String::new(),
            last_name: String::new(),
            id_number: String::new(),
            phone: String::new(),
            email: String::new(),
            employment_status: None,
            employer: String::new(),
            monthly_income: None,
            bank: None,
            account_type: String::new(),
            account_number: String::new(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedApplication {
    pub reference: String,
    pub submitted_at: NaiveDateTime,
    pub quote: LoanQuoteResult,
    pub draft: ApplicationDraft,
}

#[derive(Debug, Clone)]
pub struct LoanWizard {
    step: ApplicationStep,
    draft: ApplicationDraft,
    cfg: LendingConfig,
}

impl LoanWizard {
    pub fn new(cfg: LendingConfig) -> Self {
        LoanWizard {
            step: ApplicationStep::Amount,
            draft: ApplicationDraft::default(),
            cfg,
        }
    }

    pub fn step(&self) -> ApplicationStep {
        self.step
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// Field edits are allowed until the application is submitted.
    pub fn draft_mut(&mut self) -> Result<&mut ApplicationDraft, WizardError> {
        if self.step == ApplicationStep::Complete {
            return Err(WizardError::NoTransition {
                from: self.step,
                action: "edit",
            });
        }
        Ok(&mut self.draft)
    }

    /// 1-based position among the visible steps, and their count.
    pub fn step_number(&self) -> (usize, usize) {
        let idx = self.step.index().min(VISIBLE_STEPS.len() - 1);
        (idx + 1, VISIBLE_STEPS.len())
    }

    pub fn progress_pct(&self) -> u32 {
        let (n, total) = self.step_number();
        (n * 100 / total) as u32
    }

    /// Daily repayment preview for the current amount and term.
    pub fn preview(&self) -> Result<LoanQuoteResult, WizardError> {
        Ok(quote_daily(&self.cfg, self.draft.amount, self.draft.term_days)?)
    }

    fn incomplete(&self, step: ApplicationStep, reason: impl Into<String>) -> WizardError {
        WizardError::Incomplete {
            step,
            reason: reason.into(),
        }
    }

    fn check_amount(&self) -> Result<(), WizardError> {
        let limits = QuoteLimits::for_convention(&self.cfg, RateConvention::daily(&self.cfg));
        limits.check(self.draft.amount, self.draft.term_days)?;
        if self.draft.purpose.is_none() {
            return Err(self.incomplete(ApplicationStep::Amount, "loan purpose is required"));
        }
        Ok(())
    }

    fn check_personal(&self) -> Result<(), WizardError> {
        let d = &self.draft;
        let step = ApplicationStep::Personal;
        if d.first_name.trim().is_empty() || d.last_name.trim().is_empty() {
            return Err(self.incomplete(step, "first and last name are required"));
        }
        if !ID_NUMBER_RE.is_match(d.id_number.trim()) {
            return Err(self.incomplete(step, "ID number must be 13 digits"));
        }
        if !EMAIL_RE.is_match(d.email.trim()) {
            return Err(self.incomplete(
                step,
                format!("'{}' is not a valid email address", d.email.trim()),
            ));
        }
        if !d.phone.trim().is_empty() && !PHONE_RE.is_match(d.phone.trim()) {
            return Err(self.incomplete(
                step,
                format!("'{}' is not a valid phone number", d.phone.trim()),
            ));
        }
        Ok(())
    }

    fn check_employment(&self) -> Result<(), WizardError> {
        let step = ApplicationStep::Employment;
        if self.draft.employment_status.is_none() {
            return Err(self.incomplete(step, "employment status is required"));
        }
        match self.draft.monthly_income {
            Some(income) if income > Decimal::ZERO => Ok(()),
            _ => Err(self.incomplete(step, "monthly income must be positive")),
        }
    }

    fn check(&self, step: ApplicationStep) -> Result<(), WizardError> {
        match step {
            ApplicationStep::Amount => self.check_amount(),
            ApplicationStep::Personal => self.check_personal(),
            ApplicationStep::Employment => self.check_employment(),
            ApplicationStep::Review | ApplicationStep::Complete => Ok(()),
        }
    }

    pub fn next(&mut self) -> Result<ApplicationStep, WizardError> {
        let to = match self.step {
            ApplicationStep::Amount => ApplicationStep::Personal,
            ApplicationStep::Personal => ApplicationStep::Employment,
            ApplicationStep::Employment => ApplicationStep::Review,
            ApplicationStep::Review | ApplicationStep::Complete => {
                return Err(WizardError::NoTransition {
                    from: self.step,
                    action: "next",
                });
            }
        };
        self.check(self.step)?;
        log::debug!("wizard {} -> {}", self.step, to);
        self.step = to;
        Ok(to)
    }

    pub fn back(&mut self) -> Result<ApplicationStep, WizardError> {
        let to = match self.step {
            ApplicationStep::Amount => ApplicationStep::Amount,
            ApplicationStep::Personal => ApplicationStep::Amount,
            ApplicationStep::Employment => ApplicationStep::Personal,
            ApplicationStep::Review => ApplicationStep::Employment,
            ApplicationStep::Complete => {
                return Err(WizardError::NoTransition {
                    from: self.step,
                    action: "back",
                });
            }
        };
        self.step = to;
        Ok(to)
    }

    /// Finalises a reviewed application. Every step guard is re-run so edits
    /// made after passing a step cannot slip through.
    pub fn submit(&mut self, now: NaiveDateTime, seq: u64) -> Result<SubmittedApplication, WizardError> {
        if self.step != ApplicationStep::Review {
            return Err(WizardError::NoTransition {
                from: self.step,
                action: "submit",
            });
        }
        for step in [
            ApplicationStep::Amount,
            ApplicationStep::Personal,
            ApplicationStep::Employment,
        ] {
            self.check(step)?;
        }
        let quote = self.preview()?;
        self.step = ApplicationStep::Complete;
        let reference = application_reference(now, seq);
        log::info!("application {} submitted", reference);
        Ok(SubmittedApplication {
            reference,
            submitted_at: now,
            quote,
            draft: self.draft.clone(),
        })
    }
}

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `EZ` followed by nine base-36 characters.
pub fn application_reference(at: NaiveDateTime, seq: u64) -> String {
    let space = 36u64.pow(9);
    let millis = at.and_utc().timestamp_millis().unsigned_abs();
    let mut n = millis.wrapping_mul(1_000).wrapping_add(seq) % space;
    let mut digits = [b'0'; 9];
    for slot in digits.iter_mut().rev() {
        *slot = BASE36[(n % 36) as usize];
        n /= 36;
    }
    format!("EZ{}", String::from_utf8_lossy(&digits))
}

#[derive(Debug, Clone)]
pub struct FiledApplication {
    pub loan: Loan,
    pub user: User,
    pub new_user: bool,
    pub application: Application,
}

/// Records a submitted application as a pending loan, registering the
/// applicant when their email is not on file.
pub fn file_application<L, U>(
    sub: &SubmittedApplication,
    loans: &mut L,
    users: &mut U,
    today: NaiveDate,
) -> Result<FiledApplication, RepoError>
where
    L: LoanRepository,
    U: UserRepository,
{
    let d = &sub.draft;
    let (user, new_user) = match users.find_by_email(&d.email)? {
        Some(u) => (u, false),
        None => {
            let user = User {
                id: users.next_id()?,
                first_name: d.first_name.trim().to_string(),
                last_name: d.last_name.trim().to_string(),
                email: d.email.trim().to_string(),
                phone: non_empty(&d.phone),
                id_number: non_empty(&d.id_number),
                kyc_status: KycStatus::Pending,
                joined_date: today,
            };
            users.insert(user.clone())?;
            (user, true)
        }
    };

    let purpose = d.purpose.unwrap_or(LoanPurpose::Other);
    let loan = Loan {
        id: loans.next_id()?,
        user_id: user.id.clone(),
        amount: d.amount,
        term_days: d.term_days,
        purpose,
        status: LoanStatus::Pending,
        applied_date: today,
        total_amount: sub.quote.total_repayment,
        total_paid: Decimal::ZERO,
        next_payment: None,
        next_payment_amount: sub.quote.periodic_payment,
    };
    loans.insert(loan.clone())?;

    let application = Application {
        reference: sub.reference.clone(),
        loan_id: loan.id.clone(),
        employment_status: d.employment_status.unwrap_or(EmploymentStatus::Employed),
        employer: non_empty(&d.employer),
        monthly_income: d.monthly_income.unwrap_or(Decimal::ZERO),
        bank: d.bank,
        account_type: non_empty(&d.account_type),
        account_number: non_empty(&d.account_number),
        submitted_at: sub.submitted_at,
    };
    Ok(FiledApplication {
        loan,
        user,
        new_user,
        application,
    })
}
