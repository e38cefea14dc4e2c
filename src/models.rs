// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Declares a string-backed enum with `Display`/`FromStr` using the stored
/// lowercase spelling.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().to_ascii_lowercase();
                match s.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        s,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

string_enum!(LoanStatus {
    Pending => "pending",
    Active => "active",
    Completed => "completed",
    Rejected => "rejected",
});

string_enum!(KycStatus {
    Verified => "verified",
    Pending => "pending",
    Rejected => "rejected",
});

string_enum!(LoanPurpose {
    Emergency => "emergency",
    Bills => "bills",
    Medical => "medical",
    Education => "education",
    Home => "home",
    Other => "other",
});

string_enum!(EmploymentStatus {
    Employed => "employed",
    SelfEmployed => "self-employed",
    Contract => "contract",
    Pensioner => "pensioner",
    Student => "student",
});

string_enum!(Bank {
    Absa => "absa",
    Fnb => "fnb",
    Standard => "standard",
    Nedbank => "nedbank",
    Capitec => "capitec",
    Other => "other",
});

impl LoanStatus {
    /// pending -> active | rejected, active -> completed.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Active, LoanStatus::Completed)
        )
    }
}

impl LoanPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            LoanPurpose::Emergency => "Emergency Expense",
            LoanPurpose::Bills => "Pay Bills",
            LoanPurpose::Medical => "Medical Expense",
            LoanPurpose::Education => "Education",
            LoanPurpose::Home => "Home Improvement",
            LoanPurpose::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub kyc_status: KycStatus,
    pub joined_date: NaiveDate,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub term_days: u32,
    pub purpose: LoanPurpose,
    pub status: LoanStatus,
    pub applied_date: NaiveDate,
    pub total_amount: Decimal, // quoted total repayment
    pub total_paid: Decimal,
    pub next_payment: Option<NaiveDate>,
    pub next_payment_amount: Decimal,
}

impl Loan {
    /// Whole-percent share of the quoted total already repaid.
    pub fn progress_pct(&self) -> Decimal {
        if self.total_amount.is_zero() {
            return Decimal::ZERO;
        }
        crate::estimator::round_whole(self.total_paid / self.total_amount * Decimal::ONE_HUNDRED)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if self.status != LoanStatus::Active {
            return 0;
        }
        let due = self.applied_date + chrono::Duration::days(i64::from(self.term_days));
        (due - today).num_days().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub reference: String,
    pub loan_id: String,
    pub employment_status: EmploymentStatus,
    pub employer: Option<String>,
    pub monthly_income: Decimal,
    pub bank: Option<Bank>,
    pub account_type: Option<String>,
    pub account_number: Option<String>,
    pub submitted_at: NaiveDateTime,
}
