// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Loan and user storage behind two small traits, with an in-memory store
//! for tests and a SQLite store for the CLI.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::errors::RepoError;
use crate::models::{Application, KycStatus, Loan, LoanStatus, User};

pub trait LoanRepository {
    fn list(&self) -> Result<Vec<Loan>, RepoError>;
    fn get(&self, id: &str) -> Result<Loan, RepoError>;
    fn insert(&mut self, loan: Loan) -> Result<(), RepoError>;
    fn update_status(
        &mut self,
        id: &str,
        status: LoanStatus,
        on: NaiveDate,
    ) -> Result<Loan, RepoError>;
    fn next_id(&self) -> Result<String, RepoError>;

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Loan>, RepoError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|l| l.user_id == user_id)
            .collect())
    }
}

pub trait UserRepository {
    fn list(&self) -> Result<Vec<User>, RepoError>;
    fn get(&self, id: &str) -> Result<User, RepoError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    fn insert(&mut self, user: User) -> Result<(), RepoError>;
    fn update_kyc_status(&mut self, id: &str, status: KycStatus) -> Result<User, RepoError>;
    fn next_id(&self) -> Result<String, RepoError>;
}

/// Moves `loan` to `to`, keeping the payment fields consistent with the new
/// status.
pub fn apply_transition(loan: &mut Loan, to: LoanStatus, on: NaiveDate) -> Result<(), RepoError> {
    if !loan.status.can_transition_to(to) {
        return Err(RepoError::InvalidTransition {
            id: loan.id.clone(),
            from: loan.status,
            to,
        });
    }
    match to {
        LoanStatus::Active => {
            loan.next_payment = Some(on + Duration::days(1));
        }
        LoanStatus::Completed => {
            loan.total_paid = loan.total_amount;
            loan.next_payment = None;
            loan.next_payment_amount = Decimal::ZERO;
        }
        LoanStatus::Rejected => {
            loan.next_payment = None;
            loan.next_payment_amount = Decimal::ZERO;
        }
        LoanStatus::Pending => {}
    }
    loan.status = to;
    Ok(())
}

/// `L001`, `U042`... one past the highest numeric suffix in use.
pub fn sequential_id<'a>(prefix: char, existing: impl Iterator<Item = &'a str>) -> String {
    let max = existing
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:03}", prefix, max + 1)
}

#[derive(Debug, Default)]
pub struct InMemoryLoans {
    loans: BTreeMap<String, Loan>,
}

impl InMemoryLoans {
    pub fn new(loans: impl IntoIterator<Item = Loan>) -> Self {
        InMemoryLoans {
            loans: loans.into_iter().map(|l| (l.id.clone(), l)).collect(),
        }
    }
}

impl LoanRepository for InMemoryLoans {
    fn list(&self) -> Result<Vec<Loan>, RepoError> {
        let mut v: Vec<Loan> = self.loans.values().cloned().collect();
        v.sort_by(|a, b| b.applied_date.cmp(&a.applied_date).then(b.id.cmp(&a.id)));
        Ok(v)
    }

    fn get(&self, id: &str) -> Result<Loan, RepoError> {
        self.loans.get(id).cloned().ok_or_else(|| RepoError::NotFound {
            kind: "loan",
            id: id.to_string(),
        })
    }

    fn insert(&mut self, loan: Loan) -> Result<(), RepoError> {
        if self.loans.contains_key(&loan.id) {
            return Err(RepoError::Duplicate {
                kind: "loan",
                id: loan.id,
            });
        }
        self.loans.insert(loan.id.clone(), loan);
        Ok(())
    }

    fn update_status(
        &mut self,
        id: &str,
        status: LoanStatus,
        on: NaiveDate,
    ) -> Result<Loan, RepoError> {
        let loan = self.loans.get_mut(id).ok_or_else(|| RepoError::NotFound {
            kind: "loan",
            id: id.to_string(),
        })?;
        apply_transition(loan, status, on)?;
        Ok(loan.clone())
    }

    fn next_id(&self) -> Result<String, RepoError> {
        Ok(sequential_id('L', self.loans.keys().map(|k| k.as_str())))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: BTreeMap<String, User>,
}

impl InMemoryUsers {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        InMemoryUsers {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }
}

impl UserRepository for InMemoryUsers {
    fn list(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.users.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<User, RepoError> {
        self.users.get(id).cloned().ok_or_else(|| RepoError::NotFound {
            kind: "user",
            id: id.to_string(),
        })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    fn insert(&mut self, user: User) -> Result<(), RepoError> {
        if self.users.contains_key(&user.id) {
            return Err(RepoError::Duplicate {
                kind: "user",
                id: user.id,
            });
        }
        if self.find_by_email(&user.email)?.is_some() {
            return Err(RepoError::Duplicate {
                kind: "email",
                id: user.email,
            });
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    fn update_kyc_status(&mut self, id: &str, status: KycStatus) -> Result<User, RepoError> {
        let user = self.users.get_mut(id).ok_or_else(|| RepoError::NotFound {
            kind: "user",
            id: id.to_string(),
        })?;
        user.kyc_status = status;
        Ok(user.clone())
    }

    fn next_id(&self) -> Result<String, RepoError> {
        Ok(sequential_id('U', self.users.keys().map(|k| k.as_str())))
    }
}

/// Both repositories over one SQLite connection.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn insert_application(&self, app: &Application) -> Result<(), RepoError> {
        self.conn.execute(
            "INSERT INTO applications(reference, loan_id, employment_status, employer, monthly_income,
                bank, account_type, account_number, submitted_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                app.reference,
                app.loan_id,
                app.employment_status.as_str(),
                app.employer,
                app.monthly_income.to_string(),
                app.bank.map(|b| b.as_str()),
                app.account_type,
                app.account_number,
                app.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        log::debug!("stored application {} for loan {}", app.reference, app.loan_id);
        Ok(())
    }

    pub fn application_for_loan(&self, loan_id: &str) -> Result<Option<String>, RepoError> {
        let r = self
            .conn
            .query_row(
                "SELECT reference FROM applications WHERE loan_id=?1",
                params![loan_id],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(r)
    }
}

fn parse_field<T: FromStr>(field: &'static str, raw: String) -> Result<T, RepoError> {
    raw.parse::<T>()
        .map_err(|_| RepoError::Corrupt { field, value: raw })
}

fn parse_date_field(field: &'static str, raw: String) -> Result<NaiveDate, RepoError> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| RepoError::Corrupt { field, value: raw })
}

const LOAN_COLUMNS: &str = "id, user_id, amount, term_days, purpose, status, applied_date, \
     total_amount, total_paid, next_payment, next_payment_amount";

fn loan_from_row(r: &Row<'_>) -> Result<Loan, RepoError> {
    let next_payment: Option<String> = r.get(9)?;
    Ok(Loan {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: parse_field("amount", r.get(2)?)?,
        term_days: r.get(3)?,
        purpose: parse_field("purpose", r.get(4)?)?,
        status: parse_field("status", r.get(5)?)?,
        applied_date: parse_date_field("applied_date", r.get(6)?)?,
        total_amount: parse_field("total_amount", r.get(7)?)?,
        total_paid: parse_field("total_paid", r.get(8)?)?,
        next_payment: next_payment
            .map(|d| parse_date_field("next_payment", d))
            .transpose()?,
        next_payment_amount: parse_field("next_payment_amount", r.get(10)?)?,
    })
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, id_number, kyc_status, joined_date";

fn user_from_row(r: &Row<'_>) -> Result<User, RepoError> {
    Ok(User {
        id: r.get(0)?,
        first_name: r.get(1)?,
        last_name: r.get(2)?,
        email: r.get(3)?,
        phone: r.get(4)?,
        id_number: r.get(5)?,
        kyc_status: parse_field("kyc_status", r.get(6)?)?,
        joined_date: parse_date_field("joined_date", r.get(7)?)?,
    })
}

impl SqliteStore<'_> {
    fn query_loans(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Loan>, RepoError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(args)?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(loan_from_row(r)?);
        }
        Ok(out)
    }

    fn query_users(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<User>, RepoError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(args)?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(user_from_row(r)?);
        }
        Ok(out)
    }

    fn ids(&self, table: &str) -> Result<Vec<String>, RepoError> {
        let mut stmt = self.conn.prepare(&format!("SELECT id FROM {}", table))?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn write_loan_state(&self, loan: &Loan) -> Result<(), RepoError> {
        self.conn.execute(
            "UPDATE loans SET status=?2, total_paid=?3, next_payment=?4, next_payment_amount=?5 WHERE id=?1",
            params![
                loan.id,
                loan.status.as_str(),
                loan.total_paid.to_string(),
                loan.next_payment.map(|d| d.to_string()),
                loan.next_payment_amount.to_string(),
            ],
        )?;
        Ok(())
    }
}

impl LoanRepository for SqliteStore<'_> {
    fn list(&self) -> Result<Vec<Loan>, RepoError> {
        self.query_loans(
            &format!("SELECT {} FROM loans ORDER BY applied_date DESC, id DESC", LOAN_COLUMNS),
            &[],
        )
    }

    fn get(&self, id: &str) -> Result<Loan, RepoError> {
        self.query_loans(
            &format!("SELECT {} FROM loans WHERE id=?1", LOAN_COLUMNS),
            &[&id],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound {
            kind: "loan",
            id: id.to_string(),
        })
    }

    fn insert(&mut self, loan: Loan) -> Result<(), RepoError> {
        let res = self.conn.execute(
            &format!(
                "INSERT INTO loans({}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
                LOAN_COLUMNS
            ),
            params![
                loan.id,
                loan.user_id,
                loan.amount.to_string(),
                loan.term_days,
                loan.purpose.as_str(),
                loan.status.as_str(),
                loan.applied_date.to_string(),
                loan.total_amount.to_string(),
                loan.total_paid.to_string(),
                loan.next_payment.map(|d| d.to_string()),
                loan.next_payment_amount.to_string(),
            ],
        );
        match res {
            Ok(_) => {
                log::debug!("inserted loan {} for {}", loan.id, loan.user_id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && LoanRepository::get(self, &loan.id).is_ok() =>
            {
                Err(RepoError::Duplicate {
                    kind: "loan",
                    id: loan.id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_status(
        &mut self,
        id: &str,
        status: LoanStatus,
        on: NaiveDate,
    ) -> Result<Loan, RepoError> {
        let mut loan = LoanRepository::get(self, id)?;
        let from = loan.status;
        apply_transition(&mut loan, status, on)?;
        self.write_loan_state(&loan)?;
        log::info!("loan {} moved from {} to {}", id, from, status);
        Ok(loan)
    }

    fn next_id(&self) -> Result<String, RepoError> {
        let ids = self.ids("loans")?;
        Ok(sequential_id('L', ids.iter().map(|s| s.as_str())))
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Loan>, RepoError> {
        self.query_loans(
            &format!(
                "SELECT {} FROM loans WHERE user_id=?1 ORDER BY applied_date DESC, id DESC",
                LOAN_COLUMNS
            ),
            &[&user_id],
        )
    }
}

impl UserRepository for SqliteStore<'_> {
    fn list(&self) -> Result<Vec<User>, RepoError> {
        self.query_users(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS), &[])
    }

    fn get(&self, id: &str) -> Result<User, RepoError> {
        self.query_users(
            &format!("SELECT {} FROM users WHERE id=?1", USER_COLUMNS),
            &[&id],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound {
            kind: "user",
            id: id.to_string(),
        })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .query_users(
                &format!(
                    "SELECT {} FROM users WHERE email=?1 COLLATE NOCASE",
                    USER_COLUMNS
                ),
                &[&email.trim()],
            )?
            .into_iter()
            .next())
    }

    fn insert(&mut self, user: User) -> Result<(), RepoError> {
        if self.find_by_email(&user.email)?.is_some() {
            return Err(RepoError::Duplicate {
                kind: "email",
                id: user.email,
            });
        }
        if UserRepository::get(self, &user.id).is_ok() {
            return Err(RepoError::Duplicate {
                kind: "user",
                id: user.id,
            });
        }
        self.conn.execute(
            &format!(
                "INSERT INTO users({}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
                USER_COLUMNS
            ),
            params![
                user.id,
                user.first_name,
                user.last_name,
                user.email,
                user.phone,
                user.id_number,
                user.kyc_status.as_str(),
                user.joined_date.to_string(),
            ],
        )?;
        log::debug!("inserted user {} <{}>", user.id, user.email);
        Ok(())
    }

    fn update_kyc_status(&mut self, id: &str, status: KycStatus) -> Result<User, RepoError> {
        let n = self.conn.execute(
            "UPDATE users SET kyc_status=?2 WHERE id=?1",
            params![id, status.as_str()],
        )?;
        if n == 0 {
            return Err(RepoError::NotFound {
                kind: "user",
                id: id.to_string(),
            });
        }
        log::info!("user {} kyc status set to {}", id, status);
        UserRepository::get(self, id)
    }

    fn next_id(&self) -> Result<String, RepoError> {
        let ids = self.ids("users")?;
        Ok(sequential_id('U', ids.iter().map(|s| s.as_str())))
    }
}
