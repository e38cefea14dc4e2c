// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ezlend::db;
use ezlend::errors::RepoError;
use ezlend::models::{KycStatus, Loan, LoanPurpose, LoanStatus, User};
use ezlend::repository::{
    InMemoryLoans, InMemoryUsers, LoanRepository, SqliteStore, UserRepository, sequential_id,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn user(id: &str, first: &str, email: &str) -> User {
    User {
        id: id.into(),
        first_name: first.into(),
        last_name: "Doe".into(),
        email: email.into(),
        phone: Some("+27 12 345 6789".into()),
        id_number: None,
        kyc_status: KycStatus::Pending,
        joined_date: date("2023-12-15"),
    }
}

fn loan(id: &str, user_id: &str, status: LoanStatus, applied: &str) -> Loan {
    Loan {
        id: id.into(),
        user_id: user_id.into(),
        amount: dec!(15000),
        term_days: 30,
        purpose: LoanPurpose::Emergency,
        status,
        applied_date: date(applied),
        total_amount: dec!(15296),
        total_paid: Decimal::ZERO,
        next_payment: None,
        next_payment_amount: dec!(510),
    }
}

fn sqlite() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn sequential_ids_skip_past_highest() {
    assert_eq!(sequential_id('L', std::iter::empty()), "L001");
    assert_eq!(
        sequential_id('L', ["L001", "L007", "U009", "Lx"].into_iter()),
        "L008"
    );
}

#[test]
fn lifecycle_transitions_in_memory() {
    let mut repo = InMemoryLoans::new([loan("L001", "U001", LoanStatus::Pending, "2024-01-10")]);
    let on = date("2024-01-11");

    assert!(matches!(
        repo.update_status("L001", LoanStatus::Completed, on),
        Err(RepoError::InvalidTransition { .. })
    ));

    let active = repo.update_status("L001", LoanStatus::Active, on).unwrap();
    assert_eq!(active.status, LoanStatus::Active);
    assert_eq!(active.next_payment, Some(date("2024-01-12")));
    assert_eq!(active.next_payment_amount, dec!(510));

    let done = repo.update_status("L001", LoanStatus::Completed, on).unwrap();
    assert_eq!(done.total_paid, dec!(15296));
    assert_eq!(done.progress_pct(), dec!(100));
    assert_eq!(done.next_payment, None);

    assert!(matches!(
        repo.update_status("L001", LoanStatus::Active, on),
        Err(RepoError::InvalidTransition { .. })
    ));
    assert!(matches!(
        repo.update_status("L404", LoanStatus::Active, on),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn rejected_loans_stay_rejected() {
    let mut repo = InMemoryLoans::new([loan("L001", "U001", LoanStatus::Pending, "2024-01-10")]);
    let on = date("2024-01-11");
    repo.update_status("L001", LoanStatus::Rejected, on).unwrap();
    for to in LoanStatus::ALL {
        assert!(repo.update_status("L001", *to, on).is_err());
    }
}

#[test]
fn in_memory_users_reject_duplicate_email() {
    let mut users = InMemoryUsers::new([user("U001", "John", "john@example.com")]);
    assert!(matches!(
        users.insert(user("U002", "Johnny", "JOHN@example.com")),
        Err(RepoError::Duplicate { kind: "email", .. })
    ));
    assert_eq!(users.next_id().unwrap(), "U002");
    let u = users.update_kyc_status("U001", KycStatus::Verified).unwrap();
    assert_eq!(u.kyc_status, KycStatus::Verified);
}

#[test]
fn sqlite_round_trips_users_and_loans() {
    let conn = sqlite();
    let mut store = SqliteStore::new(&conn);

    UserRepository::insert(&mut store, user("U001", "John", "john@example.com")).unwrap();
    UserRepository::insert(&mut store, user("U002", "Sarah", "sarah@example.com")).unwrap();
    LoanRepository::insert(&mut store, loan("L001", "U001", LoanStatus::Pending, "2024-01-10"))
        .unwrap();
    LoanRepository::insert(&mut store, loan("L002", "U002", LoanStatus::Active, "2024-01-09"))
        .unwrap();

    let got = LoanRepository::get(&store, "L001").unwrap();
    assert_eq!(got, loan("L001", "U001", LoanStatus::Pending, "2024-01-10"));

    let ids: Vec<String> = LoanRepository::list(&store)
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ids, vec!["L001", "L002"]);

    assert_eq!(LoanRepository::next_id(&store).unwrap(), "L003");
    assert_eq!(UserRepository::next_id(&store).unwrap(), "U003");
    assert_eq!(store.list_for_user("U002").unwrap().len(), 1);

    let found = store.find_by_email("SARAH@example.com").unwrap().unwrap();
    assert_eq!(found.id, "U002");
}

#[test]
fn sqlite_status_updates_persist() {
    let conn = sqlite();
    let mut store = SqliteStore::new(&conn);
    UserRepository::insert(&mut store, user("U001", "John", "john@example.com")).unwrap();
    LoanRepository::insert(&mut store, loan("L001", "U001", LoanStatus::Pending, "2024-01-10"))
        .unwrap();

    store
        .update_status("L001", LoanStatus::Active, date("2024-01-10"))
        .unwrap();
    let reread = LoanRepository::get(&SqliteStore::new(&conn), "L001").unwrap();
    assert_eq!(reread.status, LoanStatus::Active);
    assert_eq!(reread.next_payment, Some(date("2024-01-11")));

    let status: String = conn
        .query_row("SELECT status FROM loans WHERE id='L001'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "active");
}

#[test]
fn sqlite_duplicates_and_missing_records() {
    let conn = sqlite();
    let mut store = SqliteStore::new(&conn);
    UserRepository::insert(&mut store, user("U001", "John", "john@example.com")).unwrap();
    assert!(matches!(
        UserRepository::insert(&mut store, user("U001", "Jim", "jim@example.com")),
        Err(RepoError::Duplicate { kind: "user", .. })
    ));
    assert!(matches!(
        UserRepository::insert(&mut store, user("U002", "Jon", "john@example.com")),
        Err(RepoError::Duplicate { kind: "email", .. })
    ));

    LoanRepository::insert(&mut store, loan("L001", "U001", LoanStatus::Pending, "2024-01-10"))
        .unwrap();
    assert!(matches!(
        LoanRepository::insert(&mut store, loan("L001", "U001", LoanStatus::Pending, "2024-01-10")),
        Err(RepoError::Duplicate { kind: "loan", .. })
    ));
    assert!(matches!(
        LoanRepository::get(&store, "L999"),
        Err(RepoError::NotFound { kind: "loan", .. })
    ));
    assert!(matches!(
        store.update_kyc_status("U999", KycStatus::Verified),
        Err(RepoError::NotFound { kind: "user", .. })
    ));
}

#[test]
fn sqlite_flags_corrupt_amounts() {
    let conn = sqlite();
    let mut store = SqliteStore::new(&conn);
    UserRepository::insert(&mut store, user("U001", "John", "john@example.com")).unwrap();
    conn.execute(
        "INSERT INTO loans(id, user_id, amount, term_days, purpose, status, applied_date, total_amount)
         VALUES ('L001','U001','lots',30,'bills','pending','2024-01-10','100')",
        [],
    )
    .unwrap();
    assert!(matches!(
        LoanRepository::get(&store, "L001"),
        Err(RepoError::Corrupt { field: "amount", .. })
    ));
}
