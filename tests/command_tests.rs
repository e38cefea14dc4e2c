// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ezlend::commands::{apply, loans, quote, settings, users};
use ezlend::config::LendingConfig;
use ezlend::errors::{QuoteError, WizardError};
use ezlend::models::LoanStatus;
use ezlend::repository::{LoanRepository, SqliteStore};
use ezlend::{cli, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn sub_of<'a>(m: &'a clap::ArgMatches, name: &str) -> &'a clap::ArgMatches {
    match m.subcommand() {
        Some((n, sub)) if n == name => sub,
        _ => panic!("{} command not parsed", name),
    }
}

fn apply_args<'a>(email: &'a str, id_number: &'a str) -> Vec<&'a str> {
    vec![
        "ezlend",
        "apply",
        "--amount",
        "5000",
        "--term",
        "30",
        "--purpose",
        "emergency",
        "--first-name",
        "John",
        "--last-name",
        "Doe",
        "--id-number",
        id_number,
        "--email",
        email,
        "--employment",
        "self-employed",
        "--income",
        "25000",
        "--bank",
        "capitec",
    ]
}

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn quote_daily_and_monthly() {
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", " 500 ", "--term", "7"]);
    let q = quote::compute(&cfg, sub_of(&m, "quote")).unwrap();
    assert_eq!(q.periodic_payment, dec!(72));
    assert_eq!(q.total_interest, dec!(2));
    assert_eq!(q.total_repayment, dec!(502));

    let m = cli::build_cli().get_matches_from([
        "ezlend",
        "quote",
        "--amount",
        "10000",
        "--term",
        "12",
        "--convention",
        "monthly",
    ]);
    let q = quote::compute(&cfg, sub_of(&m, "quote")).unwrap();
    assert_eq!(q.periodic_payment, dec!(1033));
}

#[test]
fn quote_rejects_zero_and_out_of_range() {
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", "0", "--term", "7"]);
    let err = quote::compute(&cfg, sub_of(&m, "quote")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuoteError>(),
        Some(QuoteError::InvalidInput(_))
    ));

    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", "100", "--term", "7"]);
    let err = quote::compute(&cfg, sub_of(&m, "quote")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuoteError>(),
        Some(QuoteError::OutOfRange { .. })
    ));

    let m = cli::build_cli().get_matches_from([
        "ezlend",
        "quote",
        "--amount",
        "100",
        "--term",
        "7",
        "--unbounded",
    ]);
    assert!(quote::compute(&cfg, sub_of(&m, "quote")).is_ok());
}

#[test]
fn quote_huge_amount_reports_instead_of_panicking() {
    let cfg = LendingConfig::default();
    let huge = "79228162514264337593543950335";
    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", huge, "--term", "365"]);
    let err = quote::compute(&cfg, sub_of(&m, "quote")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuoteError>(),
        Some(QuoteError::OutOfRange { field: "principal", .. })
    ));

    let m = cli::build_cli().get_matches_from([
        "ezlend",
        "quote",
        "--amount",
        huge,
        "--term",
        "365",
        "--unbounded",
    ]);
    let err = quote::compute(&cfg, sub_of(&m, "quote")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuoteError>(),
        Some(QuoteError::InvalidInput(_))
    ));
}

#[test]
fn quote_accepts_any_amount_and_term_inside_bounds() {
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", "5250", "--term", "10"]);
    let q = quote::compute(&cfg, sub_of(&m, "quote")).unwrap();
    // 5250 * 0.24 * 10 / 365 = 34.52...
    assert_eq!(q.total_interest, dec!(35));
    assert_eq!(q.total_repayment, dec!(5285));
    assert_eq!(q.periods, 10);
}

#[test]
fn quote_uses_configured_rate() {
    let conn = setup();
    let m = cli::build_cli().get_matches_from(["ezlend", "config", "set", "annual_rate", "0.365"]);
    settings::handle(&conn, sub_of(&m, "config")).unwrap();
    let cfg = LendingConfig::load(&conn).unwrap();
    assert_eq!(cfg.annual_rate, dec!(0.365));

    let m = cli::build_cli().get_matches_from(["ezlend", "quote", "--amount", "1000", "--term", "10"]);
    let q = quote::compute(&cfg, sub_of(&m, "quote")).unwrap();
    assert_eq!(q.total_interest, dec!(10));
}

#[test]
fn apply_files_pending_loan_and_application() {
    let mut conn = setup();
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(apply_args("john@example.com", "8001015009087"));
    let filed = apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap();

    assert_eq!(filed.loan.id, "L001");
    assert_eq!(filed.user.id, "U001");
    assert!(filed.new_user);
    assert_eq!(filed.loan.total_amount, dec!(5099));
    assert_eq!(filed.loan.applied_date, now().date());

    let (reference, income, bank): (String, String, String) = conn
        .query_row(
            "SELECT reference, monthly_income, bank FROM applications WHERE loan_id='L001'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(reference, filed.application.reference);
    assert_eq!(income, "25000");
    assert_eq!(bank, "capitec");

    let m = cli::build_cli().get_matches_from(apply_args("John@Example.com", "8001015009087"));
    let again = apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap();
    assert!(!again.new_user);
    assert_eq!(again.loan.id, "L002");
    assert_ne!(again.application.reference, filed.application.reference);
}

#[test]
fn apply_stops_at_first_failing_step_without_writing() {
    let mut conn = setup();
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(apply_args("john@example.com", "12345"));
    let err = apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WizardError>(),
        Some(WizardError::Incomplete { .. })
    ));
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM loans", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn loan_commands_move_through_lifecycle() {
    let mut conn = setup();
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(apply_args("john@example.com", "8001015009087"));
    apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap();

    let m = cli::build_cli().get_matches_from(["ezlend", "loan", "complete", "L001"]);
    assert!(loans::handle(&conn, sub_of(&m, "loan")).is_err());

    let m = cli::build_cli().get_matches_from(["ezlend", "loan", "approve", "L001"]);
    loans::handle(&conn, sub_of(&m, "loan")).unwrap();
    let m = cli::build_cli().get_matches_from(["ezlend", "loan", "complete", "L001"]);
    loans::handle(&conn, sub_of(&m, "loan")).unwrap();

    let loan = SqliteStore::new(&conn).get("L001").unwrap();
    assert_eq!(loan.status, LoanStatus::Completed);
    assert_eq!(loan.total_paid, loan.total_amount);
}

#[test]
fn loan_list_filters_and_searches() {
    let mut conn = setup();
    let cfg = LendingConfig::default();
    let m = cli::build_cli().get_matches_from(apply_args("john@example.com", "8001015009087"));
    apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap();
    let m = cli::build_cli().get_matches_from(apply_args("sarah@example.com", "8501015009081"));
    apply::submit(&mut conn, &cfg, sub_of(&m, "apply"), now()).unwrap();
    let m = cli::build_cli().get_matches_from(["ezlend", "loan", "reject", "L002"]);
    loans::handle(&conn, sub_of(&m, "loan")).unwrap();

    let list = |args: &[&str]| {
        let mut full = vec!["ezlend", "loan", "list"];
        full.extend_from_slice(args);
        let m = cli::build_cli().get_matches_from(full);
        let loan_m = sub_of(&m, "loan");
        loans::query_rows(&conn, sub_of(loan_m, "list")).unwrap()
    };

    assert_eq!(list(&[]).len(), 2);
    let pending = list(&["--status", "pending"]);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, "L001");
    let sarah = list(&["--search", "SARAH"]);
    assert_eq!(sarah.len(), 1);
    assert_eq!(sarah[0].status, LoanStatus::Rejected);
    assert_eq!(list(&["--search", "l00"]).len(), 2);
    assert_eq!(list(&["--limit", "1"]).len(), 1);
    assert!(list(&["--search", "nobody"]).is_empty());
}

#[test]
fn user_add_and_list() {
    let conn = setup();
    let m = cli::build_cli().get_matches_from([
        "ezlend",
        "user",
        "add",
        "--first-name",
        " Sarah ",
        "--last-name",
        "Johnson",
        "--email",
        "sarah@example.com",
    ]);
    let user_m = sub_of(&m, "user");
    let u = users::add(&conn, sub_of(user_m, "add")).unwrap();
    assert_eq!(u.id, "U001");
    assert_eq!(u.first_name, "Sarah");

    assert!(users::add(&conn, sub_of(user_m, "add")).is_err());

    let m = cli::build_cli().get_matches_from(["ezlend", "user", "kyc", "U001", "--status", "verified"]);
    users::handle(&conn, sub_of(&m, "user")).unwrap();
    let rows = users::query_rows(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kyc_status.as_str(), "verified");
    assert_eq!(rows[0].active_loans, 0);
}

fn add_user(conn: &Connection, extra: &[&'static str]) -> anyhow::Result<ezlend::models::User> {
    let mut args = vec![
        "ezlend",
        "user",
        "add",
        "--first-name",
        "Thabo",
        "--last-name",
        "Mokoena",
    ];
    args.extend_from_slice(extra);
    let m = cli::build_cli().get_matches_from(args);
    users::add(conn, sub_of(sub_of(&m, "user"), "add"))
}

#[test]
fn user_add_checks_email_id_and_phone_like_the_application() {
    let conn = setup();
    assert!(add_user(&conn, &["--email", "thabo@mail"]).is_err());
    assert!(add_user(&conn, &["--email", "thabo mail@x.com"]).is_err());
    assert!(add_user(&conn, &["--email", "thabo@mail.com", "--id-number", "12345"]).is_err());
    assert!(add_user(&conn, &["--email", "thabo@mail.com", "--phone", "call me"]).is_err());
    assert!(users::query_rows(&conn).unwrap().is_empty());

    let u = add_user(&conn, &[
        "--email",
        "thabo@mail.com",
        "--id-number",
        "9001015800086",
        "--phone",
        "+27 82 555 0101",
    ])
    .unwrap();
    assert_eq!(u.id, "U001");
    assert_eq!(u.id_number.as_deref(), Some("9001015800086"));
}

#[test]
fn config_set_validates() {
    let conn = setup();
    let bad_key = cli::build_cli().get_matches_from(["ezlend", "config", "set", "apr", "0.2"]);
    assert!(settings::handle(&conn, sub_of(&bad_key, "config")).is_err());

    let inverted =
        cli::build_cli().get_matches_from(["ezlend", "config", "set", "min_principal", "60000"]);
    assert!(settings::handle(&conn, sub_of(&inverted, "config")).is_err());

    let ok = cli::build_cli().get_matches_from(["ezlend", "config", "set", "max_principal", "100000"]);
    settings::handle(&conn, sub_of(&ok, "config")).unwrap();
    let cfg = LendingConfig::load(&conn).unwrap();
    assert_eq!(cfg.max_principal, dec!(100000));
    assert_eq!(cfg.min_principal, dec!(500));
}
