// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).num_args(1).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Record id, e.g. L001")
}

pub fn build_cli() -> Command {
    Command::new("ezlend")
        .version(crate_version!())
        .about("Short-term loan quotes, applications and loan book administration")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(json_flags(
            Command::new("quote")
                .about("Estimate repayments for a loan")
                .arg(req("amount", "Principal in whole currency units"))
                .arg(req("term", "Term in days (daily) or months (monthly)"))
                .arg(
                    Arg::new("convention")
                        .long("convention")
                        .value_parser(["daily", "monthly"])
                        .default_value("daily")
                        .help("Interest convention"),
                )
                .arg(
                    Arg::new("unbounded")
                        .long("unbounded")
                        .action(ArgAction::SetTrue)
                        .help("Skip the configured product bounds"),
                ),
        ))
        .subcommand(json_flags(
            Command::new("apply")
                .about("Run a loan application through every step and submit it")
                .arg(req("amount", "Principal in whole currency units"))
                .arg(req("term", "Term in days"))
                .arg(req("purpose", "emergency|bills|medical|education|home|other"))
                .arg(req("first-name", "Applicant first name"))
                .arg(req("last-name", "Applicant last name"))
                .arg(req("id-number", "13-digit national ID number"))
                .arg(req("email", "Applicant email"))
                .arg(opt("phone", "Phone number"))
                .arg(req(
                    "employment",
                    "employed|self-employed|contract|pensioner|student",
                ))
                .arg(opt("employer", "Employer name"))
                .arg(req("income", "Monthly income"))
                .arg(opt("bank", "absa|fnb|standard|nedbank|capitec|other"))
                .arg(opt("account-type", "Bank account type"))
                .arg(opt("account-number", "Bank account number")),
        ))
        .subcommand(
            Command::new("loan")
                .about("Loan book")
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("status", "pending|active|completed|rejected"))
                        .arg(opt("search", "Match loan id, borrower name or email"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(clap::value_parser!(usize))
                                .help("Show at most this many loans"),
                        ),
                ))
                .subcommand(json_flags(Command::new("show").arg(id_arg())))
                .subcommand(Command::new("approve").arg(id_arg()))
                .subcommand(Command::new("reject").arg(id_arg()))
                .subcommand(Command::new("complete").arg(id_arg())),
        )
        .subcommand(
            Command::new("user")
                .about("Borrower records")
                .subcommand(
                    Command::new("add")
                        .arg(req("first-name", "First name"))
                        .arg(req("last-name", "Last name"))
                        .arg(req("email", "Email address"))
                        .arg(opt("phone", "Phone number"))
                        .arg(opt("id-number", "National ID number")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(json_flags(Command::new("show").arg(id_arg())))
                .subcommand(
                    Command::new("kyc")
                        .arg(id_arg())
                        .arg(req("status", "verified|pending|rejected")),
                ),
        )
        .subcommand(json_flags(
            Command::new("dashboard")
                .about("Borrower overview")
                .arg(req("user", "User id")),
        ))
        .subcommand(
            Command::new("admin")
                .about("Loan book KPIs")
                .subcommand(json_flags(Command::new("stats"))),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("loans")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .value_parser(["csv", "json"])
                            .default_value("csv"),
                    )
                    .arg(req("out", "Output file")),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Lending settings")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
