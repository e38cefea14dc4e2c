// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{LendingConfig, set_setting};
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let cfg = LendingConfig::load(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cfg)? {
                let rows = cfg
                    .entries()
                    .into_iter()
                    .map(|(k, v)| vec![k, v])
                    .collect();
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            let value = arg(sub, "value")?;
            set_setting(conn, key, value)?;
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
