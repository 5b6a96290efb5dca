// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_base_currency, set_base_currency};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("currency", sub)) => {
            if let Some(code) = sub.get_one::<String>("code") {
                let ccy = code.to_uppercase();
                set_base_currency(conn, &ccy)?;
                println!("Default currency set to {}", ccy);
            } else {
                println!("{}", get_base_currency(conn)?);
            }
        }
        _ => {}
    }
    Ok(())
}
