// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::retry::FINAL_RETRY_COUNT;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let today = chrono::Local::now().date_naive().to_string();
    let mut rows = Vec::new();

    // 1) More than one effective version for a pair
    let mut stmt = conn.prepare(
        "SELECT source_account_id, destination_account_id, COUNT(*) FROM schedules
         WHERE active=1 AND deleted=0 AND valid_from<=?1
           AND (valid_to IS NULL OR valid_to>=?1)
         GROUP BY source_account_id, destination_account_id HAVING COUNT(*)>1",
    )?;
    let mut cur = stmt.query(params![today])?;
    while let Some(r) = cur.next()? {
        let (s, d, n): (i64, i64, i64) = (r.get(0)?, r.get(1)?, r.get(2)?);
        rows.push(vec![
            "duplicate_effective".into(),
            format!("pair {}->{} has {} versions", s, d, n),
        ]);
    }

    // 2) More than one future version for a pair
    let mut stmt2 = conn.prepare(
        "SELECT source_account_id, destination_account_id, COUNT(*) FROM schedules
         WHERE active=1 AND deleted=0 AND valid_from>?1
         GROUP BY source_account_id, destination_account_id HAVING COUNT(*)>1",
    )?;
    let mut cur2 = stmt2.query(params![today])?;
    while let Some(r) = cur2.next()? {
        let (s, d, n): (i64, i64, i64) = (r.get(0)?, r.get(1)?, r.get(2)?);
        rows.push(vec![
            "duplicate_future".into(),
            format!("pair {}->{} has {} pending versions", s, d, n),
        ]);
    }

    // 3) Executions past the retry cutoff
    let mut stmt3 =
        conn.prepare("SELECT id, retry_count FROM executions WHERE retry_count>?1")?;
    let mut cur3 = stmt3.query(params![FINAL_RETRY_COUNT])?;
    while let Some(r) = cur3.next()? {
        let (id, rc): (i64, u32) = (r.get(0)?, r.get(1)?);
        rows.push(vec![
            "retry_overrun".into(),
            format!("execution {} at retry {}", id, rc),
        ]);
    }

    // 4) Non-success executions missing a failure reason
    let mut stmt4 = conn.prepare(
        "SELECT id, status FROM executions
         WHERE status!='SUCCESS' AND (failure_reason IS NULL OR failure_reason='')",
    )?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let (id, st): (i64, String) = (r.get(0)?, r.get(1)?);
        rows.push(vec![
            "missing_reason".into(),
            format!("execution {} is {} with no reason", id, st),
        ]);
    }

    // 5) Corrupt or negative balances
    let mut stmt5 = conn.prepare("SELECT name, balance FROM accounts")?;
    let mut cur5 = stmt5.query([])?;
    while let Some(r) = cur5.next()? {
        let (name, bal): (String, String) = (r.get(0)?, r.get(1)?);
        match bal.parse::<Decimal>() {
            Ok(d) if d < Decimal::ZERO => {
                rows.push(vec!["negative_balance".into(), format!("{}: {}", name, bal)]);
            }
            Ok(_) => {}
            Err(_) => {
                rows.push(vec!["corrupt_balance".into(), format!("{}: '{}'", name, bal)]);
            }
        }
    }

    // 6) Live schedules pointing at frozen or missing accounts
    let mut stmt6 = conn.prepare(
        "SELECT s.id, a1.frozen, a2.frozen, a1.id, a2.id FROM schedules s
         LEFT JOIN accounts a1 ON s.source_account_id=a1.id
         LEFT JOIN accounts a2 ON s.destination_account_id=a2.id
         WHERE s.active=1 AND s.deleted=0",
    )?;
    let mut cur6 = stmt6.query([])?;
    while let Some(r) = cur6.next()? {
        let id: i64 = r.get(0)?;
        let src_frozen: Option<bool> = r.get(1)?;
        let dst_frozen: Option<bool> = r.get(2)?;
        let src_id: Option<i64> = r.get(3)?;
        let dst_id: Option<i64> = r.get(4)?;
        if src_id.is_none() || dst_id.is_none() {
            rows.push(vec![
                "missing_account".into(),
                format!("schedule {} references a missing account", id),
            ]);
        } else if src_frozen == Some(true) || dst_frozen == Some(true) {
            rows.push(vec![
                "frozen_account".into(),
                format!("schedule {} references a frozen account", id),
            ]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
