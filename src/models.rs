// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One effective period of a standing monthly transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: Decimal,
    pub transfer_day: u32,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub active: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Retry,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Retry => "RETRY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(ExecutionStatus::Success),
            "FAILED" => Some(ExecutionStatus::Failed),
            "RETRY" => Some(ExecutionStatus::Retry),
            _ => None,
        }
    }
}

/// Audit-trail row for one attempted transfer on one calendar day. Amount and
/// account refs are copied from the schedule at execution time so the record
/// stays accurate if the schedule is later amended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub schedule_id: i64,
    pub run_date: NaiveDate,
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: Decimal,
    pub executed_at: String,
    pub status: ExecutionStatus,
    pub failure_reason: Option<String>,
    pub retry_count: u32,
}
