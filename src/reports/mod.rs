//! Report computations
//!
//! Each report is a pure function from the parsed ledger files to the lines
//! of its output table. They share nothing but their input, so the export
//! orchestrator runs them concurrently.
//!
//! | Report | Status field | Skips file |
//! |--------|--------------|------------|
//! | Account balances | `accounts` | - |
//! | Yearly cash summary | `yearly` | `yearly.csv` |
//! | Financial statement | `fs` | `fs.csv` |
//!
//! The skipped names are matched literally. They keep a previous run's
//! output from being read back as input when both live in one directory.

pub mod accounts;
pub mod statement;
pub mod yearly;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ledger::ParsedFile;

const LEDGER_EXTENSION: &str = ".csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Accounts,
    Yearly,
    #[serde(rename = "fs")]
    FinancialStatement,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Accounts,
        ReportKind::Yearly,
        ReportKind::FinancialStatement,
    ];

    /// Name of this report's field in a job state
    pub fn field(self) -> &'static str {
        match self {
            ReportKind::Accounts => "accounts",
            ReportKind::Yearly => "yearly",
            ReportKind::FinancialStatement => "fs",
        }
    }

    fn excluded_file(self) -> Option<&'static str> {
        match self {
            ReportKind::Accounts => None,
            ReportKind::Yearly => Some("yearly.csv"),
            ReportKind::FinancialStatement => Some("fs.csv"),
        }
    }

    /// Whether a listed file is input to this report
    pub fn includes(self, file_name: &str) -> bool {
        file_name.ends_with(LEDGER_EXTENSION) && self.excluded_file() != Some(file_name)
    }

    /// Output lines for the given files
    pub fn compute(self, files: &[Arc<ParsedFile>]) -> Vec<String> {
        match self {
            ReportKind::Accounts => accounts::account_balances(files),
            ReportKind::Yearly => yearly::yearly_cash_summary(files),
            ReportKind::FinancialStatement => statement::financial_statement(files),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Artifact body: lines joined by `\n`, no trailing newline
pub fn render(lines: &[String]) -> String {
    lines.join("\n")
}

/// Two decimals, halves rounded away from zero; zero never renders with a sign.
pub(crate) fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round();
    let value = if cents == 0.0 { 0.0 } else { cents / 100.0 };
    format!("{value:.2}")
}
