//! Basic financial statement over a fixed chart of accounts
//!
//! Balances accumulate as `debit - credit` like every other report. When
//! printed, credit-normal groups (revenues, liabilities, equity) flip sign so
//! each line reads positive in its usual direction. With that convention the
//! closing line `Assets = Liabilities + Equity` balances whenever the ledger
//! itself does. The line is printed, never checked.

use std::collections::HashMap;
use std::sync::Arc;

use super::format_amount;
use crate::ledger::ParsedFile;

pub const TITLE: &str = "Basic Financial Statement";

pub const REVENUES: &[&str] = &["Sales Revenue"];

pub const EXPENSES: &[&str] = &[
    "Cost of Goods Sold",
    "Salaries Expense",
    "Rent Expense",
    "Utilities Expense",
    "Interest Expense",
    "Tax Expense",
];

pub const ASSETS: &[&str] = &[
    "Cash",
    "Accounts Receivable",
    "Inventory",
    "Fixed Assets",
    "Prepaid Expenses",
];

pub const LIABILITIES: &[&str] = &[
    "Accounts Payable",
    "Loan Payable",
    "Sales Tax Payable",
    "Accrued Liabilities",
    "Unearned Revenue",
    "Dividends Payable",
];

pub const EQUITY: &[&str] = &["Common Stock", "Retained Earnings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    fn present(self, balance: f64) -> f64 {
        match self {
            NormalBalance::Debit => balance,
            NormalBalance::Credit => -balance,
        }
    }
}

/// Every account the statement knows about
pub fn taxonomy() -> impl Iterator<Item = &'static str> {
    [REVENUES, EXPENSES, ASSETS, LIABILITIES, EQUITY]
        .into_iter()
        .flatten()
        .copied()
}

/// Section totals as printed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatementTotals {
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub assets: f64,
    pub liabilities: f64,
    /// Equity accounts plus net income
    pub equity: f64,
}

struct Statement {
    balances: HashMap<&'static str, f64>,
    lines: Vec<String>,
}

impl Statement {
    fn new(files: &[Arc<ParsedFile>]) -> Self {
        let mut balances: HashMap<&'static str, f64> = taxonomy().map(|a| (a, 0.0)).collect();
        for row in files.iter().flat_map(|file| file.rows.iter()) {
            if let Some(balance) = balances.get_mut(row.account.as_str()) {
                *balance += row.net();
            }
        }

        Self {
            balances,
            lines: Vec::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn amount(&mut self, label: &str, value: f64) {
        self.lines.push(format!("{label},{}", format_amount(value)));
    }

    fn group(&mut self, accounts: &[&'static str], normal: NormalBalance) -> f64 {
        let mut total = 0.0;
        for &account in accounts {
            let value = normal.present(self.balances.get(account).copied().unwrap_or(0.0));
            self.amount(account, value);
            total += value;
        }
        total
    }

    fn build(mut self) -> (Vec<String>, StatementTotals) {
        self.text(TITLE);
        self.text("");
        self.text("Income Statement");
        let revenue = self.group(REVENUES, NormalBalance::Credit);
        let expenses = self.group(EXPENSES, NormalBalance::Debit);
        let net_income = revenue - expenses;
        self.amount("Net Income", net_income);
        self.text("");

        self.text("Balance Sheet");
        self.text("Assets");
        let assets = self.group(ASSETS, NormalBalance::Debit);
        self.amount("Total Assets", assets);
        self.text("");

        self.text("Liabilities");
        let liabilities = self.group(LIABILITIES, NormalBalance::Credit);
        self.amount("Total Liabilities", liabilities);
        self.text("");

        self.text("Equity");
        let mut equity = self.group(EQUITY, NormalBalance::Credit);
        self.amount("Retained Earnings (Net Income)", net_income);
        equity += net_income;
        self.amount("Total Equity", equity);
        self.text("");

        self.lines.push(format!(
            "Assets = Liabilities + Equity, {} = {}",
            format_amount(assets),
            format_amount(liabilities + equity)
        ));

        let totals = StatementTotals {
            revenue,
            expenses,
            net_income,
            assets,
            liabilities,
            equity,
        };
        (self.lines, totals)
    }
}

pub fn totals(files: &[Arc<ParsedFile>]) -> StatementTotals {
    Statement::new(files).build().1
}

pub fn financial_statement(files: &[Arc<ParsedFile>]) -> Vec<String> {
    Statement::new(files).build().0
}
