use indexmap::IndexMap;
use std::sync::Arc;

use super::format_amount;
use crate::ledger::ParsedFile;

pub const HEADER: &str = "Account,Balance";

/// Net balance per account, in order of first appearance
pub fn balances(files: &[Arc<ParsedFile>]) -> IndexMap<String, f64> {
    let mut balances: IndexMap<String, f64> = IndexMap::new();
    for row in files.iter().flat_map(|file| file.rows.iter()) {
        *balances.entry(row.account.clone()).or_insert(0.0) += row.net();
    }
    balances
}

pub fn account_balances(files: &[Arc<ParsedFile>]) -> Vec<String> {
    std::iter::once(HEADER.to_string())
        .chain(
            balances(files)
                .iter()
                .map(|(account, balance)| format!("{account},{}", format_amount(*balance))),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::render;

    fn file(name: &str, content: &str) -> Arc<ParsedFile> {
        Arc::new(ParsedFile::parse(name, content))
    }

    #[test]
    fn test_single_cash_row() {
        let files = vec![file("a.csv", "2023-01-01,Cash,,100,0")];
        assert_eq!(render(&account_balances(&files)), "Account,Balance\nCash,100.00");
    }

    #[test]
    fn test_same_account_across_files_is_summed() {
        let files = vec![
            file("a.csv", "2023-01-01,Cash,,100,0\n2023-01-02,Rent Expense,,40,0"),
            file("b.csv", "2023-02-01,Cash,,0,40\n2023-02-02,Cash,,12.5,"),
        ];
        assert_eq!(
            account_balances(&files),
            vec!["Account,Balance", "Cash,72.50", "Rent Expense,40.00"]
        );
    }

    #[test]
    fn test_first_seen_order_is_kept() {
        let files = vec![file("a.csv", "d,Zeta,,1,0\nd,Alpha,,2,0\nd,Zeta,,1,0\nd,10,,3,0")];
        let names: Vec<_> = balances(&files).into_keys().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "10"]);
    }

    #[test]
    fn test_account_names_are_case_sensitive() {
        let files = vec![file("a.csv", "d,Cash,,1,0\nd,cash,,2,0")];
        assert_eq!(balances(&files).len(), 2);
    }

    #[test]
    fn test_totals_do_not_depend_on_file_order() {
        let a = file("a.csv", "d,Cash,,100,0\nd,Sales Revenue,,0,100\nd,Inventory,,30,0");
        let b = file("b.csv", "d,Cash,,0,30\nd,Inventory,,5,0\nd,Accounts Payable,,0,5");
        let c = file("c.csv", "d,Sales Revenue,,0,7\nd,Cash,,7,0");

        let forward = balances(&[a.clone(), b.clone(), c.clone()]);
        let backward = balances(&[c, b, a]);

        for (account, balance) in &forward {
            assert!((backward[account] - balance).abs() < 1e-9, "{account}");
        }
        assert_eq!(forward.len(), backward.len());
        let total: f64 = forward.values().sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn test_half_cent_balances_round_up() {
        let files = vec![file(
            "a.csv",
            "d,A,,0.125,0\nd,B,,1.125,0\nd,C,,0.625,0\nd,D,,2.5,0",
        )];
        assert_eq!(
            render(&account_balances(&files)),
            "Account,Balance\nA,0.13\nB,1.13\nC,0.63\nD,2.50"
        );
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let files = vec![file("a.csv", "d,Cash,,0.1,0\nd,Cash,,0.2,0\nd,Loan Payable,,,0.3")];
        assert_eq!(
            render(&account_balances(&files)),
            render(&account_balances(&files))
        );
    }
}
