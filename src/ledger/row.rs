use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

/// One ledger entry: `date,account,memo,debit,credit`
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub date: String,
    pub account: String,
    pub memo: String,
    pub debit: f64,
    pub credit: f64,
}

impl LedgerRow {
    /// Build a row from raw fields. Missing trailing fields are empty.
    pub fn from_record(record: &StringRecord) -> Self {
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        Self {
            date: field(0).to_string(),
            account: field(1).to_string(),
            memo: field(2).to_string(),
            debit: parse_amount(field(3)),
            credit: parse_amount(field(4)),
        }
    }

    /// Signed contribution of this row: debit positive, credit negative
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }
}

/// Rows of one ledger file, immutable once parsed
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub name: String,
    pub rows: Vec<LedgerRow>,
}

impl ParsedFile {
    /// Tokenize file content: one row per line, fields split on every comma.
    ///
    /// No quoting and no header row. Blank lines are skipped.
    pub fn parse(name: &str, content: &str) -> Self {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(content.trim().as_bytes());

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            match record {
                Ok(record) if record.iter().all(|f| f.trim().is_empty()) => {}
                Ok(record) => rows.push(LedgerRow::from_record(&record)),
                Err(err) => debug!(file = name, line, %err, "Skipping unreadable ledger line"),
            }
        }

        Self {
            name: name.to_string(),
            rows,
        }
    }
}

/// Empty and non-numeric amounts count as zero.
fn parse_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!(value = raw, "Non-numeric amount treated as zero");
            0.0
        }
    }
}
