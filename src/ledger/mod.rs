//! Ledger file access and row parsing
//!
//! Ledger files are plain comma-separated text, one entry per line:
//!
//! ```text
//! 2023-01-01,Cash,Opening deposit,100,0
//! 2023-01-01,Common Stock,Opening deposit,,100
//! ```
//!
//! Columns are `date,account,memo,debit,credit`. There is no header row and
//! no quoting. Amounts that are empty or not numeric count as zero.
//!
//! [`LedgerSource`] is the only capability the report pipeline needs from the
//! outside world: list the files in a location and read one of them.
//! [`StoredLedger`] implements it on top of [`crate::storage::StorageClient`].

pub mod error;
pub mod row;
pub mod source;

pub use error::{LedgerError, Result};
pub use row::{LedgerRow, ParsedFile};
pub use source::{LedgerSource, StoredLedger};
