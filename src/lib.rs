pub mod api;
pub mod cache;
pub mod config;
pub mod export;
pub mod humanize;
pub mod jobs;
pub mod ledger;
pub mod observability;
pub mod reports;
pub mod storage;
