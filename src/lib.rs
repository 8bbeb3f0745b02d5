pub mod aggregators;
pub mod canonicalize;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod record;
pub mod report;
pub mod sources;
