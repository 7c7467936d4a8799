//! Human friendly table rendering for osv-scanner vulnerability results.
//!
//! Results are turned into display rows ([`report::rows`]), one per group of
//! equivalent advisories, and written as a table whose styling depends on
//! whether the destination is a terminal ([`report::presentation`]).
//! Vulnerabilities whose code is not called are listed in their own section
//! below the called ones ([`report::table`]).

pub mod cli;
pub mod config;
pub mod report;
pub mod results;
