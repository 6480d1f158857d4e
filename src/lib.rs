//! Scoring and record keeping for taekwondo belt-promotion evaluations.
//!
//! [`scoring`] holds the pure engine. The other modules move evaluations in
//! and out of CSV sheets, Postgres and markdown reports.

pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod scoring;
