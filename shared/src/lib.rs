pub mod alert;
pub mod append;
pub mod data_js;
pub mod extra;
pub mod julia;
pub mod log;
pub mod number;
pub mod publish;
pub mod s3;
pub mod schema;
pub mod submission;
pub mod validate;

pub use schema::{Bench, BenchmarkData, Commit, Entry, PendingEntry, Person};
