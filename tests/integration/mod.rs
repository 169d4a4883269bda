pub mod client_overwrite;
pub mod concurrency;
pub mod import_runs;
