pub mod backoff;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod format;
pub mod query;
pub mod registry;
pub mod sink;
pub mod tail;

#[cfg(test)]
mod tests;
