pub mod adapter;
pub mod error;
pub mod executor;
pub mod params;
pub mod sql;
