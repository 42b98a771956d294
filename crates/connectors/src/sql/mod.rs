pub mod dialect;
pub mod mysql;
pub mod postgres;
