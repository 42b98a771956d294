pub mod adapter;
pub mod row;
