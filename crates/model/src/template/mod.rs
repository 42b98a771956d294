pub mod field_spec;
