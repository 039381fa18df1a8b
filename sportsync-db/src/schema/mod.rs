pub mod data_schema;
