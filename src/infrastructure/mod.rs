// CSV source and sink for news, prices and reports
pub mod csv_store;

pub use csv_store::{CsvStore, LoadedRows};
