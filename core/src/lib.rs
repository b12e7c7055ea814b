pub mod db;
pub mod entries;
pub mod entry_csv;
pub mod models;
pub mod placeholders;
pub mod store;
pub mod table;
