//! Database access shared by Palukulu services

pub mod init;
pub mod json_list;
pub mod models;

pub use init::{create_tables, init_database_pool};
pub use json_list::JsonList;
