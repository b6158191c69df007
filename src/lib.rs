pub mod config;
pub mod infrastructure;
pub mod presentation;
pub mod workers;
