pub mod categories;
pub mod cli;
pub mod config;
pub mod import;
pub mod rating;
pub mod store;

pub use config::Config;
pub use store::Store;
