pub mod import;
pub mod rate;
pub mod ratings;
pub mod seed;
