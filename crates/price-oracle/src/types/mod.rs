pub mod config;
pub mod observation;
