pub mod config;
pub mod datasource;
pub mod defaultlogger;
pub mod elements;
pub mod geometry;
pub mod logging;
pub mod osmxml;
pub mod streaming;
pub mod utils;
