pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod json_view;
pub mod logging;
pub mod models;
pub mod params;
pub mod platform;
pub mod store;
pub mod surface;
pub mod web;

pub use error::{Error, Result};
