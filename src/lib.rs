pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod models;
pub mod notice;
pub mod routes;
pub mod services;
pub mod state;
