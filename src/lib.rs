pub mod config;
pub mod db;
pub mod decision;
pub mod errors;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod store;
