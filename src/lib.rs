pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod repository;
pub mod state;
