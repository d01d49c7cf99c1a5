pub mod api;
pub mod clients;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod models;
pub mod usage;
pub mod workspace;
