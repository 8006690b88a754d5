pub mod app;
pub mod config;
pub mod directory;
pub mod dishes;
pub mod error;
pub mod filters;
pub mod lifecycle;
pub mod orders;
pub mod reviews;
pub mod state;
pub mod statistics;
