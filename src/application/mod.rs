pub mod blueprint;
pub mod bootstrapper;
pub mod config;
pub mod database;
pub mod docs;
pub mod error;
pub mod extensions;
pub mod state;
