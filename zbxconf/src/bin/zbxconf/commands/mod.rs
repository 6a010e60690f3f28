pub mod config;
pub mod render;
pub mod rules;
pub mod schema;
pub mod send;
