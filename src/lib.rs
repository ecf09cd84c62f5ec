pub mod config;
pub mod download;
pub mod fetch;
pub mod index;
pub mod pipeline;
