pub mod cache;
pub mod config;
pub mod error;
pub mod instrument;
pub mod normalize;
pub mod portfolio;
pub mod position;
pub mod server;
pub mod upstream;
