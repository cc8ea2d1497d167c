pub mod actions;
pub mod auth;
pub mod cli;
pub mod config;
pub mod consts;
pub mod metadata;
pub mod platform_client;
pub mod request;
pub mod ttl;
pub mod util;
