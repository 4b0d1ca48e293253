pub mod config;
pub mod download;
pub mod feed;
pub mod http;
pub mod installer;
pub mod lifecycle;
pub mod manifest;
pub mod platform;
pub mod runtime;
