pub mod config;
pub mod entry;
pub mod extension;
pub mod locale;
pub mod resource;
