pub mod application;
pub mod commands;
pub mod download;
pub mod error;
pub mod http;
pub mod inventory;
pub mod layout;
pub mod ops;
pub mod registry;
pub mod runtime;
pub mod settings;
