pub mod app;
pub mod chat;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod text;
pub mod verify;
