// src/lib.rs

pub mod api;
pub mod coder;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use coder::{Coder, SharedCoder, shared};
pub use handlers::{ChatHandler, DiffHandler, FilesHandler, UndoHandler};
pub use server::{ApiServer, create_api_server, create_router};
