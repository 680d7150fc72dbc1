//! Keep-alive HTTP server.
//!
//! Hosting platforms that put idle processes to sleep poll `/` or `/status`;
//! answering keeps the bot process running.

pub use server::{router, run, run_with_listener, spawn_with_listener};

mod server;
