pub mod client;
pub mod common;
pub mod generator;
pub mod handler;
pub mod server;
pub mod traits;

pub use client::client::{ClientError, DelayClient};
pub use common::range::DelayRange;
pub use server::server::{server_start, DelayServer, ServerState};
