//! Request/reply bridge between the controller and the cart backend.
//!
//! Every outbound [`protocol::Request`] is assigned a fresh id, and exactly
//! one [`wire::Reply`] carrying that id is delivered back to the caller.
//! Inbound requests from the host are parsed into
//! [`protocol::HostCommand`]s and answered synchronously by a single
//! [`HostHandler`].
mod backend;
mod bridge;
mod busy;
mod error;
mod handler;
mod pending;

pub use backend::{Backend, decode_reply};
pub use bridge::{Bridge, BridgeOptions, DEFAULT_REQUEST_TIMEOUT};
pub use busy::BusyWatch;
pub use error::BridgeError;
pub use handler::HostHandler;

pub use tokio_util::sync::CancellationToken;
pub use wire::Reply;
