//! Storefront portal integration
//!
//! The portal has no stable JSON login endpoint, so session acquisition
//! drives the same HTML flow a browser would (see [`handshake`]). Once a
//! session exists, publisher data is fetched either straight from the portal
//! ([`client::PortalGateway`]) or through the intermediary API service
//! ([`service_gateway::ServiceGateway`]), depending on deployment mode.

pub mod client;
pub mod handshake;
pub mod service_gateway;

pub use client::PortalGateway;
pub use handshake::{HandshakeError, SessionAcquirer};
pub use service_gateway::ServiceGateway;
