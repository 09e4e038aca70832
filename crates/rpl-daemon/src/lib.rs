//! rpl-daemon library surface.
//!
//! Exposes the router and state modules so scenario tests can compose the
//! application in-process without binding a socket.

pub mod api_types;
pub mod routes;
pub mod state;
