//! HTTP API surface of the PPDA backend.
pub mod error;
pub mod institutions;
pub mod ppdas;
pub mod system;
pub mod types;
pub mod users;
