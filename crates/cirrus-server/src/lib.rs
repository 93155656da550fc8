//! HTTP layer for the Cirrus cluster lifecycle service.
//!
//! Thin adapter only: handlers extract parameters, delegate to the
//! [`cirrus_service::ClustersService`] façade, and map the error taxonomy
//! to status codes. No business logic lives here.

pub mod error;
pub mod router;
