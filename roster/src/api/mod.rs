//! Roster backend access
//!
//! The batch core only sees [`RemoteOperation`](crate::batch::RemoteOperation);
//! this module supplies the HTTP implementation behind it and the plain
//! list/get/add calls the CLI needs.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod operation;
mod rest;

pub use client::RosterApi;
pub use error::ApiError;
pub use operation::ApiOperation;
pub use rest::RestApi;

use crate::config::ApiConfig;

/// Create the backend client described by the config
pub fn create_client(config: &ApiConfig) -> Result<Arc<dyn RosterApi>, ApiError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(RestApi::from_config(config)?))
}
