//! Sidecar API handlers
//!
//! These are the bodies of `POST /api/widget` and `GET /api/stats`, kept free
//! of any HTTP framework so the transport can be swapped without touching
//! registry logic.

use crate::service::SystemService;
use std::sync::Arc;
use thiserror::Error;
use vitals_hud_types::{SidecarRequest, SidecarResponse, StatsResponse};

/// Where the sidecar API listens unless configured otherwise
pub const DEFAULT_API_ADDR: &str = "127.0.0.1:9090";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status a transport should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidJson(_) => 400,
        }
    }
}

/// Decode a push body
pub fn parse_widget_push(body: &[u8]) -> Result<SidecarRequest, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// Register the sidecar and forward its data, if any
///
/// The response echoes the widget's current settings back so the sidecar can
/// adjust what it sends.
pub fn handle_widget_push(
    service: &Arc<SystemService>,
    request: SidecarRequest,
) -> Result<SidecarResponse, ApiError> {
    let module_id = request.module_id.trim();
    if module_id.is_empty() {
        return Err(ApiError::BadRequest("module_id is required".to_string()));
    }

    service.register_sidecar(module_id, request.template, request.schema);

    let props = match request.data {
        Some(data) => service.update_sidecar_data(module_id, data),
        None => None,
    };
    Ok(SidecarResponse::ok(props))
}

/// Current widget snapshot, optionally narrowed to one widget
pub fn handle_stats_pull(service: &SystemService, filter_id: Option<&str>) -> StatsResponse {
    service.get_stats(filter_id)
}
