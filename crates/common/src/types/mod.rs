use serde::Serialize;

/// Payload of the `/api/v1/status` liveness endpoint.
#[derive(Serialize, Debug)]
pub struct ApiStatus {
    pub status: &'static str,
}
