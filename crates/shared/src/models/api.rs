use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// Envelope returned by every listener endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> From<ApiResponse<T>> for HttpResponse {
    fn from(response: ApiResponse<T>) -> Self {
        HttpResponse::Ok().json(response)
    }
}
