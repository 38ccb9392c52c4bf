use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::usecases::{
    billing::BillingError, content::ContentError, content_analysis::AnalysisError,
    stripe_webhook::StripeWebhookError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });

    (status, body).into_response()
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl IntoResponse for StripeWebhookError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.client_message())
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            BillingError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            BillingError::Upstream(_) => "Payment provider request failed".to_string(),
            other => other.to_string(),
        };
        error_response(status, message)
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ContentError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        };
        error_response(status, message)
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AnalysisError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            // Provider errors can echo prompts or keys.
            AnalysisError::AnalysisFailed(_) => "Failed to analyze content".to_string(),
            other => other.to_string(),
        };
        error_response(status, message)
    }
}
