//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::StoreNotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::SizeNotFound
            | Self::CategoryNotFound
            | Self::AdditionalNotFound
            | Self::AdditionalCategoryNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::StoreSlugTaken
            | Self::StoreEmailTaken
            | Self::CategoryHasProducts
            | Self::AdditionalCategoryInUse
            | Self::OrderAlreadyFinal
            | Self::InvalidStatusTransition
            | Self::ReconcileInProgress => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled
            | Self::WebhookSignatureInvalid => StatusCode::UNAUTHORIZED,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 422 Business rules the client can fix
            Self::StoreClosed
            | Self::MinimumOrderNotMet
            | Self::ProductUnavailable
            | Self::AdditionalNotAllowed
            | Self::AdditionalLimitExceeded
            | Self::AdditionalSelectionAboveMax
            | Self::AdditionalSelectionBelowMin
            | Self::FulfillmentNotAccepted => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Upstream failure
            Self::PaymentGatewayError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::PaymentGatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::StoreNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::AdditionalNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::StoreSlugTaken.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::CategoryHasProducts.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ReconcileInProgress.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::WebhookSignatureInvalid.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_business_rule_status() {
        assert_eq!(
            ErrorCode::StoreClosed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::AdditionalLimitExceeded.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_upstream_status() {
        assert_eq!(
            ErrorCode::PaymentGatewayError.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::PaymentGatewayUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::CartEmpty.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::DeliveryAddressRequired.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::InvalidSlug.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_status() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
