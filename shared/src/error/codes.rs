//! Unified error codes for the storefront platform
//!
//! This module defines all error codes shared by the server and the web front end.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Store (tenant) errors
//! - 4xxx: Order and cart errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Too many requests from the same client
    TooManyRequests = 1008,
    /// Password too short
    PasswordTooShort = 1009,


    // ==================== 3xxx: Store ====================
    /// Store not found
    StoreNotFound = 3001,
    /// Store slug is already taken
    StoreSlugTaken = 3002,
    /// Admin email is already registered
    StoreEmailTaken = 3003,
    /// Store is closed right now
    StoreClosed = 3004,
    /// Slug has invalid characters or length
    InvalidSlug = 3005,
    /// Store does not offer the requested fulfillment
    FulfillmentNotAccepted = 3006,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Cart has no items
    CartEmpty = 4002,
    /// Item quantity is out of range
    InvalidQuantity = 4003,
    /// Subtotal is below the store minimum
    MinimumOrderNotMet = 4004,
    /// Delivery orders need an address
    DeliveryAddressRequired = 4005,
    /// Requested status change is not allowed
    InvalidStatusTransition = 4006,
    /// Order is already in a final state
    OrderAlreadyFinal = 4007,

    // ==================== 5xxx: Payment ====================
    /// Online payments are not configured
    PaymentGatewayUnavailable = 5006,
    /// Payment gateway returned an error
    PaymentGatewayError = 5007,
    /// Webhook signature did not verify
    WebhookSignatureInvalid = 5008,
    /// A reconciliation pass is already running
    ReconcileInProgress = 5009,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product price is invalid
    ProductInvalidPrice = 6002,
    /// Product is not available
    ProductUnavailable = 6003,
    /// Product size not found
    SizeNotFound = 6004,
    /// Product references an invalid category
    ProductCategoryInvalid = 6005,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category still has products
    CategoryHasProducts = 6102,
    /// Additional not found
    AdditionalNotFound = 6201,
    /// Additional cannot be attached to this product
    AdditionalNotAllowed = 6202,
    /// Too many additionals for the chosen size
    AdditionalLimitExceeded = 6203,
    /// Additional group not found
    AdditionalCategoryNotFound = 6301,
    /// Additional group still has additionals
    AdditionalCategoryInUse = 6302,
    /// Too many selections in one additional group
    AdditionalSelectionAboveMax = 6303,
    /// Too few selections in one additional group
    AdditionalSelectionBelowMin = 6304,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::TooManyRequests => "Too many requests, try again later",
            ErrorCode::PasswordTooShort => "Password is too short",


            // Store
            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::StoreSlugTaken => "Store address is already taken",
            ErrorCode::StoreEmailTaken => "Email is already registered",
            ErrorCode::StoreClosed => "Store is closed",
            ErrorCode::InvalidSlug => "Store address is invalid",
            ErrorCode::FulfillmentNotAccepted => "Fulfillment type is not offered by this store",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::InvalidQuantity => "Item quantity is invalid",
            ErrorCode::MinimumOrderNotMet => "Order is below the minimum value",
            ErrorCode::DeliveryAddressRequired => "Delivery address is required",
            ErrorCode::InvalidStatusTransition => "Order status change is not allowed",
            ErrorCode::OrderAlreadyFinal => "Order is already finished",

            // Payment
            ErrorCode::PaymentGatewayUnavailable => "Online payments are not available",
            ErrorCode::PaymentGatewayError => "Payment provider returned an error",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature is invalid",
            ErrorCode::ReconcileInProgress => "Payment check already in progress",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product price is invalid",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::SizeNotFound => "Product size not found",
            ErrorCode::ProductCategoryInvalid => "Product category is invalid",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category still has products",
            ErrorCode::AdditionalNotFound => "Additional not found",
            ErrorCode::AdditionalNotAllowed => "Additional is not allowed for this product",
            ErrorCode::AdditionalLimitExceeded => "Too many additionals for this size",
            ErrorCode::AdditionalCategoryNotFound => "Additional group not found",
            ErrorCode::AdditionalCategoryInUse => "Additional group still has additionals",
            ErrorCode::AdditionalSelectionAboveMax => "Too many choices in additional group",
            ErrorCode::AdditionalSelectionBelowMin => "Too few choices in additional group",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::TooManyRequests),
            1009 => Ok(ErrorCode::PasswordTooShort),


            // Store
            3001 => Ok(ErrorCode::StoreNotFound),
            3002 => Ok(ErrorCode::StoreSlugTaken),
            3003 => Ok(ErrorCode::StoreEmailTaken),
            3004 => Ok(ErrorCode::StoreClosed),
            3005 => Ok(ErrorCode::InvalidSlug),
            3006 => Ok(ErrorCode::FulfillmentNotAccepted),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::CartEmpty),
            4003 => Ok(ErrorCode::InvalidQuantity),
            4004 => Ok(ErrorCode::MinimumOrderNotMet),
            4005 => Ok(ErrorCode::DeliveryAddressRequired),
            4006 => Ok(ErrorCode::InvalidStatusTransition),
            4007 => Ok(ErrorCode::OrderAlreadyFinal),

            // Payment
            5006 => Ok(ErrorCode::PaymentGatewayUnavailable),
            5007 => Ok(ErrorCode::PaymentGatewayError),
            5008 => Ok(ErrorCode::WebhookSignatureInvalid),
            5009 => Ok(ErrorCode::ReconcileInProgress),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductUnavailable),
            6004 => Ok(ErrorCode::SizeNotFound),
            6005 => Ok(ErrorCode::ProductCategoryInvalid),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6201 => Ok(ErrorCode::AdditionalNotFound),
            6202 => Ok(ErrorCode::AdditionalNotAllowed),
            6203 => Ok(ErrorCode::AdditionalLimitExceeded),
            6301 => Ok(ErrorCode::AdditionalCategoryNotFound),
            6302 => Ok(ErrorCode::AdditionalCategoryInUse),
            6303 => Ok(ErrorCode::AdditionalSelectionAboveMax),
            6304 => Ok(ErrorCode::AdditionalSelectionBelowMin),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
