//! Error categories (the thousands digit of the code)

use super::codes::ErrorCode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Store,
    Order,
    Payment,
    Catalog,
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            3 => Self::Store,
            4 => Self::Order,
            5 => Self::Payment,
            6 => Self::Catalog,
            _ => Self::System,
        }
    }

    /// Failures on our side rather than in the request; logged at error level
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_digit_picks_category() {
        assert_eq!(ErrorCategory::from_code(7), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1008), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(3006), ErrorCategory::Store);
        assert_eq!(ErrorCategory::from_code(4005), ErrorCategory::Order);
        assert_eq!(ErrorCategory::from_code(5009), ErrorCategory::Payment);
        assert_eq!(ErrorCategory::from_code(6304), ErrorCategory::Catalog);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_only_system_errors_are_server_faults() {
        assert!(ErrorCode::InternalError.category().is_server_fault());
        assert!(!ErrorCode::PaymentGatewayError.category().is_server_fault());
        assert!(!ErrorCode::StoreClosed.category().is_server_fault());
    }
}
