use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope returned by every JSON API route.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_data() {
        let res = ApiResponse::success(42);
        assert!(res.success);
        assert_eq!(res.data, Some(42));
        assert!(res.message.is_none());
    }

    #[test]
    fn error_carries_message() {
        let res: ApiResponse<()> = ApiResponse::error("nope");
        assert!(!res.success);
        assert!(res.data.is_none());
        assert_eq!(res.message.as_deref(), Some("nope"));
    }
}
