pub mod aggregate;
pub mod carry_over;
pub mod config;
pub mod demo;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod matrix;
pub mod mttr;
pub mod normalize;
pub mod report;
pub mod sla;
pub mod trend;
pub mod validate;
pub mod window;

#[cfg(test)]
mod tests {
    use super::error::{codes, AppError};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new(codes::CONFIG_INVALID, "bad config")
            .with_details("value=0")
            .with_retryable(false);
        assert_eq!(err.code, "CONFIG_INVALID");
        assert_eq!(err.message, "bad config");
        assert_eq!(err.retryable, false);
        assert_eq!(err.to_string(), "[CONFIG_INVALID] bad config (value=0)");
    }
}
