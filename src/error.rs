use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::AddrParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Address parse error: {0}")]
    AddrParseError(#[from] AddrParseError),

    #[error("Web server error: {0}")]
    WebServerError(String),
}

impl AppError {
    /// 获取错误类型的简洁摘要，用于诊断日志中的错误分类
    ///
    /// 返回稳定的类别字符串，不包含具体的错误内容
    pub fn error_type_summary(&self) -> &'static str {
        match self {
            // 采集入口相关
            AppError::MalformedPayload(_) => "ingest_payload_malformed",
            AppError::UnsupportedMethod(_) => "ingest_method_rejected",
            AppError::TransportFailure(_) => "viewer_transport_failed",
            AppError::TranslationFailed(_) => "ingest_translation_failed",

            // 启动与配置相关
            AppError::IoError(_) => "collector_io_failed",
            AppError::TomlError(_) => "collector_config_unparsable",
            AppError::ConfigError(_) => "collector_config_invalid",
            AppError::AddrParseError(_) => "collector_address_invalid",
            AppError::WebServerError(_) => "collector_listener_failed",
        }
    }

    /// 映射到采集端点返回给提交方的HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::MalformedPayload(_) => "Invalid JSON",
            AppError::UnsupportedMethod(_) => "Method not allowed",
            _ => "Failed to translate log",
        };
        (self.status_code(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (AppError::MalformedPayload("x".into()), StatusCode::BAD_REQUEST),
            (AppError::UnsupportedMethod("GET".into()), StatusCode::METHOD_NOT_ALLOWED),
            (AppError::TranslationFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected);
        }
    }

    #[test]
    fn test_error_type_summary_is_stable() {
        let err = AppError::ConfigError("max_logs_per_service 必须大于0".into());
        assert_eq!(err.error_type_summary(), "collector_config_invalid");
        assert!(err.to_string().contains("max_logs_per_service"));
    }
}
