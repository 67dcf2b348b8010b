use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Main error type for the tabledef system
#[derive(Error, Debug)]
pub enum TabledefError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Reference error: {message}")]
    Reference { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TabledefResult<T> = Result<T, TabledefError>;

impl TabledefError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference { message: message.into() }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema { message: message.into() }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server { message: message.into() }
    }

    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Reference { .. } | Self::Schema { .. } | Self::Serialization(_)
        )
    }
}

impl actix_web::ResponseError for TabledefError {
    fn status_code(&self) -> StatusCode {
        if self.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
