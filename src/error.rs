use actix_web::{
    HttpRequest, HttpResponse, ResponseError,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
};
use heck::ToLowerCamelCase;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

static EXPOSE_INTERNAL_DETAILS: OnceCell<bool> = OnceCell::new();

/// Decides once, at startup, whether 500 responses carry the underlying error text.
pub fn expose_internal_details(enabled: bool) {
    let _ = EXPOSE_INTERNAL_DETAILS.set(enabled);
}

fn internal_details_exposed() -> bool {
    EXPOSE_INTERNAL_DETAILS.get().copied().unwrap_or(false)
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "firstName")]
    pub field: String,
    #[schema(example = "First name is required")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Underlying fault, only populated in development mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data),
            errors: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            data: None,
            errors: None,
            error: None,
        }
    }
}

/// 200 with `data`
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data))
}

/// 200 with `data` and `message`
pub fn ok_with_message<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data).with_message(message))
}

/// 201 with `data` and `message`
pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::success(data).with_message(message))
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),

    #[error("Dependent records exist: {0}")]
    DependentRecordsExist(String),

    #[error("Missing required filter: {0}")]
    MissingRequiredFilter(String),

    #[error("Invalid month format: {0}")]
    InvalidMonthFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    fn client_message(&self) -> &str {
        match self {
            AppError::Validation(_) => "Validation failed",
            AppError::InvalidReference(msg)
            | AppError::DuplicateRecord(msg)
            | AppError::DependentRecordsExist(msg)
            | AppError::MissingRequiredFilter(msg)
            | AppError::InvalidMonthFormat(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg) => msg,
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong!",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidReference(_)
            | AppError::DuplicateRecord(_)
            | AppError::DependentRecordsExist(_)
            | AppError::MissingRequiredFilter(_)
            | AppError::InvalidMonthFormat(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                internal_details_exposed().then(|| msg.clone())
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                internal_details_exposed().then(|| msg.clone())
            }
            _ => None,
        };

        let errors = match self {
            AppError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ApiResponse::<()> {
            status: Status::Error,
            message: Some(self.client_message().to_string()),
            data: None,
            errors,
            error: detail,
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                // `hired_date` -> `hiredDate`, matching the wire names of request fields
                let field = field.to_lower_camel_case();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation("body", err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation("path", err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation("query", err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidReference("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateRecord("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DependentRecordsExist("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_validation_envelope() {
        let resp = AppError::validation("firstName", "First name is required").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "firstName");
        assert_eq!(body["errors"][0]["message"], "First name is required");
    }

    #[test]
    fn test_camel_case_field_names() {
        assert_eq!("hired_date".to_lower_camel_case(), "hiredDate");
        assert_eq!("gross_salary_budget".to_lower_camel_case(), "grossSalaryBudget");
        assert_eq!("position".to_lower_camel_case(), "position");
        assert_eq!("firstName".to_lower_camel_case(), "firstName");
    }

    #[actix_web::test]
    async fn test_internal_detail_hidden_by_default() {
        let resp = AppError::Database("connection reset".into()).error_response();
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Something went wrong!");
        assert!(body.get("error").is_none());
    }
}
