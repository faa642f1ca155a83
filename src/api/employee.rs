use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    api::{normalize_code, optional_text},
    error::{ApiResponse, AppError, AppResult, created, ok, ok_with_message},
    model::employee::{Employee, EmployeeDetails, Gender, NewEmployee},
    store::PayrollStore,
};

/// Body of both create and update; an update replaces every field.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(
        custom(function = "crate::api::not_blank", message = "First name is required"),
        length(max = 50, message = "First name must be at most 50 characters")
    )]
    #[schema(example = "Ada")]
    pub first_name: String,

    #[validate(
        custom(function = "crate::api::not_blank", message = "Last name is required"),
        length(max = 50, message = "Last name must be at most 50 characters")
    )]
    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[validate(
        custom(function = "crate::api::not_blank", message = "Position is required"),
        length(max = 100, message = "Position must be at most 100 characters")
    )]
    #[schema(example = "Analyst")]
    pub position: String,

    #[validate(length(max = 255, message = "Address must be at most 255 characters"))]
    #[schema(example = "12 St James's Square, London")]
    pub address: Option<String>,

    #[validate(length(max = 30, message = "Telephone must be at most 30 characters"))]
    #[schema(example = "+44 20 7946 0000")]
    pub telephone: Option<String>,

    pub gender: Gender,

    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub hired_date: NaiveDate,

    #[validate(custom(function = "crate::api::not_blank", message = "Department code is required"))]
    #[schema(example = "ENG")]
    pub department_code: String,
}

impl From<EmployeePayload> for NewEmployee {
    fn from(p: EmployeePayload) -> Self {
        NewEmployee {
            first_name: p.first_name.trim().to_string(),
            last_name: p.last_name.trim().to_string(),
            position: p.position.trim().to_string(),
            address: optional_text(p.address.as_deref()),
            telephone: optional_text(p.telephone.as_deref()),
            gender: p.gender,
            hired_date: p.hired_date,
            department_code: normalize_code(&p.department_code),
        }
    }
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Every employee with its department name, ordered by number", body = [EmployeeDetails])
    ),
    tag = "Employee"
)]
pub async fn list_employees(store: web::Data<dyn PayrollStore>) -> AppResult<HttpResponse> {
    Ok(ok(store.list_employees().await?))
}

/// Get employee by number
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee number")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeDetails),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "status": "error",
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    store
        .find_employee(path.into_inner())
        .await?
        .map(ok)
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

/// Create employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 400, description = "Validation failed or unknown department", body = Object, example = json!({
            "status": "error",
            "message": "Invalid department code 'OPS'"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<EmployeePayload>,
) -> AppResult<HttpResponse> {
    payload.validate()?;

    let employee = store.create_employee(payload.into_inner().into()).await?;

    info!(
        number = employee.number,
        department = %employee.department_code,
        "Employee created"
    );
    Ok(created(employee, "Employee created successfully"))
}

/// Update employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee number")
    ),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated successfully", body = Employee),
        (status = 400, description = "Validation failed or unknown department"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
    payload: web::Json<EmployeePayload>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    let number = path.into_inner();

    store
        .update_employee(number, payload.into_inner().into())
        .await?
        .map(|employee| ok_with_message(employee, "Employee updated successfully"))
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

/// Delete employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee number")
    ),
    responses(
        (status = 200, description = "Employee deleted successfully"),
        (status = 400, description = "Employee still has salary records", body = Object, example = json!({
            "status": "error",
            "message": "Cannot delete employee 1 with 1 existing salary record(s)"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let number = path.into_inner();

    if !store.delete_employee(number).await? {
        return Err(AppError::not_found("Employee not found"));
    }

    info!(number, "Employee deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message_only(
        "Employee deleted successfully",
    )))
}
