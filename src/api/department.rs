use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    api::normalize_code,
    error::{ApiResponse, AppError, AppResult, created, ok, ok_with_message},
    model::department::{Department, DepartmentChanges},
    payroll::net_salary::is_storable_amount,
    store::PayrollStore,
};

const MAX_CODE_LEN: usize = 10;

fn department_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if (1..=MAX_CODE_LEN).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("department_code"))
    }
}

fn budget(value: &Decimal) -> Result<(), ValidationError> {
    if is_storable_amount(*value) {
        Ok(())
    } else {
        Err(ValidationError::new("budget"))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    #[validate(custom(
        function = "department_code",
        message = "Department code must be 1-10 letters or digits"
    ))]
    #[schema(example = "ENG")]
    pub code: String,

    #[validate(
        custom(function = "crate::api::not_blank", message = "Department name is required"),
        length(max = 100, message = "Department name must be at most 100 characters")
    )]
    #[schema(example = "Engineering")]
    pub name: String,

    #[validate(custom(
        function = "budget",
        message = "Gross salary budget must be a non-negative amount with at most 2 decimals"
    ))]
    #[schema(value_type = f64, example = 500000.0)]
    pub gross_salary_budget: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    #[validate(
        custom(function = "crate::api::not_blank", message = "Department name is required"),
        length(max = 100, message = "Department name must be at most 100 characters")
    )]
    #[schema(example = "Engineering")]
    pub name: String,

    #[validate(custom(
        function = "budget",
        message = "Gross salary budget must be a non-negative amount with at most 2 decimals"
    ))]
    #[schema(value_type = f64, example = 650000.0)]
    pub gross_salary_budget: Decimal,
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Every department ordered by code", body = [Department])
    ),
    tag = "Department"
)]
pub async fn list_departments(store: web::Data<dyn PayrollStore>) -> AppResult<HttpResponse> {
    let departments = store.list_departments().await?;
    Ok(ok(departments))
}

/// Get department by code
#[utoipa::path(
    get,
    path = "/api/departments/{code}",
    params(
        ("code", Path, description = "Department code")
    ),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found", body = Object, example = json!({
            "status": "error",
            "message": "Department not found"
        }))
    ),
    tag = "Department"
)]
pub async fn get_department(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let code = normalize_code(&path.into_inner());

    store
        .find_department(&code)
        .await?
        .map(ok)
        .ok_or_else(|| AppError::not_found("Department not found"))
}

/// Create department
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created successfully", body = Department),
        (status = 400, description = "Validation failed or code already exists", body = Object, example = json!({
            "status": "error",
            "message": "Department code 'ENG' already exists"
        }))
    ),
    tag = "Department"
)]
pub async fn create_department(
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<CreateDepartment>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    let payload = payload.into_inner();

    let department = store
        .create_department(Department {
            code: normalize_code(&payload.code),
            name: payload.name.trim().to_string(),
            gross_salary_budget: payload.gross_salary_budget,
        })
        .await?;

    info!(code = %department.code, "Department created");
    Ok(created(department, "Department created successfully"))
}

/// Update department
#[utoipa::path(
    put,
    path = "/api/departments/{code}",
    params(
        ("code", Path, description = "Department code")
    ),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated successfully", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Department"
)]
pub async fn update_department(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
    payload: web::Json<UpdateDepartment>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    let code = normalize_code(&path.into_inner());
    let payload = payload.into_inner();

    let changes = DepartmentChanges {
        name: payload.name.trim().to_string(),
        gross_salary_budget: payload.gross_salary_budget,
    };

    match store.update_department(&code, changes).await? {
        Some(department) => Ok(ok_with_message(
            department,
            "Department updated successfully",
        )),
        None => Err(AppError::not_found("Department not found")),
    }
}

/// Delete department
#[utoipa::path(
    delete,
    path = "/api/departments/{code}",
    params(
        ("code", Path, description = "Department code")
    ),
    responses(
        (status = 200, description = "Department deleted successfully"),
        (status = 400, description = "Department still has employees", body = Object, example = json!({
            "status": "error",
            "message": "Cannot delete department 'ENG' with 1 existing employee(s)"
        })),
        (status = 404, description = "Department not found")
    ),
    tag = "Department"
)]
pub async fn delete_department(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let code = normalize_code(&path.into_inner());

    if !store.delete_department(&code).await? {
        return Err(AppError::not_found("Department not found"));
    }

    info!(code = %code, "Department deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message_only(
        "Department deleted successfully",
    )))
}
