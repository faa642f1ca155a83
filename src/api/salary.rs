use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{ApiResponse, AppError, AppResult, created, ok, ok_with_message},
    model::{
        month::Month,
        salary::{NewSalary, Salary, SalaryDetails},
    },
    store::PayrollStore,
};

/// Salary write body. A `netSalary` sent by a client is ignored; the store
/// derives it from the two amounts.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayload {
    #[schema(example = 1)]
    pub employee_number: u64,

    #[schema(value_type = f64, example = 800000.0)]
    pub gross_salary: Decimal,

    #[schema(value_type = f64, example = 150000.0)]
    pub total_deduction: Decimal,

    #[schema(example = "2024-03")]
    pub month: String,
}

impl TryFrom<SalaryPayload> for NewSalary {
    type Error = AppError;

    fn try_from(p: SalaryPayload) -> Result<Self, Self::Error> {
        Ok(NewSalary {
            employee_number: p.employee_number,
            gross_salary: p.gross_salary,
            total_deduction: p.total_deduction,
            month: Month::parse(p.month.trim())?,
        })
    }
}

/// List salaries
#[utoipa::path(
    get,
    path = "/api/salaries",
    responses(
        (status = 200, description = "Every salary record, newest month first, then by employee name", body = [SalaryDetails])
    ),
    tag = "Salary"
)]
pub async fn list_salaries(store: web::Data<dyn PayrollStore>) -> AppResult<HttpResponse> {
    Ok(ok(store.list_salaries().await?))
}

/// List salaries of one employee
#[utoipa::path(
    get,
    path = "/api/salaries/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee number")
    ),
    responses(
        (status = 200, description = "Salary records of the employee, newest month first", body = [SalaryDetails])
    ),
    tag = "Salary"
)]
pub async fn list_employee_salaries(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    Ok(ok(store
        .list_salaries_for_employee(path.into_inner())
        .await?))
}

/// Get salary by id
#[utoipa::path(
    get,
    path = "/api/salaries/{id}",
    params(
        ("id", Path, description = "Salary record id")
    ),
    responses(
        (status = 200, description = "Salary record found", body = SalaryDetails),
        (status = 404, description = "Salary record not found", body = Object, example = json!({
            "status": "error",
            "message": "Salary record not found"
        }))
    ),
    tag = "Salary"
)]
pub async fn get_salary(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    store
        .find_salary(path.into_inner())
        .await?
        .map(ok)
        .ok_or_else(|| AppError::not_found("Salary record not found"))
}

/// Create salary record
#[utoipa::path(
    post,
    path = "/api/salaries",
    request_body = SalaryPayload,
    responses(
        (status = 201, description = "Salary record created successfully", body = Salary),
        (status = 400, description = "Invalid amounts, unknown employee or duplicate month", body = Object, example = json!({
            "status": "error",
            "message": "Salary record already exists for employee 1 and month 2024-03"
        })),
        (status = 409, description = "A concurrent request stored the same employee and month first")
    ),
    tag = "Salary"
)]
pub async fn create_salary(
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<SalaryPayload>,
) -> AppResult<HttpResponse> {
    let salary = store
        .create_salary(NewSalary::try_from(payload.into_inner())?)
        .await?;

    info!(
        id = salary.id,
        employee = salary.employee_number,
        month = %salary.month,
        "Salary record created"
    );
    Ok(created(salary, "Salary record created successfully"))
}

/// Update salary record
#[utoipa::path(
    put,
    path = "/api/salaries/{id}",
    params(
        ("id", Path, description = "Salary record id")
    ),
    request_body = SalaryPayload,
    responses(
        (status = 200, description = "Salary record updated successfully", body = Salary),
        (status = 400, description = "Invalid amounts, unknown employee or duplicate month"),
        (status = 404, description = "Salary record not found")
    ),
    tag = "Salary"
)]
pub async fn update_salary(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
    payload: web::Json<SalaryPayload>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let salary = NewSalary::try_from(payload.into_inner())?;

    store
        .update_salary(id, salary)
        .await?
        .map(|salary| ok_with_message(salary, "Salary record updated successfully"))
        .ok_or_else(|| AppError::not_found("Salary record not found"))
}

/// Delete salary record
#[utoipa::path(
    delete,
    path = "/api/salaries/{id}",
    params(
        ("id", Path, description = "Salary record id")
    ),
    responses(
        (status = 200, description = "Salary record deleted successfully"),
        (status = 404, description = "Salary record not found")
    ),
    tag = "Salary"
)]
pub async fn delete_salary(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !store.delete_salary(id).await? {
        return Err(AppError::not_found("Salary record not found"));
    }

    info!(id, "Salary record deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message_only(
        "Salary record deleted successfully",
    )))
}
