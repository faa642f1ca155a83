use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::month::Month;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_number: u64,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 800000.0)]
    pub gross_salary: Decimal,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 150000.0)]
    pub total_deduction: Decimal,

    /// Always `gross_salary - total_deduction`, derived on write
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 650000.0)]
    pub net_salary: Decimal,

    #[schema(value_type = String, example = "2024-03")]
    pub month: Month,
}

/// Salary joined with the identity of its employee and department.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub salary: Salary,

    #[schema(example = "Ada")]
    pub first_name: String,

    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[schema(example = "Analyst")]
    pub position: String,

    #[schema(example = "Engineering")]
    pub department_name: String,
}

/// Client-controlled salary fields; the net amount is never taken from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSalary {
    pub employee_number: u64,
    pub gross_salary: Decimal,
    pub total_deduction: Decimal,
    pub month: Month,
}
