use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "code": "ENG",
    "name": "Engineering",
    "grossSalaryBudget": 500000.0
}))]
pub struct Department {
    #[schema(example = "ENG")]
    pub code: String,

    #[schema(example = "Engineering")]
    pub name: String,

    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 500000.0)]
    pub gross_salary_budget: Decimal,
}

/// Mutable part of a department; the code is its identity and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentChanges {
    pub name: String,
    pub gross_salary_budget: Decimal,
}
