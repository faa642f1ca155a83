use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::month::Month;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[schema(example = 1)]
    pub employee_number: u64,

    #[schema(example = "Ada")]
    pub first_name: String,

    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[schema(example = "Analyst")]
    pub position: String,

    #[schema(example = "Engineering")]
    pub department_name: String,

    /// Zero when the employee has no salary record for the month
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 650000.0)]
    pub net_salary: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub employee_count: i64,
    pub department_count: i64,
    pub salary_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Every month with at least one salary record, newest first
    #[schema(value_type = Vec<String>, example = json!(["2024-03", "2024-02"]))]
    pub available_months: Vec<Month>,
    pub counts: RecordCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayrollReport {
    pub rows: Vec<ReportRow>,
    pub metadata: ReportMetadata,
}
