//! Search and totals over already assembled report rows.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::report::ReportRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub row_count: usize,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, example = 650000.0)]
    pub total_net_salary: Decimal,
}

fn matches(row: &ReportRow, needle: &str) -> bool {
    [
        &row.first_name,
        &row.last_name,
        &row.position,
        &row.department_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Case-insensitive substring search over name, position and department.
/// A blank query keeps every row; order is preserved.
pub fn search<'a>(rows: &'a [ReportRow], query: &str) -> Vec<&'a ReportRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter().filter(|row| matches(row, &needle)).collect()
}

pub fn total_net_salary<'a, I>(rows: I) -> Decimal
where
    I: IntoIterator<Item = &'a ReportRow>,
{
    rows.into_iter().map(|r| r.net_salary).sum()
}

pub fn summarize(rows: &[&ReportRow]) -> ReportSummary {
    ReportSummary {
        row_count: rows.len(),
        total_net_salary: total_net_salary(rows.iter().copied()),
    }
}
