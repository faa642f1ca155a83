use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    api::normalize_code,
    auth::auth::AuthUser,
    error::{AppError, AppResult, Status},
    model::report::{ReportMetadata, ReportRow},
    payroll::{
        report::{ReportFilter, assemble},
        view::{self, ReportSummary},
    },
    store::PayrollStore,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub employee_number: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollReportResponse {
    pub status: Status,
    pub data: Vec<ReportRow>,
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
}

/// Payroll report
#[utoipa::path(
    get,
    path = "/api/reports/payroll/{month}/{department_code}",
    params(
        ("month", Path, description = "Report month, YYYY-MM"),
        ("department_code", Path, description = "Department code"),
        ("employeeNumber", Query, description = "Narrow the report to one employee"),
        ("search", Query, description = "Case-insensitive match on name, position or department")
    ),
    responses(
        (status = 200, description = "One row per employee of the department, ordered by last then first name", body = PayrollReportResponse),
        (status = 400, description = "Invalid month or missing department", body = Object, example = json!({
            "status": "error",
            "message": "Invalid month format '2024-13'. Use YYYY-MM"
        })),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn payroll_report(
    user: AuthUser,
    store: web::Data<dyn PayrollStore>,
    path: web::Path<(String, String)>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let (month, department_code) = path.into_inner();
    let filter = ReportFilter::parse(
        &month,
        Some(&normalize_code(&department_code)),
        query.employee_number.as_deref(),
    )?;

    debug!(
        user = %user.username,
        role = %user.role,
        month = %filter.month,
        department = %filter.department_code,
        employee = ?filter.employee_number,
        "Assembling payroll report"
    );

    let source = store.report_source(&filter).await?;
    let report = assemble(&filter, source);

    let rows = view::search(&report.rows, query.search.as_deref().unwrap_or_default());
    let summary = view::summarize(&rows);
    let data = rows.into_iter().cloned().collect();

    Ok(HttpResponse::Ok().json(PayrollReportResponse {
        status: Status::Success,
        data,
        metadata: report.metadata,
        summary,
    }))
}

/// Payroll report without a department
///
/// Always fails: a department code is required.
#[utoipa::path(
    get,
    path = "/api/reports/payroll/{month}",
    params(
        ("month", Path, description = "Report month, YYYY-MM")
    ),
    responses(
        (status = 400, description = "Department code is required", body = Object, example = json!({
            "status": "error",
            "message": "Department code is required"
        }))
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn payroll_report_without_department(
    _user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    // month errors take precedence over the missing department
    let err = match ReportFilter::parse(&path.into_inner(), None, None) {
        Err(e) => e,
        Ok(_) => AppError::MissingRequiredFilter("Department code is required".to_string()),
    };
    Err(err)
}
