use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::department::{CreateDepartment, UpdateDepartment};
use crate::api::employee::EmployeePayload;
use crate::api::report::PayrollReportResponse;
use crate::api::salary::SalaryPayload;
use crate::auth::credentials::Principal;
use crate::auth::handlers::{LoginRequest, LoginResponse};
use crate::auth::jwt::Claims;
use crate::error::{FieldError, Status};
use crate::model::department::Department;
use crate::model::employee::{Employee, EmployeeDetails, Gender};
use crate::model::report::{RecordCounts, ReportMetadata, ReportRow};
use crate::model::salary::{Salary, SalaryDetails};
use crate::payroll::view::ReportSummary;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Service API",
        version = "1.0.0",
        description = r#"
## Employee Payroll Management

Departments, employees, monthly salary records and the payroll report built from them.

### Consistency rules
- An employee must belong to an existing department
- A salary record must belong to an existing employee, one per employee and month
- Net salary is always `grossSalary - totalDeduction`, computed by the server
- Departments with employees, and employees with salary records, cannot be deleted

### Security
`POST /auth/login` returns a **JWT bearer token**. The payroll report and `/auth/me` require it.

### Response Format
Every response is an envelope: `{ "status": "success" | "error", "message", "data", "errors" }`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::salary::list_salaries,
        crate::api::salary::list_employee_salaries,
        crate::api::salary::get_salary,
        crate::api::salary::create_salary,
        crate::api::salary::update_salary,
        crate::api::salary::delete_salary,

        crate::api::report::payroll_report,
        crate::api::report::payroll_report_without_department
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            Principal,
            Claims,
            Status,
            FieldError,
            Department,
            CreateDepartment,
            UpdateDepartment,
            Gender,
            Employee,
            EmployeeDetails,
            EmployeePayload,
            Salary,
            SalaryDetails,
            SalaryPayload,
            ReportRow,
            RecordCounts,
            ReportMetadata,
            ReportSummary,
            PayrollReportResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and token inspection"),
        (name = "Department", description = "Department management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Salary", description = "Monthly salary record APIs"),
        (name = "Report", description = "Payroll report APIs"),
    )
)]
pub struct ApiDoc;
