use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::AppError;
use crate::model::{
    department::Department,
    employee::Employee,
    month::Month,
    report::{PayrollReport, RecordCounts, ReportMetadata, ReportRow},
    salary::Salary,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub month: Month,
    pub department_code: String,
    pub employee_number: Option<u64>,
}

impl ReportFilter {
    /// Month is checked first, then the department, then the optional employee.
    /// A blank employee number means "every employee".
    pub fn parse(
        month: &str,
        department_code: Option<&str>,
        employee_number: Option<&str>,
    ) -> Result<Self, AppError> {
        let month = Month::parse(month)?;

        let department_code = department_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| {
                AppError::MissingRequiredFilter("Department code is required".to_string())
            })?
            .to_string();

        let employee_number = match employee_number.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                AppError::validation("employeeNumber", "Employee number must be a valid integer")
            })?),
        };

        Ok(Self {
            month,
            department_code,
            employee_number,
        })
    }
}

/// Everything the assembler needs, as read by a store for one filter.
///
/// `employees` and `salaries` may be wider than the filter; the assembler
/// narrows them.
#[derive(Debug, Clone, Default)]
pub struct ReportSource {
    pub department: Option<Department>,
    pub employees: Vec<Employee>,
    pub salaries: Vec<Salary>,
    pub available_months: Vec<Month>,
    pub counts: RecordCounts,
}

pub fn assemble(filter: &ReportFilter, source: ReportSource) -> PayrollReport {
    let department_name = source
        .department
        .filter(|d| d.code == filter.department_code)
        .map(|d| d.name)
        .unwrap_or_default();

    let net_by_employee: HashMap<u64, Decimal> = source
        .salaries
        .iter()
        .filter(|s| s.month == filter.month)
        .map(|s| (s.employee_number, s.net_salary))
        .collect();

    let mut rows: Vec<ReportRow> = source
        .employees
        .into_iter()
        .filter(|e| e.department_code == filter.department_code)
        .filter(|e| filter.employee_number.is_none_or(|n| e.number == n))
        .map(|e| ReportRow {
            net_salary: net_by_employee
                .get(&e.number)
                .copied()
                .unwrap_or(Decimal::ZERO),
            employee_number: e.number,
            first_name: e.first_name,
            last_name: e.last_name,
            position: e.position,
            department_name: department_name.clone(),
        })
        .collect();

    rows.sort_by_cached_key(|r| {
        (
            r.last_name.to_lowercase(),
            r.first_name.to_lowercase(),
            r.employee_number,
        )
    });

    let mut available_months = source.available_months;
    available_months.sort_unstable_by(|a, b| b.cmp(a));
    available_months.dedup();

    PayrollReport {
        rows,
        metadata: ReportMetadata {
            available_months,
            counts: source.counts,
        },
    }
}
