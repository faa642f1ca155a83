//! In-process store. One lock covers every table, so a write holds it across
//! its integrity checks and the mutation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::PayrollStore;
use crate::error::{AppError, AppResult};
use crate::model::{
    department::{Department, DepartmentChanges},
    employee::{Employee, EmployeeDetails, NewEmployee},
    report::RecordCounts,
    salary::{NewSalary, Salary, SalaryDetails},
};
use crate::payroll::{
    guard, net_salary,
    report::{ReportFilter, ReportSource},
};

#[derive(Default)]
struct Tables {
    departments: BTreeMap<String, Department>,
    employees: BTreeMap<u64, Employee>,
    salaries: BTreeMap<u64, Salary>,
    last_employee_number: u64,
    last_salary_id: u64,
}

impl Tables {
    fn employee_details(&self, employee: &Employee) -> EmployeeDetails {
        EmployeeDetails {
            department_name: self
                .departments
                .get(&employee.department_code)
                .map(|d| d.name.clone()),
            employee: employee.clone(),
        }
    }

    fn salary_details(&self, salary: &Salary) -> Option<SalaryDetails> {
        let employee = self.employees.get(&salary.employee_number)?;
        let department = self.departments.get(&employee.department_code)?;
        Some(SalaryDetails {
            salary: salary.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            position: employee.position.clone(),
            department_name: department.name.clone(),
        })
    }

    fn salary_for_month(&self, salary: &NewSalary, excluding: Option<u64>) -> Option<u64> {
        self.salaries
            .values()
            .find(|s| {
                s.employee_number == salary.employee_number
                    && s.month == salary.month
                    && Some(s.id) != excluding
            })
            .map(|s| s.id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

fn month_desc_then_name(a: &SalaryDetails, b: &SalaryDetails) -> std::cmp::Ordering {
    b.salary
        .month
        .cmp(&a.salary.month)
        .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()))
        .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn list_departments(&self) -> AppResult<Vec<Department>> {
        Ok(self.read()?.departments.values().cloned().collect())
    }

    async fn find_department(&self, code: &str) -> AppResult<Option<Department>> {
        Ok(self.read()?.departments.get(code).cloned())
    }

    async fn create_department(&self, department: Department) -> AppResult<Department> {
        let mut tables = self.write()?;
        guard::reject_duplicate_department(
            tables.departments.contains_key(&department.code),
            &department.code,
        )?;
        tables
            .departments
            .insert(department.code.clone(), department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        code: &str,
        changes: DepartmentChanges,
    ) -> AppResult<Option<Department>> {
        let mut tables = self.write()?;
        Ok(tables.departments.get_mut(code).map(|department| {
            department.name = changes.name;
            department.gross_salary_budget = changes.gross_salary_budget;
            department.clone()
        }))
    }

    async fn delete_department(&self, code: &str) -> AppResult<bool> {
        let mut tables = self.write()?;
        let dependents = tables
            .employees
            .values()
            .filter(|e| e.department_code == code)
            .count();
        guard::ensure_no_employees(dependents as i64, code)?;
        Ok(tables.departments.remove(code).is_some())
    }

    async fn list_employees(&self) -> AppResult<Vec<EmployeeDetails>> {
        let tables = self.read()?;
        Ok(tables
            .employees
            .values()
            .map(|e| tables.employee_details(e))
            .collect())
    }

    async fn find_employee(&self, number: u64) -> AppResult<Option<EmployeeDetails>> {
        let tables = self.read()?;
        Ok(tables
            .employees
            .get(&number)
            .map(|e| tables.employee_details(e)))
    }

    async fn create_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let mut tables = self.write()?;
        guard::require_department(
            tables.departments.contains_key(&employee.department_code),
            &employee.department_code,
        )?;

        tables.last_employee_number += 1;
        let created = employee.into_employee(tables.last_employee_number);
        tables.employees.insert(created.number, created.clone());
        Ok(created)
    }

    async fn update_employee(
        &self,
        number: u64,
        employee: NewEmployee,
    ) -> AppResult<Option<Employee>> {
        let mut tables = self.write()?;
        guard::require_department(
            tables.departments.contains_key(&employee.department_code),
            &employee.department_code,
        )?;

        Ok(tables.employees.get_mut(&number).map(|existing| {
            *existing = employee.into_employee(number);
            existing.clone()
        }))
    }

    async fn delete_employee(&self, number: u64) -> AppResult<bool> {
        let mut tables = self.write()?;
        let dependents = tables
            .salaries
            .values()
            .filter(|s| s.employee_number == number)
            .count();
        guard::ensure_no_salaries(dependents as i64, number)?;
        Ok(tables.employees.remove(&number).is_some())
    }

    async fn list_salaries(&self) -> AppResult<Vec<SalaryDetails>> {
        let tables = self.read()?;
        let mut salaries: Vec<SalaryDetails> = tables
            .salaries
            .values()
            .filter_map(|s| tables.salary_details(s))
            .collect();
        salaries.sort_by(month_desc_then_name);
        Ok(salaries)
    }

    async fn list_salaries_for_employee(&self, number: u64) -> AppResult<Vec<SalaryDetails>> {
        let tables = self.read()?;
        let mut salaries: Vec<SalaryDetails> = tables
            .salaries
            .values()
            .filter(|s| s.employee_number == number)
            .filter_map(|s| tables.salary_details(s))
            .collect();
        salaries.sort_by(|a, b| b.salary.month.cmp(&a.salary.month));
        Ok(salaries)
    }

    async fn find_salary(&self, id: u64) -> AppResult<Option<SalaryDetails>> {
        let tables = self.read()?;
        Ok(tables
            .salaries
            .get(&id)
            .and_then(|s| tables.salary_details(s)))
    }

    async fn create_salary(&self, salary: NewSalary) -> AppResult<Salary> {
        let net = net_salary::derive(salary.gross_salary, salary.total_deduction)?;

        let mut tables = self.write()?;
        guard::require_employee(
            tables.employees.contains_key(&salary.employee_number),
            salary.employee_number,
        )?;
        guard::reject_duplicate_salary(
            tables.salary_for_month(&salary, None),
            salary.employee_number,
            &salary.month,
        )?;

        tables.last_salary_id += 1;
        let created = Salary {
            id: tables.last_salary_id,
            employee_number: salary.employee_number,
            gross_salary: salary.gross_salary,
            total_deduction: salary.total_deduction,
            net_salary: net,
            month: salary.month,
        };
        tables.salaries.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_salary(&self, id: u64, salary: NewSalary) -> AppResult<Option<Salary>> {
        let net = net_salary::derive(salary.gross_salary, salary.total_deduction)?;

        let mut tables = self.write()?;
        guard::require_employee(
            tables.employees.contains_key(&salary.employee_number),
            salary.employee_number,
        )?;
        guard::reject_duplicate_salary(
            tables.salary_for_month(&salary, Some(id)),
            salary.employee_number,
            &salary.month,
        )?;

        Ok(tables.salaries.get_mut(&id).map(|existing| {
            *existing = Salary {
                id,
                employee_number: salary.employee_number,
                gross_salary: salary.gross_salary,
                total_deduction: salary.total_deduction,
                net_salary: net,
                month: salary.month,
            };
            existing.clone()
        }))
    }

    async fn delete_salary(&self, id: u64) -> AppResult<bool> {
        Ok(self.write()?.salaries.remove(&id).is_some())
    }

    async fn report_source(&self, filter: &ReportFilter) -> AppResult<ReportSource> {
        let tables = self.read()?;

        let employees: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| e.department_code == filter.department_code)
            .filter(|e| filter.employee_number.is_none_or(|n| e.number == n))
            .cloned()
            .collect();

        let salaries = tables
            .salaries
            .values()
            .filter(|s| s.month == filter.month)
            .filter(|s| employees.iter().any(|e| e.number == s.employee_number))
            .cloned()
            .collect();

        let available_months = tables
            .salaries
            .values()
            .map(|s| s.month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .rev()
            .collect();

        Ok(ReportSource {
            department: tables.departments.get(&filter.department_code).cloned(),
            employees,
            salaries,
            available_months,
            counts: RecordCounts {
                employee_count: tables.employees.len() as i64,
                department_count: tables.departments.len() as i64,
                salary_count: tables.salaries.len() as i64,
            },
        })
    }
}
