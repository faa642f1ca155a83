//! MySQL store. Checks and writes share a transaction; referenced parent rows
//! are share-locked, duplicate probes are plain reads, and the schema's unique
//! and foreign keys reject whatever a concurrent writer slipped past them.

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::debug;

use super::PayrollStore;
use crate::error::{AppError, AppResult};
use crate::model::{
    department::{Department, DepartmentChanges},
    employee::{Employee, EmployeeDetails, NewEmployee},
    month::Month,
    report::RecordCounts,
    salary::{NewSalary, Salary, SalaryDetails},
};
use crate::payroll::{
    guard, net_salary,
    report::{ReportFilter, ReportSource},
};

const EMPLOYEE_DETAILS_SQL: &str = r#"
    SELECT e.number, e.first_name, e.last_name, e.position, e.address, e.telephone,
           e.gender, e.hired_date, e.department_code, d.name AS department_name
    FROM employees e
    LEFT JOIN departments d ON e.department_code = d.code
"#;

const SALARY_DETAILS_SQL: &str = r#"
    SELECT s.id, s.employee_number, s.gross_salary, s.total_deduction, s.net_salary, s.month,
           e.first_name, e.last_name, e.position, d.name AS department_name
    FROM salaries s
    JOIN employees e ON s.employee_number = e.number
    JOIN departments d ON e.department_code = d.code
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// Why the database refused a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// A concurrent writer passed the same duplicate check first.
    Duplicate,
    ForeignKey,
    /// ER_LOCK_DEADLOCK; this transaction was rolled back as the victim.
    Deadlock,
}

impl Rejection {
    fn classify(is_unique: bool, is_foreign_key: bool, sqlstate: Option<&str>) -> Option<Self> {
        if is_unique {
            Some(Rejection::Duplicate)
        } else if is_foreign_key {
            Some(Rejection::ForeignKey)
        } else if sqlstate == Some(SQLSTATE_SERIALIZATION_FAILURE) {
            Some(Rejection::Deadlock)
        } else {
            None
        }
    }

    fn into_error(self, on_foreign_key: impl FnOnce() -> AppError) -> AppError {
        match self {
            Rejection::Duplicate => AppError::Conflict(
                "Record was created concurrently by another request".to_string(),
            ),
            Rejection::Deadlock => AppError::Conflict(
                "Write collided with a concurrent request, retry it".to_string(),
            ),
            Rejection::ForeignKey => on_foreign_key(),
        }
    }
}

fn constraint_error(e: sqlx::Error, on_foreign_key: impl FnOnce() -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        let sqlstate = db_err.code();
        let rejection = Rejection::classify(
            db_err.is_unique_violation(),
            db_err.is_foreign_key_violation(),
            sqlstate.as_deref(),
        );
        if let Some(rejection) = rejection {
            return rejection.into_error(on_foreign_key);
        }
    }
    AppError::from(e)
}

async fn department_exists(tx: &mut Transaction<'_, MySql>, code: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, String>("SELECT code FROM departments WHERE code = ? LOCK IN SHARE MODE")
        .bind(code)
        .fetch_optional(&mut **tx)
        .await
        .map(|row| row.is_some())
}

async fn employee_exists(tx: &mut Transaction<'_, MySql>, number: u64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, u64>("SELECT number FROM employees WHERE number = ? LOCK IN SHARE MODE")
        .bind(number)
        .fetch_optional(&mut **tx)
        .await
        .map(|row| row.is_some())
}

async fn salary_for_month(
    tx: &mut Transaction<'_, MySql>,
    salary: &NewSalary,
    excluding: Option<u64>,
) -> sqlx::Result<Option<u64>> {
    sqlx::query_scalar::<_, u64>(
        r#"
        SELECT id FROM salaries
        WHERE employee_number = ? AND month = ? AND id <> ?
        "#,
    )
    .bind(salary.employee_number)
    .bind(&salary.month)
    .bind(excluding.unwrap_or(0))
    .fetch_optional(&mut **tx)
    .await
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn list_departments(&self) -> AppResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT code, name, gross_salary_budget FROM departments ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    async fn find_department(&self, code: &str) -> AppResult<Option<Department>> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT code, name, gross_salary_budget FROM departments WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    async fn create_department(&self, department: Department) -> AppResult<Department> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, String>("SELECT code FROM departments WHERE code = ?")
        .bind(&department.code)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
        guard::reject_duplicate_department(exists, &department.code)?;

        sqlx::query("INSERT INTO departments (code, name, gross_salary_budget) VALUES (?, ?, ?)")
            .bind(&department.code)
            .bind(&department.name)
            .bind(department.gross_salary_budget)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                constraint_error(e, || {
                    AppError::Internal("departments has no foreign keys".to_string())
                })
            })?;

        tx.commit().await?;
        debug!(code = %department.code, "Department created");
        Ok(department)
    }

    async fn update_department(
        &self,
        code: &str,
        changes: DepartmentChanges,
    ) -> AppResult<Option<Department>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT code FROM departments WHERE code = ? FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(code) = existing else {
            return Ok(None);
        };

        sqlx::query("UPDATE departments SET name = ?, gross_salary_budget = ? WHERE code = ?")
            .bind(&changes.name)
            .bind(changes.gross_salary_budget)
            .bind(&code)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Department {
            code,
            name: changes.name,
            gross_salary_budget: changes.gross_salary_budget,
        }))
    }

    async fn delete_department(&self, code: &str) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let dependents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employees WHERE department_code = ? LOCK IN SHARE MODE",
        )
        .bind(code)
        .fetch_one(&mut *tx)
        .await?;
        guard::ensure_no_employees(dependents, code)?;

        let result = sqlx::query("DELETE FROM departments WHERE code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                constraint_error(e, || {
                    AppError::DependentRecordsExist(format!(
                        "Cannot delete department '{code}' with existing employees"
                    ))
                })
            })?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_employees(&self) -> AppResult<Vec<EmployeeDetails>> {
        let sql = format!("{EMPLOYEE_DETAILS_SQL} ORDER BY e.number");
        let employees = sqlx::query_as::<_, EmployeeDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn find_employee(&self, number: u64) -> AppResult<Option<EmployeeDetails>> {
        let sql = format!("{EMPLOYEE_DETAILS_SQL} WHERE e.number = ?");
        let employee = sqlx::query_as::<_, EmployeeDetails>(&sql)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn create_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let mut tx = self.pool.begin().await?;

        let exists = department_exists(&mut tx, &employee.department_code).await?;
        guard::require_department(exists, &employee.department_code)?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (first_name, last_name, position, address, telephone, gender, hired_date, department_code)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.position)
        .bind(&employee.address)
        .bind(&employee.telephone)
        .bind(employee.gender)
        .bind(employee.hired_date)
        .bind(&employee.department_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                AppError::InvalidReference(format!(
                    "Invalid department code '{}'",
                    employee.department_code
                ))
            })
        })?;

        tx.commit().await?;
        Ok(employee.into_employee(result.last_insert_id()))
    }

    async fn update_employee(
        &self,
        number: u64,
        employee: NewEmployee,
    ) -> AppResult<Option<Employee>> {
        let mut tx = self.pool.begin().await?;

        let exists = department_exists(&mut tx, &employee.department_code).await?;
        guard::require_department(exists, &employee.department_code)?;

        let found = sqlx::query_scalar::<_, u64>(
            "SELECT number FROM employees WHERE number = ? FOR UPDATE",
        )
        .bind(number)
        .fetch_optional(&mut *tx)
        .await?;
        if found.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE employees
            SET first_name = ?, last_name = ?, position = ?, address = ?,
                telephone = ?, gender = ?, hired_date = ?, department_code = ?
            WHERE number = ?
            "#,
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.position)
        .bind(&employee.address)
        .bind(&employee.telephone)
        .bind(employee.gender)
        .bind(employee.hired_date)
        .bind(&employee.department_code)
        .bind(number)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                AppError::InvalidReference(format!(
                    "Invalid department code '{}'",
                    employee.department_code
                ))
            })
        })?;

        tx.commit().await?;
        Ok(Some(employee.into_employee(number)))
    }

    async fn delete_employee(&self, number: u64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let dependents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM salaries WHERE employee_number = ? LOCK IN SHARE MODE",
        )
        .bind(number)
        .fetch_one(&mut *tx)
        .await?;
        guard::ensure_no_salaries(dependents, number)?;

        let result = sqlx::query("DELETE FROM employees WHERE number = ?")
            .bind(number)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                constraint_error(e, || {
                    AppError::DependentRecordsExist(format!(
                        "Cannot delete employee {number} with existing salary records"
                    ))
                })
            })?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_salaries(&self) -> AppResult<Vec<SalaryDetails>> {
        let sql = format!("{SALARY_DETAILS_SQL} ORDER BY s.month DESC, e.last_name, e.first_name");
        let salaries = sqlx::query_as::<_, SalaryDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(salaries)
    }

    async fn list_salaries_for_employee(&self, number: u64) -> AppResult<Vec<SalaryDetails>> {
        let sql = format!("{SALARY_DETAILS_SQL} WHERE s.employee_number = ? ORDER BY s.month DESC");
        let salaries = sqlx::query_as::<_, SalaryDetails>(&sql)
            .bind(number)
            .fetch_all(&self.pool)
            .await?;
        Ok(salaries)
    }

    async fn find_salary(&self, id: u64) -> AppResult<Option<SalaryDetails>> {
        let sql = format!("{SALARY_DETAILS_SQL} WHERE s.id = ?");
        let salary = sqlx::query_as::<_, SalaryDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(salary)
    }

    async fn create_salary(&self, salary: NewSalary) -> AppResult<Salary> {
        let net = net_salary::derive(salary.gross_salary, salary.total_deduction)?;

        let mut tx = self.pool.begin().await?;

        let exists = employee_exists(&mut tx, salary.employee_number).await?;
        guard::require_employee(exists, salary.employee_number)?;

        let existing = salary_for_month(&mut tx, &salary, None).await?;
        guard::reject_duplicate_salary(existing, salary.employee_number, &salary.month)?;

        let result = sqlx::query(
            r#"
            INSERT INTO salaries
            (employee_number, gross_salary, total_deduction, net_salary, month)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(salary.employee_number)
        .bind(salary.gross_salary)
        .bind(salary.total_deduction)
        .bind(net)
        .bind(&salary.month)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                AppError::InvalidReference(format!(
                    "Invalid employee number {}",
                    salary.employee_number
                ))
            })
        })?;

        tx.commit().await?;
        Ok(Salary {
            id: result.last_insert_id(),
            employee_number: salary.employee_number,
            gross_salary: salary.gross_salary,
            total_deduction: salary.total_deduction,
            net_salary: net,
            month: salary.month,
        })
    }

    async fn update_salary(&self, id: u64, salary: NewSalary) -> AppResult<Option<Salary>> {
        let net = net_salary::derive(salary.gross_salary, salary.total_deduction)?;

        let mut tx = self.pool.begin().await?;

        let exists = employee_exists(&mut tx, salary.employee_number).await?;
        guard::require_employee(exists, salary.employee_number)?;

        let existing = salary_for_month(&mut tx, &salary, Some(id)).await?;
        guard::reject_duplicate_salary(existing, salary.employee_number, &salary.month)?;

        let found = sqlx::query_scalar::<_, u64>("SELECT id FROM salaries WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE salaries
            SET employee_number = ?, gross_salary = ?, total_deduction = ?,
                net_salary = ?, month = ?
            WHERE id = ?
            "#,
        )
        .bind(salary.employee_number)
        .bind(salary.gross_salary)
        .bind(salary.total_deduction)
        .bind(net)
        .bind(&salary.month)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(e, || {
                AppError::InvalidReference(format!(
                    "Invalid employee number {}",
                    salary.employee_number
                ))
            })
        })?;

        tx.commit().await?;
        Ok(Some(Salary {
            id,
            employee_number: salary.employee_number,
            gross_salary: salary.gross_salary,
            total_deduction: salary.total_deduction,
            net_salary: net,
            month: salary.month,
        }))
    }

    async fn delete_salary(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM salaries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn report_source(&self, filter: &ReportFilter) -> AppResult<ReportSource> {
        // one snapshot for rows, months and counts
        let mut tx = self.pool.begin().await?;

        let department = sqlx::query_as::<_, Department>(
            "SELECT code, name, gross_salary_budget FROM departments WHERE code = ?",
        )
        .bind(&filter.department_code)
        .fetch_optional(&mut *tx)
        .await?;

        let employee_clause = if filter.employee_number.is_some() {
            "AND e.number = ?"
        } else {
            ""
        };

        let employees_sql = format!(
            r#"
            SELECT e.number, e.first_name, e.last_name, e.position, e.address, e.telephone,
                   e.gender, e.hired_date, e.department_code
            FROM employees e
            WHERE e.department_code = ? {employee_clause}
            ORDER BY e.last_name, e.first_name, e.number
            "#
        );
        let mut employees_query =
            sqlx::query_as::<_, Employee>(&employees_sql).bind(&filter.department_code);
        if let Some(number) = filter.employee_number {
            employees_query = employees_query.bind(number);
        }
        let employees = employees_query.fetch_all(&mut *tx).await?;

        let salaries_sql = format!(
            r#"
            SELECT s.id, s.employee_number, s.gross_salary, s.total_deduction, s.net_salary, s.month
            FROM salaries s
            JOIN employees e ON s.employee_number = e.number
            WHERE s.month = ? AND e.department_code = ? {employee_clause}
            "#
        );
        let mut salaries_query = sqlx::query_as::<_, Salary>(&salaries_sql)
            .bind(&filter.month)
            .bind(&filter.department_code);
        if let Some(number) = filter.employee_number {
            salaries_query = salaries_query.bind(number);
        }
        let salaries = salaries_query.fetch_all(&mut *tx).await?;

        let available_months = sqlx::query_scalar::<_, Month>(
            "SELECT DISTINCT month FROM salaries ORDER BY month DESC",
        )
        .fetch_all(&mut *tx)
        .await?;

        let counts = sqlx::query_as::<_, RecordCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees) AS employee_count,
                (SELECT COUNT(*) FROM departments) AS department_count,
                (SELECT COUNT(*) FROM salaries) AS salary_count
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            month = %filter.month,
            department = %filter.department_code,
            employees = employees.len(),
            salaries = salaries.len(),
            "Report source loaded"
        );

        Ok(ReportSource {
            department,
            employees,
            salaries,
            available_months,
            counts,
        })
    }
}
