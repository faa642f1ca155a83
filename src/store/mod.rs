//! Entity store for departments, employees and salaries.
//!
//! Every write that depends on other rows (a parent that must exist, a
//! duplicate that must not, dependents that block a delete) runs its checks
//! and the write as one unit, so a concurrent writer cannot slip between them.

pub mod memory;
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::error::AppResult;
use crate::model::{
    department::{Department, DepartmentChanges},
    employee::{Employee, EmployeeDetails, NewEmployee},
    salary::{NewSalary, Salary, SalaryDetails},
};
use crate::payroll::report::{ReportFilter, ReportSource};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn list_departments(&self) -> AppResult<Vec<Department>>;
    async fn find_department(&self, code: &str) -> AppResult<Option<Department>>;
    async fn create_department(&self, department: Department) -> AppResult<Department>;
    /// `None` when no department has this code
    async fn update_department(
        &self,
        code: &str,
        changes: DepartmentChanges,
    ) -> AppResult<Option<Department>>;
    /// `false` when no department has this code
    async fn delete_department(&self, code: &str) -> AppResult<bool>;

    async fn list_employees(&self) -> AppResult<Vec<EmployeeDetails>>;
    async fn find_employee(&self, number: u64) -> AppResult<Option<EmployeeDetails>>;
    async fn create_employee(&self, employee: NewEmployee) -> AppResult<Employee>;
    async fn update_employee(
        &self,
        number: u64,
        employee: NewEmployee,
    ) -> AppResult<Option<Employee>>;
    async fn delete_employee(&self, number: u64) -> AppResult<bool>;

    async fn list_salaries(&self) -> AppResult<Vec<SalaryDetails>>;
    async fn list_salaries_for_employee(&self, number: u64) -> AppResult<Vec<SalaryDetails>>;
    async fn find_salary(&self, id: u64) -> AppResult<Option<SalaryDetails>>;
    async fn create_salary(&self, salary: NewSalary) -> AppResult<Salary>;
    async fn update_salary(&self, id: u64, salary: NewSalary) -> AppResult<Option<Salary>>;
    async fn delete_salary(&self, id: u64) -> AppResult<bool>;

    /// Reads the rows a payroll report for `filter` is assembled from.
    async fn report_source(&self, filter: &ReportFilter) -> AppResult<ReportSource>;
}

/// Builds the store selected by configuration.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn PayrollStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::MySql => {
            let pool = crate::db::init_db(&config.database_url, config.db_max_connections).await?;
            crate::db::migrate(&pool).await?;
            Ok(Arc::new(MySqlStore::new(pool)))
        }
    }
}
