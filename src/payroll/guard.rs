//! Referential integrity rules between departments, employees and salaries.
//!
//! Each check takes what the store looked up inside its transaction and
//! decides whether the write may proceed. The store runs the lookup, the
//! check and the write in one critical section.

use crate::error::AppError;
use crate::model::month::Month;

pub fn require_department(exists: bool, code: &str) -> Result<(), AppError> {
    if exists {
        Ok(())
    } else {
        Err(AppError::InvalidReference(format!(
            "Invalid department code '{code}'"
        )))
    }
}

pub fn require_employee(exists: bool, number: u64) -> Result<(), AppError> {
    if exists {
        Ok(())
    } else {
        Err(AppError::InvalidReference(format!(
            "Invalid employee number {number}"
        )))
    }
}

pub fn reject_duplicate_department(exists: bool, code: &str) -> Result<(), AppError> {
    if exists {
        Err(AppError::DuplicateRecord(format!(
            "Department code '{code}' already exists"
        )))
    } else {
        Ok(())
    }
}

/// `existing` is the id of another salary for the same employee and month.
pub fn reject_duplicate_salary(
    existing: Option<u64>,
    employee_number: u64,
    month: &Month,
) -> Result<(), AppError> {
    match existing {
        Some(_) => Err(AppError::DuplicateRecord(format!(
            "Salary record already exists for employee {employee_number} and month {month}"
        ))),
        None => Ok(()),
    }
}

pub fn ensure_no_employees(count: i64, code: &str) -> Result<(), AppError> {
    if count > 0 {
        Err(AppError::DependentRecordsExist(format!(
            "Cannot delete department '{code}' with {count} existing employee(s)"
        )))
    } else {
        Ok(())
    }
}

pub fn ensure_no_salaries(count: i64, number: u64) -> Result<(), AppError> {
    if count > 0 {
        Err(AppError::DependentRecordsExist(format!(
            "Cannot delete employee {number} with {count} existing salary record(s)"
        )))
    } else {
        Ok(())
    }
}
