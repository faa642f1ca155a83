pub mod department;
pub mod employee;
pub mod month;
pub mod report;
pub mod salary;
