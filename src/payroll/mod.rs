pub mod guard;
pub mod net_salary;
pub mod report;
pub mod view;
