use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "number": 1,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "position": "Analyst",
        "address": "12 St James's Square, London",
        "telephone": "+44 20 7946 0000",
        "gender": "Female",
        "hiredDate": "2024-01-15",
        "departmentCode": "ENG"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub number: u64,

    #[schema(example = "Ada")]
    pub first_name: String,

    #[schema(example = "Lovelace")]
    pub last_name: String,

    #[schema(example = "Analyst")]
    pub position: String,

    #[schema(nullable = true)]
    pub address: Option<String>,

    #[schema(nullable = true)]
    pub telephone: Option<String>,

    pub gender: Gender,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub hired_date: NaiveDate,

    #[schema(example = "ENG")]
    pub department_code: String,
}

/// Employee joined with the name of its department.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub employee: Employee,

    #[schema(example = "Engineering", nullable = true)]
    pub department_name: Option<String>,
}

/// Everything an employee write carries; the number is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub gender: Gender,
    pub hired_date: NaiveDate,
    pub department_code: String,
}

impl NewEmployee {
    pub fn into_employee(self, number: u64) -> Employee {
        Employee {
            number,
            first_name: self.first_name,
            last_name: self.last_name,
            position: self.position,
            address: self.address,
            telephone: self.telephone,
            gender: self.gender,
            hired_date: self.hired_date,
            department_code: self.department_code,
        }
    }
}
