use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid month format '{0}'. Use YYYY-MM")]
pub struct MonthFormatError(pub String);

impl From<MonthFormatError> for AppError {
    fn from(e: MonthFormatError) -> Self {
        AppError::InvalidMonthFormat(e.to_string())
    }
}

/// A payroll month, always `YYYY-MM` with a calendar month in 01..=12.
///
/// Lexical order of the inner string is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Month(String);

impl Month {
    pub fn parse(value: &str) -> Result<Self, MonthFormatError> {
        let bytes = value.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(MonthFormatError(value.to_string()));
        }

        let month: u8 = value[5..]
            .parse()
            .map_err(|_| MonthFormatError(value.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(MonthFormatError(value.to_string()));
        }

        Ok(Month(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Month {
    type Err = MonthFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::parse(s)
    }
}

impl TryFrom<String> for Month {
    type Error = MonthFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Month::parse(&value)
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
