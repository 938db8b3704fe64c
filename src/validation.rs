// 🛂 Input Validation - the boundary in front of the code generator
// Nothing reaches `code::generate` unless every check here passed

use crate::record::{IdentityRecord, DATE_FORMAT};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    Surname,
    GivenName,
    Patronymic,
}

impl NameField {
    pub fn label(&self) -> &'static str {
        match self {
            NameField::Surname => "surname",
            NameField::GivenName => "given name",
            NameField::Patronymic => "patronymic",
        }
    }
}

impl fmt::Display for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameIssue {
    Empty,
    ContainsSpace,
    NonAlphabetic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", name_message(.field, .issue))]
    InvalidNameFormat { field: NameField, issue: NameIssue },

    #[error("birth date {birth_date} cannot be later than the current date ({today})")]
    FutureBirthDate { birth_date: NaiveDate, today: NaiveDate },

    #[error("birth date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidBirthDate(String),

    #[error("group number must be a whole number, got '{0}'")]
    InvalidGroupId(String),
}

fn name_message(field: &NameField, issue: &NameIssue) -> String {
    match issue {
        NameIssue::Empty => format!("{} is required", field),
        NameIssue::ContainsSpace => format!("{} must not contain spaces", field),
        NameIssue::NonAlphabetic => format!("{} must consist of letters only", field),
    }
}

impl ValidationError {
    /// Short machine-readable kind, used in batch output and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidNameFormat { .. } => "invalid_name_format",
            ValidationError::FutureBirthDate { .. } => "future_birth_date",
            ValidationError::InvalidBirthDate(_) => "invalid_birth_date",
            ValidationError::InvalidGroupId(_) => "invalid_group_id",
        }
    }
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// Field values as entered, before any check ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIdentity {
    pub surname: String,
    pub given_name: String,
    pub patronymic: String,
    pub birth_date: NaiveDate,
    pub group_id: String,
}

/// Parse a `YYYY-MM-DD` birth date coming from text input (CLI, CSV, HTTP).
pub fn parse_birth_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidBirthDate(trimmed.to_string()))
}

// ============================================================================
// INPUT VALIDATOR
// ============================================================================

pub struct InputValidator {
    today: NaiveDate,
}

impl InputValidator {
    /// Validator whose "today" is the local calendar date at construction
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        InputValidator { today }
    }

    /// Every name token must be non-empty, space-free and alphabetic.
    pub fn check_names(
        &self,
        surname: &str,
        given_name: &str,
        patronymic: &str,
    ) -> Result<(), ValidationError> {
        let fields = [
            (NameField::Surname, surname),
            (NameField::GivenName, given_name),
            (NameField::Patronymic, patronymic),
        ];

        for (field, value) in fields {
            let issue = if value.is_empty() {
                Some(NameIssue::Empty)
            } else if value.chars().any(char::is_whitespace) {
                Some(NameIssue::ContainsSpace)
            } else if !value.chars().all(char::is_alphabetic) {
                Some(NameIssue::NonAlphabetic)
            } else {
                None
            };

            if let Some(issue) = issue {
                return Err(ValidationError::InvalidNameFormat { field, issue });
            }
        }

        Ok(())
    }

    pub fn check_birth_date(&self, birth_date: NaiveDate) -> Result<(), ValidationError> {
        if birth_date > self.today {
            return Err(ValidationError::FutureBirthDate {
                birth_date,
                today: self.today,
            });
        }
        Ok(())
    }

    /// Group ids are non-empty runs of ASCII digits.
    pub fn check_group_id(&self, group_id: &str) -> Result<(), ValidationError> {
        if group_id.is_empty() || !group_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidGroupId(group_id.to_string()));
        }
        Ok(())
    }

    /// Trim the text fields, run every check in order and build the record.
    ///
    /// Stops at the first failing check: names, then birth date, then group id.
    pub fn validate(&self, raw: &RawIdentity) -> Result<IdentityRecord, ValidationError> {
        let surname = raw.surname.trim();
        let given_name = raw.given_name.trim();
        let patronymic = raw.patronymic.trim();
        let group_id = raw.group_id.trim();

        let checked = self
            .check_names(surname, given_name, patronymic)
            .and_then(|_| self.check_birth_date(raw.birth_date))
            .and_then(|_| self.check_group_id(group_id));

        if let Err(e) = checked {
            debug!(kind = e.kind(), "identity rejected: {}", e);
            return Err(e);
        }

        Ok(IdentityRecord::new(
            surname,
            given_name,
            patronymic,
            raw.birth_date,
            group_id,
        ))
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn validator() -> InputValidator {
        InputValidator::with_today(date(2024, 9, 1))
    }

    fn create_test_identity() -> RawIdentity {
        RawIdentity {
            surname: "Ivanov".to_string(),
            given_name: "Ivan".to_string(),
            patronymic: "Ivanovich".to_string(),
            birth_date: date(2000, 5, 15),
            group_id: "101".to_string(),
        }
    }

    #[test]
    fn test_validate_valid_identity() {
        let record = validator().validate(&create_test_identity()).unwrap();

        assert_eq!(record.surname, "Ivanov");
        assert_eq!(record.group_id, "101");
        assert_eq!(record.canonical_string(), "Ivanov Ivan Ivanovich 2000-05-15 101");
    }

    #[test]
    fn test_validate_trims_surrounding_whitespace() {
        let mut raw = create_test_identity();
        raw.surname = "  Ivanov ".to_string();
        raw.group_id = "101\t".to_string();

        let record = validator().validate(&raw).unwrap();
        assert_eq!(record.surname, "Ivanov");
        assert_eq!(record.group_id, "101");
    }

    #[test]
    fn test_validate_accepts_cyrillic_names() {
        let mut raw = create_test_identity();
        raw.surname = "Иванов".to_string();
        raw.given_name = "Иван".to_string();
        raw.patronymic = "Иванович".to_string();

        assert!(validator().validate(&raw).is_ok());
    }

    #[test]
    fn test_name_with_inner_space() {
        let mut raw = create_test_identity();
        raw.given_name = "Ivan Ivan".to_string();

        let err = validator().validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidNameFormat {
                field: NameField::GivenName,
                issue: NameIssue::ContainsSpace,
            }
        );
        assert_eq!(err.to_string(), "given name must not contain spaces");
    }

    #[test]
    fn test_name_with_digit() {
        let mut raw = create_test_identity();
        raw.patronymic = "Ivanovich2".to_string();

        let err = validator().validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidNameFormat {
                field: NameField::Patronymic,
                issue: NameIssue::NonAlphabetic,
            }
        );
    }

    #[test]
    fn test_name_with_hyphen_is_rejected() {
        let mut raw = create_test_identity();
        raw.surname = "Rimsky-Korsakov".to_string();

        assert_eq!(validator().validate(&raw).unwrap_err().kind(), "invalid_name_format");
    }

    #[test]
    fn test_empty_name_after_trim() {
        let mut raw = create_test_identity();
        raw.surname = "   ".to_string();

        let err = validator().validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidNameFormat {
                field: NameField::Surname,
                issue: NameIssue::Empty,
            }
        );
    }

    #[test]
    fn test_birth_date_today_is_allowed() {
        let mut raw = create_test_identity();
        raw.birth_date = date(2024, 9, 1);

        assert!(validator().validate(&raw).is_ok());
    }

    #[test]
    fn test_future_birth_date() {
        let mut raw = create_test_identity();
        raw.birth_date = date(2024, 9, 2);

        let err = validator().validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FutureBirthDate {
                birth_date: date(2024, 9, 2),
                today: date(2024, 9, 1),
            }
        );
    }

    #[test]
    fn test_group_id_must_be_digits() {
        let v = validator();
        assert!(v.check_group_id("0042").is_ok());
        assert!(v.check_group_id("").is_err());
        assert!(v.check_group_id("10a").is_err());
        assert!(v.check_group_id("-1").is_err());
        assert!(v.check_group_id("1 0").is_err());
        // Non-ASCII digits are not decimal group numbers here
        assert!(v.check_group_id("١٠١").is_err());
    }

    #[test]
    fn test_checks_short_circuit_in_order() {
        let raw = RawIdentity {
            surname: "Iv4nov".to_string(),
            given_name: "Ivan".to_string(),
            patronymic: "Ivanovich".to_string(),
            birth_date: date(2030, 1, 1),
            group_id: "abc".to_string(),
        };

        // Names are checked first
        assert_eq!(validator().validate(&raw).unwrap_err().kind(), "invalid_name_format");

        let raw = RawIdentity {
            surname: "Ivanov".to_string(),
            ..raw
        };
        assert_eq!(validator().validate(&raw).unwrap_err().kind(), "future_birth_date");
    }

    #[test]
    fn test_parse_birth_date() {
        assert_eq!(parse_birth_date("2000-05-15").unwrap(), date(2000, 5, 15));
        assert_eq!(parse_birth_date(" 2000-05-15 ").unwrap(), date(2000, 5, 15));
        assert_eq!(
            parse_birth_date("15.05.2000"),
            Err(ValidationError::InvalidBirthDate("15.05.2000".to_string()))
        );
        assert!(parse_birth_date("2001-02-29").is_err());
    }
}
