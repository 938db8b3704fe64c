// 🪪 Identity Record - the validated input of the code generator
// Built once per "generate" action, never stored

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date layout used inside the canonical string (zero-padded YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A student's identity fields after validation.
///
/// Holding one of these means the name tokens are alphabetic and space-free,
/// the birth date is not in the future and the group id is all digits.
/// Construct through `InputValidator::validate` unless the fields are
/// already known to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub surname: String,
    pub given_name: String,
    pub patronymic: String,
    pub birth_date: NaiveDate,
    pub group_id: String,
}

impl IdentityRecord {
    pub fn new(
        surname: impl Into<String>,
        given_name: impl Into<String>,
        patronymic: impl Into<String>,
        birth_date: NaiveDate,
        group_id: impl Into<String>,
    ) -> Self {
        IdentityRecord {
            surname: surname.into(),
            given_name: given_name.into(),
            patronymic: patronymic.into(),
            birth_date,
            group_id: group_id.into(),
        }
    }

    /// The single string the fold runs over:
    /// `"{surname} {given_name} {patronymic} {YYYY-MM-DD} {group_id}"`
    pub fn canonical_string(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.surname,
            self.given_name,
            self.patronymic,
            self.birth_date.format(DATE_FORMAT),
            self.group_id
        )
    }
}
