// 📝 Registry Form - presenter state behind the terminal UI
// Holds what the user typed, the focused field and the code on display.

use crate::code::{generate, RegistryCode};
use crate::config::default_birth_date;
use crate::record::DATE_FORMAT;
use crate::validation::{InputValidator, RawIdentity};
use chrono::{Days, NaiveDate};
use tracing::info;

/// Shown before the first generation
pub const INITIAL_CODE_DISPLAY: &str = "00000000";

/// Shown after the fields are cleared: no code computed yet
pub const CLEARED_CODE_DISPLAY: &str = "--------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Surname,
    GivenName,
    Patronymic,
    BirthDate,
    GroupId,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Surname,
        FormField::GivenName,
        FormField::Patronymic,
        FormField::BirthDate,
        FormField::GroupId,
    ];

    pub fn label(&self) -> &str {
        match self {
            FormField::Surname => "Surname",
            FormField::GivenName => "Given name",
            FormField::Patronymic => "Patronymic",
            FormField::BirthDate => "Birth date",
            FormField::GroupId => "Group number",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FormField::Surname => FormField::GivenName,
            FormField::GivenName => FormField::Patronymic,
            FormField::Patronymic => FormField::BirthDate,
            FormField::BirthDate => FormField::GroupId,
            FormField::GroupId => FormField::Surname,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            FormField::Surname => FormField::GroupId,
            FormField::GivenName => FormField::Surname,
            FormField::Patronymic => FormField::GivenName,
            FormField::BirthDate => FormField::Patronymic,
            FormField::GroupId => FormField::BirthDate,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, FormField::BirthDate)
    }
}

pub struct RegistryForm {
    pub surname: String,
    pub given_name: String,
    pub patronymic: String,
    pub birth_date: NaiveDate,
    pub group_id: String,
    pub focused: FormField,
    pub code_display: String,
    pub error: Option<String>,
    reset_birth_date: NaiveDate,
}

impl RegistryForm {
    pub fn new(reset_birth_date: NaiveDate) -> Self {
        Self {
            surname: String::new(),
            given_name: String::new(),
            patronymic: String::new(),
            birth_date: reset_birth_date,
            group_id: String::new(),
            focused: FormField::Surname,
            code_display: INITIAL_CODE_DISPLAY.to_string(),
            error: None,
            reset_birth_date,
        }
    }

    /// Current text of a field, the birth date rendered as YYYY-MM-DD
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::BirthDate => self.birth_date.format(DATE_FORMAT).to_string(),
            other => self.text(other).cloned().unwrap_or_default(),
        }
    }

    fn text(&self, field: FormField) -> Option<&String> {
        match field {
            FormField::Surname => Some(&self.surname),
            FormField::GivenName => Some(&self.given_name),
            FormField::Patronymic => Some(&self.patronymic),
            FormField::GroupId => Some(&self.group_id),
            FormField::BirthDate => None,
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Surname => Some(&mut self.surname),
            FormField::GivenName => Some(&mut self.given_name),
            FormField::Patronymic => Some(&mut self.patronymic),
            FormField::GroupId => Some(&mut self.group_id),
            FormField::BirthDate => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_previous(&mut self) {
        self.focused = self.focused.previous();
    }

    /// Type into the focused text field. Ignored on the date field.
    pub fn input_char(&mut self, c: char) {
        let focused = self.focused;
        if let Some(buf) = self.text_mut(focused) {
            buf.push(c);
        }
    }

    pub fn backspace(&mut self) {
        let focused = self.focused;
        if let Some(buf) = self.text_mut(focused) {
            buf.pop();
        }
    }

    /// Move the birth date by whole days. Out-of-range results leave it unchanged.
    pub fn shift_birth_date(&mut self, days: i64) {
        let step = Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            self.birth_date.checked_add_days(step)
        } else {
            self.birth_date.checked_sub_days(step)
        };
        if let Some(date) = shifted {
            self.birth_date = date;
        }
    }

    pub fn set_birth_date(&mut self, date: NaiveDate) {
        self.birth_date = date;
    }

    pub fn raw_identity(&self) -> RawIdentity {
        RawIdentity {
            surname: self.surname.clone(),
            given_name: self.given_name.clone(),
            patronymic: self.patronymic.clone(),
            birth_date: self.birth_date,
            group_id: self.group_id.clone(),
        }
    }

    /// Validate the fields and, if they pass, display the fresh code.
    ///
    /// On failure the error message is stored and the displayed code is left as it was.
    pub fn generate(&mut self, validator: &InputValidator) -> Option<RegistryCode> {
        match validator.validate(&self.raw_identity()) {
            Ok(record) => {
                let code = generate(&record);
                info!(code = %code, "registry code generated");
                self.code_display = code.to_string();
                self.error = None;
                Some(code)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Empty the text fields, reset the date and show the placeholder.
    pub fn clear(&mut self) {
        self.surname.clear();
        self.given_name.clear();
        self.patronymic.clear();
        self.group_id.clear();
        self.birth_date = self.reset_birth_date;
        self.code_display = CLEARED_CODE_DISPLAY.to_string();
        self.error = None;
    }
}

impl Default for RegistryForm {
    fn default() -> Self {
        Self::new(default_birth_date())
    }
}
