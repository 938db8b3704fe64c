// Registry Code - Core Library
// Exposes the code generator and its collaborators for the CLI, TUI and API server

pub mod code;
pub mod record;
pub mod validation;
pub mod form;
pub mod batch;
pub mod config;

// Re-export commonly used types
pub use code::{
    generate, generate_from_canonical, fold_base36, character_sum, position_weighted_sum,
    RegistryCode, CodeParseError, CODE_LENGTH, ALPHABET,
};
pub use record::{IdentityRecord, DATE_FORMAT};
pub use validation::{
    InputValidator, RawIdentity, ValidationError, NameField, NameIssue, parse_birth_date,
};
pub use form::{RegistryForm, FormField, INITIAL_CODE_DISPLAY, CLEARED_CODE_DISPLAY};
pub use batch::{
    BatchRow, BatchResult, BatchSummary, SourceRow,
    load_rows, load_rows_from_reader, process_row, process_rows, write_results,
};
pub use config::{Config, ConfigError, ListenConfig, FormConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
