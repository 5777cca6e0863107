//! Process-level error type.
//!
//! Every fallible operation in the crate returns `AppError`. The exit code is
//! chosen where the error is raised so `main` only has to forward it.

/// Rule violations were found (reports were written).
pub const EXIT_VIOLATIONS: u8 = 1;
/// Input, schema, or configuration problem (missing file, column, brand...).
pub const EXIT_INPUT: u8 = 2;
/// A report could not be written.
pub const EXIT_OUTPUT: u8 = 3;

#[derive(Clone, PartialEq, Eq)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn violations(message: impl Into<String>) -> Self {
        Self::new(EXIT_VIOLATIONS, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
