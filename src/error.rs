//! Process-level error type.
//!
//! Every fallible path in the dashboard funnels into `AppError`, which pairs a
//! user-facing message with the process exit code `main` should return:
//!
//! - 2: input problems (unreadable directory, IO failures)
//! - 3: no usable data (nothing dated, date not indexed, inverted range)
//! - 4: terminal/runtime failures in the TUI

#[derive(Clone)]
pub struct AppError {
    message: String,
    exit_code: u8,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Exit code for `std::process::ExitCode` in `main`.
    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// Manual Debug so `Err(e)` in main prints the message, not a struct dump.
impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (exit code {})", self.message, self.exit_code)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_message_and_exit_code() {
        let err = AppError::new(3, "No dated files available.");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "No dated files available.");
        assert!(format!("{err:?}").contains("exit code 3"));
    }
}
