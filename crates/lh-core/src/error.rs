use thiserror::Error;

pub const SCRIPT_COMPILE_ERROR: &str = "SCRIPT_COMPILE_ERROR";
pub const SCRIPT_LOAD_ERROR: &str = "SCRIPT_LOAD_ERROR";
pub const SCRIPT_RUNTIME_ERROR: &str = "SCRIPT_RUNTIME_ERROR";
pub const FUNCTION_NOT_FOUND: &str = "FUNCTION_NOT_FOUND";
pub const RETURN_UNSUPPORTED: &str = "RETURN_UNSUPPORTED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct HostError {
    pub code: String,
    pub message: String,
}

impl HostError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn function_not_found(script: &str, function: &str, arity: usize) -> Self {
        Self::new(
            FUNCTION_NOT_FOUND,
            format!(
                "Function \"{}\" with {} parameter(s) was not found to call in \"{}\".",
                function, arity, script
            ),
        )
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }
}
