//! Error types for NI-DAQmx operations.
//!
//! Every fallible operation in this crate returns [`Result`], whose error type [`DaqError`] is a
//! closed set of kinds. Driver status codes that the binding reacts to are named in
//! [`ErrorCode`]; all other non-zero codes are carried verbatim in [`DaqError::Driver`] together
//! with the diagnostic text retrieved from the driver.
//!
//! Positive status codes are warnings. They never turn a successful call into an error: the
//! interpreter records them as [`DaqWarning`]s (see
//! [`Interpreter::take_warnings`](crate::interpreter::Interpreter::take_warnings)) and logs them.

use niwaveform_backend::WaveformError;
use std::ffi::NulError;
use std::fmt;
use thiserror::Error;

/// Result type alias for NI-DAQmx operations.
pub type Result<T> = std::result::Result<T, DaqError>;

/// Driver status codes the binding gives a name to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ReadBufferTooSmall,
    WriteBufferTooSmall,
    MismatchedInputArraySizes,
    SamplesNotYetAvailable,
    Timeout,
    WaitUntilDoneDoesNotIndicateDone,
    InvalidTask,
    DuplicateTask,
    PropertyNotSettableWhenTaskRunning,
    AttributeNotSupportedInTaskContext,
    InvalidAttributeValue,
    ResourceReserved,
    DeviceNotFound,
    Unknown,
    Other(i32),
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::ReadBufferTooSmall => -200229,
            ErrorCode::WriteBufferTooSmall => -200230,
            ErrorCode::MismatchedInputArraySizes => -200609,
            ErrorCode::SamplesNotYetAvailable => -200284,
            ErrorCode::Timeout => -200474,
            ErrorCode::WaitUntilDoneDoesNotIndicateDone => -200560,
            ErrorCode::InvalidTask => -200088,
            ErrorCode::DuplicateTask => -200089,
            ErrorCode::PropertyNotSettableWhenTaskRunning => -200557,
            ErrorCode::AttributeNotSupportedInTaskContext => -200452,
            ErrorCode::InvalidAttributeValue => -200077,
            ErrorCode::ResourceReserved => -50103,
            ErrorCode::DeviceNotFound => -200220,
            ErrorCode::Unknown => -1,
            ErrorCode::Other(code) => *code,
        }
    }

    /// Codes the driver uses when the requested samples did not arrive in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ErrorCode::Timeout | ErrorCode::SamplesNotYetAvailable)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -200229 => ErrorCode::ReadBufferTooSmall,
            -200230 => ErrorCode::WriteBufferTooSmall,
            -200609 => ErrorCode::MismatchedInputArraySizes,
            -200284 => ErrorCode::SamplesNotYetAvailable,
            -200474 => ErrorCode::Timeout,
            -200560 => ErrorCode::WaitUntilDoneDoesNotIndicateDone,
            -200088 => ErrorCode::InvalidTask,
            -200089 => ErrorCode::DuplicateTask,
            -200557 => ErrorCode::PropertyNotSettableWhenTaskRunning,
            -200452 => ErrorCode::AttributeNotSupportedInTaskContext,
            -200077 => ErrorCode::InvalidAttributeValue,
            -50103 => ErrorCode::ResourceReserved,
            -200220 => ErrorCode::DeviceNotFound,
            -1 => ErrorCode::Unknown,
            other => ErrorCode::Other(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

fn task_suffix(task_name: &Option<String>) -> String {
    match task_name {
        Some(name) if !name.is_empty() => format!("\n\nTask Name: {}", name),
        _ => String::new(),
    }
}

/// Errors that can occur when working with NI-DAQmx tasks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaqError {
    /// The installed driver lacks the named entry point.
    #[error("The NI-DAQmx driver does not support the function '{function}'. Install a newer version of NI-DAQmx.")]
    UnsupportedByDriver { function: String },

    /// The driver shared library could not be located or loaded.
    #[error("Could not load the NI-DAQmx driver: {message}")]
    DriverNotFound { message: String },

    /// The task has been closed.
    #[error("Task '{task_name}' has already been closed; its handle is no longer valid.")]
    InvalidHandle { task_name: String },

    /// A task with the same name already exists in the session.
    #[error("A task named '{task_name}' already exists in this session.")]
    DuplicateTask { task_name: String },

    /// A caller array does not have the element type the operation requires.
    #[error("{message}")]
    TypeError { message: String },

    #[error("{message}{}\n\nStatus Code: {}", task_suffix(.task_name), ErrorCode::ReadBufferTooSmall)]
    ReadBufferTooSmall { message: String, task_name: Option<String> },

    #[error("{message}{}\n\nStatus Code: {}", task_suffix(.task_name), ErrorCode::WriteBufferTooSmall)]
    WriteBufferTooSmall { message: String, task_name: Option<String> },

    #[error("{message}{}\n\nStatus Code: {}", task_suffix(.task_name), ErrorCode::MismatchedInputArraySizes)]
    MismatchedInputArraySizes { message: String, task_name: Option<String> },

    /// A feature toggle required by the operation is disabled.
    #[error("The '{feature}' feature is not supported in this configuration. Set the environment variable {env_var}=1 to enable it.")]
    FeatureNotSupported { feature: String, env_var: String },

    /// Any other negative driver status, with the driver's diagnostic text.
    #[error("{message}{}\n\nStatus Code: {code}", task_suffix(.task_name))]
    Driver {
        code: ErrorCode,
        message: String,
        task_name: Option<String>,
    },

    /// A positive driver status promoted to an error.
    #[error("{message}\n\nStatus Code: {code}")]
    DriverWarning { code: i32, message: String },

    /// The requested samples were not transferred in time.
    #[error("{message}{}\n\nSamples transferred before the timeout: {samples_transferred}\n\nStatus Code: {code}", task_suffix(.task_name))]
    Timeout {
        code: ErrorCode,
        message: String,
        samples_transferred: usize,
        task_name: Option<String>,
    },
}

impl DaqError {
    /// Builds the error for a negative driver status.
    pub fn from_status(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match ErrorCode::from(code) {
            ErrorCode::InvalidTask => DaqError::InvalidHandle { task_name: String::new() },
            ErrorCode::DuplicateTask => DaqError::DuplicateTask { task_name: String::new() },
            ErrorCode::ReadBufferTooSmall => DaqError::ReadBufferTooSmall { message, task_name: None },
            ErrorCode::WriteBufferTooSmall => DaqError::WriteBufferTooSmall { message, task_name: None },
            ErrorCode::MismatchedInputArraySizes => DaqError::MismatchedInputArraySizes { message, task_name: None },
            code if code.is_timeout() => DaqError::Timeout {
                code,
                message,
                samples_transferred: 0,
                task_name: None,
            },
            code => DaqError::Driver {
                code,
                message,
                task_name: None,
            },
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        DaqError::TypeError { message: message.into() }
    }

    pub fn read_buffer_too_small(message: impl Into<String>) -> Self {
        DaqError::ReadBufferTooSmall {
            message: message.into(),
            task_name: None,
        }
    }

    pub fn mismatched_sizes(message: impl Into<String>) -> Self {
        DaqError::MismatchedInputArraySizes {
            message: message.into(),
            task_name: None,
        }
    }

    /// Status code associated with this error kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            DaqError::InvalidHandle { .. } => ErrorCode::InvalidTask,
            DaqError::DuplicateTask { .. } => ErrorCode::DuplicateTask,
            DaqError::ReadBufferTooSmall { .. } => ErrorCode::ReadBufferTooSmall,
            DaqError::WriteBufferTooSmall { .. } => ErrorCode::WriteBufferTooSmall,
            DaqError::MismatchedInputArraySizes { .. } => ErrorCode::MismatchedInputArraySizes,
            DaqError::Driver { code, .. } | DaqError::Timeout { code, .. } => *code,
            DaqError::DriverWarning { code, .. } => ErrorCode::from(*code),
            DaqError::UnsupportedByDriver { .. }
            | DaqError::DriverNotFound { .. }
            | DaqError::TypeError { .. }
            | DaqError::FeatureNotSupported { .. } => ErrorCode::Unknown,
        }
    }

    pub fn task_name(&self) -> Option<&str> {
        match self {
            DaqError::InvalidHandle { task_name } | DaqError::DuplicateTask { task_name } => Some(task_name),
            DaqError::ReadBufferTooSmall { task_name, .. }
            | DaqError::WriteBufferTooSmall { task_name, .. }
            | DaqError::MismatchedInputArraySizes { task_name, .. }
            | DaqError::Driver { task_name, .. }
            | DaqError::Timeout { task_name, .. } => task_name.as_deref(),
            _ => None,
        }
    }

    /// Attaches `name` to errors that carry a task name and do not have one yet.
    pub fn with_task_name(mut self, name: &str) -> Self {
        match &mut self {
            DaqError::InvalidHandle { task_name } | DaqError::DuplicateTask { task_name } => {
                if task_name.is_empty() {
                    *task_name = name.to_string();
                }
            }
            DaqError::ReadBufferTooSmall { task_name, .. }
            | DaqError::WriteBufferTooSmall { task_name, .. }
            | DaqError::MismatchedInputArraySizes { task_name, .. }
            | DaqError::Driver { task_name, .. }
            | DaqError::Timeout { task_name, .. } => {
                if task_name.is_none() {
                    *task_name = Some(name.to_string());
                }
            }
            _ => {}
        }
        self
    }

    /// Records how many samples per channel were transferred before a timeout.
    pub fn with_samples_transferred(mut self, samples: usize) -> Self {
        if let DaqError::Timeout { samples_transferred, .. } = &mut self {
            *samples_transferred = samples;
        }
        self
    }
}

impl From<NulError> for DaqError {
    fn from(value: NulError) -> Self {
        DaqError::type_error(format!(
            "Strings passed to NI-DAQmx must not contain NUL bytes (found one at position {})",
            value.nul_position()
        ))
    }
}

impl From<WaveformError> for DaqError {
    fn from(err: WaveformError) -> Self {
        match err {
            WaveformError::InsufficientCapacity { .. } | WaveformError::SampleCountOutOfRange { .. } => {
                DaqError::read_buffer_too_small(err.to_string())
            }
            WaveformError::SignalCountMismatch { .. } => DaqError::mismatched_sizes(err.to_string()),
        }
    }
}

/// A positive driver status: the operation succeeded but the driver reported a condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaqWarning {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for DaqWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning {} occurred.\n\n{}", self.code, self.message)
    }
}

impl From<DaqWarning> for DaqError {
    fn from(warning: DaqWarning) -> Self {
        DaqError::DriverWarning {
            code: warning.code,
            message: warning.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_named_kinds() {
        assert!(matches!(DaqError::from_status(-200229, "small"), DaqError::ReadBufferTooSmall { .. }));
        assert!(matches!(DaqError::from_status(-200089, ""), DaqError::DuplicateTask { .. }));
        assert!(matches!(DaqError::from_status(-200088, ""), DaqError::InvalidHandle { .. }));
        assert!(matches!(DaqError::from_status(-200284, "late"), DaqError::Timeout { .. }));
        let err = DaqError::from_status(-201003, "device cannot be accessed");
        assert_eq!(err.code(), ErrorCode::Other(-201003));
        assert_eq!(err.code().code(), -201003);
    }

    #[test]
    fn task_name_is_attached_once() {
        let err = DaqError::from_status(-200077, "bad value")
            .with_task_name("first")
            .with_task_name("second");
        assert_eq!(err.task_name(), Some("first"));
        let text = err.to_string();
        assert!(text.contains("bad value"));
        assert!(text.contains("Task Name: first"));
        assert!(text.contains("Status Code: -200077"));
    }

    #[test]
    fn timeout_reports_samples_transferred() {
        let err = DaqError::from_status(-200474, "timed out").with_samples_transferred(7);
        assert!(err.to_string().contains("Samples transferred before the timeout: 7"));
    }

    #[test]
    fn waveform_capacity_maps_to_read_buffer_too_small() {
        let err: DaqError = WaveformError::InsufficientCapacity {
            required: 10,
            available: 9,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ReadBufferTooSmall);
    }
}
