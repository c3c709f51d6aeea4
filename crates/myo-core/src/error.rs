use thiserror::Error;

pub type MyoResult<T> = Result<T, MyoError>;

/// Parameter validation failures shared by every crate in the workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MyoError {
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
