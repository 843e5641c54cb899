use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Interval units must be greater than 0, got {0}")]
    NonPositiveInterval(i32),

    #[error("An undefined frequency cannot be evaluated; specify a frequency before evaluating the recurrence")]
    UndefinedFrequency,

    #[error("'{0}' is not a recognized time zone")]
    UnrecognizedTimeZone(String),

    #[error("Cannot compare a date/time against an absent value")]
    IncomparableInstants,

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid local time: {0}")]
    InvalidLocalTime(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
