use thiserror::Error;

/// Failure decoding a notification envelope or its nested event payload.
/// Reported per notification; never fatal to the caller.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Empty notification body")]
    EmptyBody,

    #[error("Invalid envelope JSON: {0}")]
    InvalidJson(String),

    #[error("Notification has no usable Message field")]
    MissingMessage,

    #[error("Inner message is not valid JSON: {0}")]
    InvalidInnerJson(String),

    #[error("Event has no mail.messageId")]
    MissingMessageId,
}

/// Failure from the external delivery provider. One send attempt produces at
/// most one of these; retry policy lives with the caller, not here.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider rejected send ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}
