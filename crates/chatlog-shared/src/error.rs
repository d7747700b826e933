use thiserror::Error;

/// Rejections produced while validating input, before any storage access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid sender '{0}': expected 'me' or 'them'")]
    InvalidSender(String),

    #[error("duplicate message id '{0}' in chat")]
    DuplicateMessageId(String),

    #[error("age must be a whole number between 1 and 100")]
    InvalidAge,

    #[error("telephone must be a 10-digit number")]
    InvalidTelephone,

    #[error("email must look like name@domain")]
    InvalidEmail,

    #[error("at least one tech stack entry is required")]
    MissingTechStack,
}
