use std::error::Error;
use std::fmt;

/// Errors raised by template loading and expansion.
///
/// Only authoring mistakes are errors. Reference-resolution misses resolve to
/// "no match" and placement failures degrade to a fallback point, so neither
/// appears here.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// A culture spec with neither `inherit` nor `fixed`.
    InvalidCultureSpec { template: String, rule: usize },
    /// A count range with `min > max`.
    InvalidCountRange {
        template: String,
        rule: usize,
        min: u32,
        max: u32,
    },
    /// Two templates in one library share an id.
    DuplicateTemplateId { id: String },
    /// A template document failed to parse.
    Parse { message: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::InvalidCultureSpec { template, rule } => write!(
                f,
                "template {template:?} creation rule {rule}: culture spec needs `inherit` or `fixed`"
            ),
            TemplateError::InvalidCountRange {
                template,
                rule,
                min,
                max,
            } => write!(
                f,
                "template {template:?} creation rule {rule}: count range {min}..={max} is inverted"
            ),
            TemplateError::DuplicateTemplateId { id } => {
                write!(f, "duplicate template id {id:?}")
            }
            TemplateError::Parse { message } => write!(f, "template parse error: {message}"),
        }
    }
}

impl Error for TemplateError {}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::Parse {
            message: err.to_string(),
        }
    }
}
