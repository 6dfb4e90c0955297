use serde::{Deserialize, Serialize};

/// Context snippets longer than this are cut, as pa11y does.
const MAX_CONTEXT_LEN: usize = 255;

/// Issue severity, serialized the way pa11y reports it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Error,
    Warning,
    Notice,
}

impl IssueType {
    /// pa11y's numeric type code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Error => 1,
            Self::Warning => 2,
            Self::Notice => 3,
        }
    }
}

/// One accessibility finding in pa11y's JSON reporter shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub type_code: u8,
    pub message: String,
    /// Truncated outer HTML of the offending element
    pub context: String,
    pub selector: String,
    pub runner: String,
}

impl Issue {
    pub fn new(
        code: impl Into<String>,
        issue_type: IssueType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            issue_type,
            type_code: issue_type.code(),
            message: message.into(),
            context: String::new(),
            selector: String::new(),
            runner: "builtin".to_string(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl AsRef<str>) -> Self {
        self.context = truncate(context.as_ref(), MAX_CONTEXT_LEN);
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

/// Cut `s` to at most `max` bytes on a char boundary, marking the cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
