//! Storable form of a handler result.

use serde::{Deserialize, Serialize};

/// Everything needed to rebuild a handler's response.
///
/// This is the value written to the store. The HTTP boundary converts the
/// host framework's response into this record and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    #[serde(default)]
    pub body: String,
    /// Response headers in emission order. Repeated names are kept.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Media type of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Template used to render the body, for server-rendered views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    /// Whether the handler produced this result from an error path.
    #[serde(default)]
    pub exception: bool,
}

impl NormalizedResult {
    /// Creates a result with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
            content_type: None,
            template_name: None,
            exception: false,
        }
    }

    /// Creates a `200 OK` result.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Creates a `200 OK` JSON result from a serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::ok(serde_json::to_string(value)?).with_content_type("application/json"))
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the template name.
    #[must_use]
    pub fn with_template(mut self, template_name: impl Into<String>) -> Self {
        self.template_name = Some(template_name.into());
        self
    }

    /// Marks the result as produced by an error path.
    #[must_use]
    pub const fn with_exception(mut self, exception: bool) -> Self {
        self.exception = exception;
        self
    }

    /// Returns the first header value with the given name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the result carries body data.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}
