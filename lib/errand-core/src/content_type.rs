//! Content types and the shorthand aliases accepted by
//! [`PendingResponse::expect_type`](crate::PendingResponse::expect_type).

/// Well-known content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// HTML content type (`text/html`).
    Html,
    /// JSON content type (`application/json`).
    Json,
    /// XML content type (`application/xml`).
    Xml,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::PlainText => "text/plain",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Look up a shorthand alias (`json`, `html`, `form`, ...).
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "text" => Some(Self::PlainText),
            "urlencoded" | "form" | "form-data" => Some(Self::FormUrlEncoded),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve a shorthand alias to its MIME type, or return the value as is.
#[must_use]
pub fn resolve_alias(value: &str) -> &str {
    ContentType::from_alias(value).map_or(value, |content_type| content_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_mime_types() {
        assert_eq!(resolve_alias("html"), "text/html");
        assert_eq!(resolve_alias("json"), "application/json");
        assert_eq!(resolve_alias("xml"), "application/xml");
        assert_eq!(resolve_alias("text"), "text/plain");
        assert_eq!(resolve_alias("urlencoded"), "application/x-www-form-urlencoded");
        assert_eq!(resolve_alias("form"), "application/x-www-form-urlencoded");
        assert_eq!(resolve_alias("form-data"), "application/x-www-form-urlencoded");
    }

    #[test]
    fn unknown_alias_is_passed_through() {
        assert_eq!(resolve_alias("image/png"), "image/png");
        assert_eq!(resolve_alias("JSON"), "JSON");
    }

    #[test]
    fn content_type_display() {
        insta::assert_snapshot!(ContentType::FormUrlEncoded, @"application/x-www-form-urlencoded");
    }
}
