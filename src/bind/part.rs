use std::fmt;

/// A logical section of an HTTP request that a request field binds to.
///
/// Variants are declared in decode order, so sorting by `Part` yields the
/// order in which a request is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    /// JSON request body.
    Body,
    /// URL query string.
    Query,
    /// Path parameters of the matched route.
    Uri,
    /// Request headers.
    Header,
    /// Request-scoped metadata set by upstream middleware.
    Meta,
    /// The raw request context.
    Context,
}

impl Part {
    /// All parts in decode order.
    pub const ALL: [Part; 6] = [
        Part::Body,
        Part::Query,
        Part::Uri,
        Part::Header,
        Part::Meta,
        Part::Context,
    ];

    /// Canonical field name of the part.
    pub fn field_name(self) -> &'static str {
        match self {
            Part::Body => "Body",
            Part::Query => "Query",
            Part::Uri => "Uri",
            Part::Header => "Header",
            Part::Meta => "Meta",
            Part::Context => "Context",
        }
    }

    /// Classifies a field name, ignoring ASCII case.
    pub fn from_field_name(name: &str) -> Option<Part> {
        Part::ALL
            .into_iter()
            .find(|part| part.field_name().eq_ignore_ascii_case(name))
    }

    /// Whether decoding this part can fail for a well-formed layout.
    pub fn can_fail(self) -> bool {
        !matches!(self, Part::Meta | Part::Context)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Part::Body => "body",
            Part::Query => "query",
            Part::Uri => "uri",
            Part::Header => "header",
            Part::Meta => "meta",
            Part::Context => "context",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_order_is_declaration_order() {
        let mut parts = vec![Part::Context, Part::Header, Part::Body, Part::Meta, Part::Uri, Part::Query];
        parts.sort();
        assert_eq!(parts, Part::ALL.to_vec());
    }

    #[test]
    fn test_from_field_name() {
        assert_eq!(Part::from_field_name("Body"), Some(Part::Body));
        assert_eq!(Part::from_field_name("header"), Some(Part::Header));
        assert_eq!(Part::from_field_name("CONTEXT"), Some(Part::Context));
        assert_eq!(Part::from_field_name("Cookie"), None);
        assert_eq!(Part::from_field_name(""), None);
    }

    #[test]
    fn test_only_meta_and_context_never_fail() {
        let infallible: Vec<_> = Part::ALL.into_iter().filter(|p| !p.can_fail()).collect();
        assert_eq!(infallible, vec![Part::Meta, Part::Context]);
    }
}
