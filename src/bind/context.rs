use {
    crate::{Meta, code::lang, utils},
    bytes::Bytes,
    http::{Extensions, HeaderMap, Method, Uri, Version, request::Parts},
};

/// Request context handed to every bound handler as its first argument.
///
/// It is a snapshot of the request head taken after the request fields were
/// decoded. [`Context::body`] is only present when the body was not consumed
/// by a `body` field, or was bound with `reuse_body`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: Option<Bytes>,
}

impl Context {
    pub(crate) fn from_parts(parts: &Parts, body: Option<Bytes>) -> Self {
        Context {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
            extensions: parts.extensions.clone(),
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Typed request extension, e.g. state inserted by upstream middleware.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Buffered request body, when still available.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The `x-request-id` of the request.
    pub fn request_id(&self) -> Option<&str> {
        utils::request_id(&self.headers)
    }

    /// The language the client asked for.
    pub fn language(&self) -> Option<&str> {
        lang::request_language(&self.headers)
    }

    /// The metadata bag set by upstream middleware.
    pub fn meta(&self) -> Option<&Meta> {
        self.extensions.get::<Meta>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetaExt;

    #[test]
    fn test_from_parts_snapshot() {
        let mut request = http::Request::builder()
            .method(Method::POST)
            .uri("/orders/7?x=1")
            .header("x-request-id", "rid-7")
            .header("accept-language", "hi-IN")
            .body(())
            .unwrap();
        request.meta_mut().set("user", 3);
        let (parts, ()) = request.into_parts();

        let ctx = Context::from_parts(&parts, Some(Bytes::from_static(b"{}")));
        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.uri().path(), "/orders/7");
        assert_eq!(ctx.request_id(), Some("rid-7"));
        assert_eq!(ctx.language(), Some("hi-IN"));
        assert_eq!(ctx.meta().unwrap().must_get("user"), 3);
        assert_eq!(ctx.body().unwrap().as_ref(), b"{}");
    }

    #[test]
    fn test_default_is_empty() {
        let ctx = Context::default();
        assert_eq!(ctx.method(), &Method::GET);
        assert!(ctx.headers().is_empty());
        assert!(ctx.body().is_none());
        assert!(ctx.request_id().is_none());
        assert!(ctx.meta().is_none());
    }
}
