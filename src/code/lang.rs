//! Languages understood by [`Code`](super::Code) messages and how a request
//! selects one.

use http::{HeaderMap, header::ACCEPT_LANGUAGE};

pub const ENGLISH: &str = "en";
pub const HINDI: &str = "hi-IN";
pub const MARATHI: &str = "mr-IN";
pub const GUJARATI: &str = "gu-IN";
pub const PUNJABI: &str = "pa-IN";
pub const TELUGU: &str = "te-IN";
pub const MALAYALAM: &str = "ml-IN";
pub const TAMIL: &str = "ta-IN";
pub const BENGALI: &str = "bn-IN";
pub const ODIA: &str = "or-IN";
pub const KANNADA: &str = "kn-IN";
pub const ASSAMESE: &str = "as-IN";
pub const BHOJPURI: &str = "bho";
pub const HARYANVI: &str = "Haryanvi";
pub const RAJASTHANI: &str = "raj";
pub const INDONESIAN: &str = "id-ID";
pub const VIETNAMESE: &str = "vi-VN";

/// Header set by first-party clients; it wins over `Accept-Language`.
pub const DEVICE_LANGUAGE: &str = "device-language";

/// The language a request asks for: `Device-Language` first, then
/// `Accept-Language`. Empty values count as absent.
pub fn request_language(headers: &HeaderMap) -> Option<&str> {
    let pick = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    pick(DEVICE_LANGUAGE).or_else(|| pick(ACCEPT_LANGUAGE.as_str()))
}

/// Lookup keys for a raw language value: the value itself, then its first
/// tag with any quality parameter removed (`"hi-IN,en;q=0.8"` → `"hi-IN"`).
pub(crate) fn lookup_keys(raw: &str) -> impl Iterator<Item = &str> {
    let primary = raw
        .split(',')
        .next()
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != raw);
    std::iter::once(raw).chain(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_device_language_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        headers.insert(DEVICE_LANGUAGE, HeaderValue::from_static("hi-IN"));
        assert_eq!(request_language(&headers), Some("hi-IN"));
    }

    #[test]
    fn test_accept_language_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(DEVICE_LANGUAGE, HeaderValue::from_static(""));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ta-IN"));
        assert_eq!(request_language(&headers), Some("ta-IN"));
        assert_eq!(request_language(&HeaderMap::new()), None);
    }

    #[test]
    fn test_lookup_keys() {
        assert_eq!(lookup_keys("en").collect::<Vec<_>>(), vec!["en"]);
        assert_eq!(
            lookup_keys("hi-IN,en;q=0.8").collect::<Vec<_>>(),
            vec!["hi-IN,en;q=0.8", "hi-IN"]
        );
        assert_eq!(
            lookup_keys("bn-IN;q=0.9").collect::<Vec<_>>(),
            vec!["bn-IN;q=0.9", "bn-IN"]
        );
    }
}
