//! Header decoding.
//!
//! A header struct lists its fields once in [`FromHeaders::header_fields`];
//! the resulting [`HeaderSchema`] decodes a [`HeaderMap`] into a fresh value.
//! Decoding is all-or-nothing: any failing field fails the whole struct.
//!
//! ```rust
//! use axum_bind::{FromHeaders, HeaderFields, bind_header};
//! use http::HeaderMap;
//! use std::time::Duration;
//!
//! #[derive(Debug, Default)]
//! struct Client {
//!     version: u32,
//!     debug: bool,
//!     budget: Duration,
//! }
//!
//! impl FromHeaders for Client {
//!     fn header_fields(fields: &mut HeaderFields<Self>) {
//!         fields.field("x-app-version", |c: &mut Self| &mut c.version).required();
//!         fields.field("x-debug", |c: &mut Self| &mut c.debug);
//!         fields.field("x-budget", |c: &mut Self| &mut c.budget);
//!     }
//! }
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-app-version", "42".parse().unwrap());
//! headers.insert("x-budget", "1m 30s".parse().unwrap());
//!
//! let mut client = Client::default();
//! bind_header(&headers, &mut client).unwrap();
//! assert_eq!(client.version, 42);
//! assert!(!client.debug);
//! assert_eq!(client.budget, Duration::from_secs(90));
//! ```

use {
    crate::{BoxError, Error, ErrorKind},
    chrono::{
        DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    },
    chrono_tz::Tz,
    http::{HeaderMap, HeaderName},
    serde::de::DeserializeOwned,
    std::{str::FromStr, sync::Arc, time::Duration},
    thiserror::Error,
};

/// A struct whose fields are read from request headers.
pub trait FromHeaders: Default + Send + 'static {
    fn header_fields(fields: &mut HeaderFields<Self>);
}

/// Errors raised while decoding headers.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("header `{name}` is required")]
    Missing { name: String },

    #[error("header `{name}` is not visible ASCII")]
    NotText { name: String },

    #[error("header `{name}` has invalid value {value:?}: {source}")]
    Invalid {
        name: String,
        value: String,
        #[source]
        source: BoxError,
    },
}

/// Zone attached to timestamps whose format carries no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
    /// IANA zone such as `Asia/Kolkata`; the offset follows its DST rules.
    Named(Tz),
}

impl Zone {
    fn attach(self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>, BoxError> {
        let ambiguous = || BoxError::from(format!("local time {naive} is ambiguous or skipped"));
        match self {
            Zone::Utc => Ok(Utc.from_utc_datetime(&naive).fixed_offset()),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).single().ok_or_else(ambiguous),
            Zone::Local => Local
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.fixed_offset())
                .ok_or_else(ambiguous),
            Zone::Named(tz) => tz
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.fixed_offset())
                .ok_or_else(ambiguous),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Accepts `UTC`, `Local`, a fixed offset such as `+08:00` or `-0530`,
    /// or an IANA zone name such as `America/New_York`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UTC" | "utc" | "Z" => Ok(Zone::Utc),
            "Local" | "local" => Ok(Zone::Local),
            location => match location.parse::<FixedOffset>() {
                Ok(offset) => Ok(Zone::Fixed(offset)),
                Err(_) => location
                    .parse::<Tz>()
                    .map(Zone::Named)
                    .map_err(|_| format!("unknown time location `{location}`")),
            },
        }
    }
}

/// Per-field timestamp options.
#[derive(Debug, Clone, Default)]
pub struct TimeOptions {
    format: Option<String>,
    utc: bool,
    location: Option<Zone>,
}

impl TimeOptions {
    /// chrono strftime format; RFC 3339 when unset.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Zone for offset-less formats: the location, else UTC when requested,
    /// else the local zone.
    pub fn zone(&self) -> Zone {
        match (self.location, self.utc) {
            (Some(zone), _) => zone,
            (None, true) => Zone::Utc,
            (None, false) => Zone::Local,
        }
    }
}

/// Parses a timestamp. Without a format the value must be RFC 3339. With a
/// format, values carrying an offset keep it; others are placed in
/// [`TimeOptions::zone`]. Date-only formats resolve to midnight.
pub fn parse_timestamp(value: &str, options: &TimeOptions) -> Result<DateTime<FixedOffset>, BoxError> {
    let Some(format) = options.format() else {
        return Ok(DateTime::parse_from_rfc3339(value)?);
    };
    if let Ok(datetime) = DateTime::parse_from_str(value, format) {
        return Ok(datetime);
    }
    let naive = match NaiveDateTime::parse_from_str(value, format) {
        Ok(naive) => naive,
        Err(_) => NaiveDate::parse_from_str(value, format)?.and_time(NaiveTime::MIN),
    };
    options.zone().attach(naive)
}

/// A scalar decodable from a single header value.
///
/// Missing headers are presented as an empty string; most types decode it to
/// their zero value.
pub trait FromHeaderValue: Sized {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError>;
}

macro_rules! from_header_number {
    ($($ty:ty),*) => {
        $(
            impl FromHeaderValue for $ty {
                fn from_header_value(value: &str, _: &TimeOptions) -> Result<Self, BoxError> {
                    if value.is_empty() {
                        return Ok(<$ty>::default());
                    }
                    Ok(value.parse::<$ty>()?)
                }
            }
        )*
    };
}

from_header_number!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl FromHeaderValue for bool {
    fn from_header_value(value: &str, _: &TimeOptions) -> Result<Self, BoxError> {
        match value {
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            other => Err(format!("`{other}` is not a boolean").into()),
        }
    }
}

impl FromHeaderValue for String {
    fn from_header_value(value: &str, _: &TimeOptions) -> Result<Self, BoxError> {
        Ok(value.to_string())
    }
}

/// An empty value is zero; mark the field `required` to reject it.
impl FromHeaderValue for Duration {
    fn from_header_value(value: &str, _: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(Duration::ZERO);
        }
        Ok(humantime::parse_duration(value)?)
    }
}

impl FromHeaderValue for DateTime<FixedOffset> {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        parse_timestamp(value, options)
    }
}

impl FromHeaderValue for DateTime<Utc> {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Ok(parse_timestamp(value, options)?.with_timezone(&Utc))
    }
}

impl FromHeaderValue for DateTime<Local> {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Ok(parse_timestamp(value, options)?.with_timezone(&Local))
    }
}

impl FromHeaderValue for NaiveDateTime {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Ok(parse_timestamp(value, options)?.naive_local())
    }
}

impl<T: FromHeaderValue> FromHeaderValue for Option<T> {
    fn from_header_value(value: &str, options: &TimeOptions) -> Result<Self, BoxError> {
        if value.is_empty() {
            return Ok(None);
        }
        T::from_header_value(value, options).map(Some)
    }
}

type HeaderDecode<T> = Arc<dyn Fn(&mut T, &str, &TimeOptions) -> Result<(), BoxError> + Send + Sync>;

struct HeaderField<T> {
    /// `None` for skipped fields.
    name: Option<HeaderName>,
    required: bool,
    time: TimeOptions,
    decode: HeaderDecode<T>,
}

/// Registration-time list of the header fields of `T`.
pub struct HeaderFields<T> {
    fields: Vec<HeaderField<T>>,
    issues: Vec<String>,
}

/// Options of the field just registered.
pub struct HeaderFieldEntry<'a, T> {
    fields: &'a mut HeaderFields<T>,
    index: usize,
}

impl<T: 'static> HeaderFields<T> {
    fn new() -> Self {
        HeaderFields {
            fields: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Reads header `name` into a scalar field. A name of `-` skips the field.
    pub fn field<V, F>(&mut self, name: &str, accessor: F) -> HeaderFieldEntry<'_, T>
    where
        V: FromHeaderValue + 'static,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let decode: HeaderDecode<T> = Arc::new(
            move |target: &mut T, raw: &str, options: &TimeOptions| -> Result<(), BoxError> {
                *accessor(target) = V::from_header_value(raw, options)?;
                Ok(())
            },
        );
        self.push(name, decode)
    }

    /// Reads header `name` as JSON text into a composite field.
    pub fn json<V, F>(&mut self, name: &str, accessor: F) -> HeaderFieldEntry<'_, T>
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let decode: HeaderDecode<T> = Arc::new(
            move |target: &mut T, raw: &str, _: &TimeOptions| -> Result<(), BoxError> {
                *accessor(target) = serde_json::from_str::<V>(raw)?;
                Ok(())
            },
        );
        self.push(name, decode)
    }

    /// Flattens the header fields of a nested struct into this one.
    pub fn embed<E, F>(&mut self, accessor: F) -> &mut Self
    where
        E: FromHeaders,
        F: Fn(&mut T) -> &mut E + Send + Sync + 'static,
    {
        let mut inner = HeaderFields::<E>::new();
        E::header_fields(&mut inner);
        self.issues.extend(inner.issues);

        let accessor = Arc::new(accessor);
        for field in inner.fields {
            let accessor = Arc::clone(&accessor);
            let decode = field.decode;
            self.fields.push(HeaderField {
                name: field.name,
                required: field.required,
                time: field.time,
                decode: Arc::new(
                    move |target: &mut T, raw: &str, options: &TimeOptions| {
                        (*decode)((*accessor)(target), raw, options)
                    },
                ),
            });
        }
        self
    }

    fn push(&mut self, name: &str, decode: HeaderDecode<T>) -> HeaderFieldEntry<'_, T> {
        let name = match name {
            "-" => None,
            name => match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) => Some(header),
                Err(_) => {
                    self.issues.push(format!("`{name}` is not a valid header name"));
                    None
                }
            },
        };
        self.fields.push(HeaderField {
            name,
            required: false,
            time: TimeOptions::default(),
            decode,
        });
        let index = self.fields.len() - 1;
        HeaderFieldEntry {
            fields: self,
            index,
        }
    }
}

impl<T> HeaderFieldEntry<'_, T> {
    fn options(&mut self) -> &mut HeaderField<T> {
        &mut self.fields.fields[self.index]
    }

    /// Rejects a missing or empty value.
    pub fn required(mut self) -> Self {
        self.options().required = true;
        self
    }

    /// chrono strftime format of a timestamp field.
    pub fn time_format(mut self, format: impl Into<String>) -> Self {
        self.options().time.format = Some(format.into());
        self
    }

    /// Interprets offset-less timestamps as UTC.
    pub fn time_utc(mut self) -> Self {
        self.options().time.utc = true;
        self
    }

    /// Interprets offset-less timestamps in `location`: `UTC`, `Local`, a
    /// fixed offset like `+08:00` or an IANA name like `Asia/Kolkata`.
    pub fn time_location(mut self, location: &str) -> Self {
        match location.parse::<Zone>() {
            Ok(zone) => self.options().time.location = Some(zone),
            Err(reason) => self.fields.issues.push(reason),
        }
        self
    }
}

/// Validated header layout of `T`, built once and shared by all requests.
pub struct HeaderSchema<T> {
    fields: Arc<[HeaderField<T>]>,
}

impl<T> Clone for HeaderSchema<T> {
    fn clone(&self) -> Self {
        HeaderSchema {
            fields: Arc::clone(&self.fields),
        }
    }
}

impl<T: FromHeaders> HeaderSchema<T> {
    /// Builds the schema, returning every registration problem.
    pub fn new() -> Result<Self, Vec<String>> {
        let (schema, issues) = Self::build();
        if issues.is_empty() {
            Ok(schema)
        } else {
            Err(issues)
        }
    }

    pub(crate) fn build() -> (Self, Vec<String>) {
        let mut fields = HeaderFields::<T>::new();
        T::header_fields(&mut fields);
        let schema = HeaderSchema {
            fields: fields.fields.into(),
        };
        (schema, fields.issues)
    }

    /// Names of the headers read, in declaration order.
    pub fn header_names(&self) -> impl Iterator<Item = &HeaderName> {
        self.fields.iter().filter_map(|field| field.name.as_ref())
    }

    /// Decodes `headers` into a fresh `T`.
    pub fn decode(&self, headers: &HeaderMap) -> Result<T, HeaderError> {
        let mut value = T::default();
        for field in self.fields.iter() {
            let Some(name) = &field.name else {
                continue;
            };
            let raw = match headers.get(name) {
                None => "",
                Some(raw) => raw.to_str().map_err(|_| HeaderError::NotText {
                    name: name.to_string(),
                })?,
            };
            if field.required && raw.is_empty() {
                return Err(HeaderError::Missing {
                    name: name.to_string(),
                });
            }
            (*field.decode)(&mut value, raw, &field.time).map_err(|source| {
                HeaderError::Invalid {
                    name: name.to_string(),
                    value: raw.to_string(),
                    source,
                }
            })?;
        }
        Ok(value)
    }
}

/// Decodes `headers` into `dst`.
///
/// On failure `dst` is reset to `T::default()`; it is never left partially
/// populated.
pub fn bind_header<T: FromHeaders>(headers: &HeaderMap, dst: &mut T) -> crate::Result<()> {
    let schema = HeaderSchema::<T>::new()
        .map_err(|issues| Error::registration(issues.join("; ")))?;
    match schema.decode(headers) {
        Ok(value) => {
            *dst = value;
            Ok(())
        }
        Err(err) => {
            *dst = T::default();
            Err(Error::new(ErrorKind::InvalidInput, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde::Deserialize;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Device {
        os: String,
        build: u32,
    }

    #[derive(Debug, Default)]
    struct Common {
        trace: String,
    }

    impl FromHeaders for Common {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields.field("x-trace", |c: &mut Self| &mut c.trace);
        }
    }

    #[derive(Debug, Default)]
    struct AppHeaders {
        common: Common,
        version: i64,
        small: u8,
        ratio: f64,
        debug: bool,
        name: String,
        timeout: Duration,
        nickname: Option<String>,
        device: Device,
        skipped: String,
    }

    impl FromHeaders for AppHeaders {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields.embed(|h: &mut Self| &mut h.common);
            fields.field("x-version", |h: &mut Self| &mut h.version);
            fields.field("x-small", |h: &mut Self| &mut h.small);
            fields.field("x-ratio", |h: &mut Self| &mut h.ratio);
            fields.field("x-debug", |h: &mut Self| &mut h.debug);
            fields.field("x-name", |h: &mut Self| &mut h.name);
            fields.field("x-timeout", |h: &mut Self| &mut h.timeout);
            fields.field("x-nickname", |h: &mut Self| &mut h.nickname);
            fields.json("x-device", |h: &mut Self| &mut h.device);
            fields.field("-", |h: &mut Self| &mut h.skipped);
        }
    }

    fn full_headers() -> Vec<(&'static str, &'static str)> {
        vec![
            ("x-trace", "t-1"),
            ("x-version", "-12"),
            ("x-small", "255"),
            ("x-ratio", "0.25"),
            ("x-debug", "T"),
            ("x-name", "alice"),
            ("x-timeout", "1h30m"),
            ("x-device", r#"{"os":"android","build":7}"#),
            ("-", "ignored"),
        ]
    }

    #[test]
    fn test_decodes_every_supported_type() {
        let schema = HeaderSchema::<AppHeaders>::new().unwrap();
        let decoded = schema.decode(&headers(&full_headers())).unwrap();

        assert_eq!(decoded.common.trace, "t-1");
        assert_eq!(decoded.version, -12);
        assert_eq!(decoded.small, 255);
        assert_eq!(decoded.ratio, 0.25);
        assert!(decoded.debug);
        assert_eq!(decoded.name, "alice");
        assert_eq!(decoded.timeout, Duration::from_secs(5400));
        assert_eq!(decoded.nickname, None);
        assert_eq!(
            decoded.device,
            Device {
                os: "android".into(),
                build: 7
            }
        );
        assert_eq!(decoded.skipped, "");
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let schema = HeaderSchema::<Common>::new().unwrap();
        let decoded = schema.decode(&headers(&[("X-Trace", "upper")])).unwrap();
        assert_eq!(decoded.trace, "upper");
    }

    #[test]
    fn test_missing_scalars_are_zero() {
        let schema = HeaderSchema::<Common>::new().unwrap();
        let decoded = schema.decode(&HeaderMap::new()).unwrap();
        assert_eq!(decoded.trace, "");

        assert_eq!(i32::from_header_value("", &TimeOptions::default()).unwrap(), 0);
        assert!(!bool::from_header_value("", &TimeOptions::default()).unwrap());
        assert_eq!(f32::from_header_value("", &TimeOptions::default()).unwrap(), 0.0);
        assert_eq!(
            Duration::from_header_value("", &TimeOptions::default()).unwrap(),
            Duration::ZERO
        );
    }

    #[derive(Debug, Default)]
    struct Budget {
        budget: Duration,
    }

    impl FromHeaders for Budget {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields
                .field("x-budget", |b: &mut Self| &mut b.budget)
                .required();
        }
    }

    #[test]
    fn test_required_duration_rejects_empty() {
        let schema = HeaderSchema::<Budget>::new().unwrap();
        assert!(matches!(
            schema.decode(&HeaderMap::new()),
            Err(HeaderError::Missing { ref name }) if name == "x-budget"
        ));
        assert!(matches!(
            schema.decode(&headers(&[("x-budget", "soon")])),
            Err(HeaderError::Invalid { .. })
        ));
        let decoded = schema.decode(&headers(&[("x-budget", "1m 30s")])).unwrap();
        assert_eq!(decoded.budget, Duration::from_secs(90));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut pairs = full_headers();
        pairs.retain(|(name, _)| *name != "x-small");
        pairs.push(("x-small", "256"));

        let err = HeaderSchema::<AppHeaders>::new()
            .unwrap()
            .decode(&headers(&pairs))
            .unwrap_err();
        assert!(matches!(err, HeaderError::Invalid { ref name, .. } if name == "x-small"));
    }

    #[test]
    fn test_bool_literals() {
        let opts = TimeOptions::default();
        for truthy in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(bool::from_header_value(truthy, &opts).unwrap(), "{truthy}");
        }
        for falsy in ["0", "f", "F", "false", "FALSE", "False"] {
            assert!(!bool::from_header_value(falsy, &opts).unwrap(), "{falsy}");
        }
        assert!(bool::from_header_value("yes", &opts).is_err());
    }

    #[test]
    fn test_empty_json_header_is_an_error() {
        let mut pairs = full_headers();
        pairs.retain(|(name, _)| *name != "x-device");

        let err = HeaderSchema::<AppHeaders>::new()
            .unwrap()
            .decode(&headers(&pairs))
            .unwrap_err();
        assert!(err.to_string().contains("x-device"));
    }

    #[test]
    fn test_bind_header_resets_destination_on_error() {
        let mut dst = AppHeaders {
            version: 99,
            name: "stale".into(),
            ..AppHeaders::default()
        };

        let mut pairs = full_headers();
        pairs.retain(|(name, _)| *name != "x-timeout");
        pairs.push(("x-timeout", "soon"));

        let err = bind_header(&headers(&pairs), &mut dst).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(dst.version, 0, "fields decoded before the failure are discarded");
        assert_eq!(dst.name, "");
        assert_eq!(dst.common.trace, "");
    }

    #[test]
    fn test_bind_header_overwrites_on_success() {
        let mut dst = AppHeaders::default();
        bind_header(&headers(&full_headers()), &mut dst).unwrap();
        assert_eq!(dst.version, -12);
    }

    #[derive(Debug, Default)]
    struct Auth {
        token: String,
    }

    impl FromHeaders for Auth {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields
                .field("authorization", |a: &mut Self| &mut a.token)
                .required();
        }
    }

    #[test]
    fn test_required_header() {
        let schema = HeaderSchema::<Auth>::new().unwrap();
        let err = schema.decode(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "header `authorization` is required");

        let ok = schema.decode(&headers(&[("authorization", "Bearer x")])).unwrap();
        assert_eq!(ok.token, "Bearer x");
    }

    #[test]
    fn test_non_ascii_value_is_rejected() {
        let schema = HeaderSchema::<Auth>::new().unwrap();
        let mut map = HeaderMap::new();
        map.insert(
            "authorization",
            http::HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap(),
        );
        assert!(matches!(
            schema.decode(&map),
            Err(HeaderError::NotText { .. })
        ));
    }

    #[derive(Debug, Default)]
    struct Times {
        default_format: DateTime<FixedOffset>,
        utc_day: DateTime<Utc>,
        shanghai: DateTime<FixedOffset>,
        naive: NaiveDateTime,
        with_offset: DateTime<FixedOffset>,
    }

    impl FromHeaders for Times {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields.field("x-default", |t: &mut Self| &mut t.default_format);
            fields
                .field("x-utc-day", |t: &mut Self| &mut t.utc_day)
                .time_format("%Y-%m-%d")
                .time_utc();
            fields
                .field("x-shanghai", |t: &mut Self| &mut t.shanghai)
                .time_format("%Y-%m-%d %H:%M:%S")
                .time_utc()
                .time_location("+08:00");
            fields
                .field("x-naive", |t: &mut Self| &mut t.naive)
                .time_format("%d/%m/%Y %H:%M")
                .time_location("UTC");
            fields
                .field("x-with-offset", |t: &mut Self| &mut t.with_offset)
                .time_format("%Y-%m-%d %H:%M:%S %z");
        }
    }

    #[test]
    fn test_timestamps() {
        let schema = HeaderSchema::<Times>::new().unwrap();
        let decoded = schema
            .decode(&headers(&[
                ("x-default", "2024-03-01T10:20:30+02:00"),
                ("x-utc-day", "2024-03-01"),
                ("x-shanghai", "2024-03-01 08:00:00"),
                ("x-naive", "05/06/2023 14:45"),
                ("x-with-offset", "2024-03-01 10:00:00 -0500"),
            ]))
            .unwrap();

        assert_eq!(decoded.default_format.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(decoded.default_format.hour(), 10);

        assert_eq!(decoded.utc_day.day(), 1);
        assert_eq!(decoded.utc_day.hour(), 0);

        // location wins over the utc flag
        assert_eq!(decoded.shanghai.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(decoded.shanghai.with_timezone(&Utc).hour(), 0);

        assert_eq!(decoded.naive.month(), 6);
        assert_eq!(decoded.naive.minute(), 45);

        assert_eq!(decoded.with_offset.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_empty_timestamp_is_default() {
        let schema = HeaderSchema::<Times>::new().unwrap();
        let decoded = schema.decode(&HeaderMap::new()).unwrap();
        assert_eq!(decoded.utc_day, DateTime::<Utc>::default());
        assert_eq!(decoded.naive, NaiveDateTime::default());
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let schema = HeaderSchema::<Times>::new().unwrap();
        assert!(schema.decode(&headers(&[("x-default", "yesterday")])).is_err());
    }

    #[derive(Debug, Default)]
    struct Broken {
        at: DateTime<Utc>,
        other: String,
    }

    impl FromHeaders for Broken {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields
                .field("x-at", |b: &mut Self| &mut b.at)
                .time_location("Mars/Olympus");
            fields.field("bad header", |b: &mut Self| &mut b.other);
        }
    }

    #[test]
    fn test_registration_issues_are_collected() {
        let issues = HeaderSchema::<Broken>::new().err().unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("Mars/Olympus"));
        assert!(issues[1].contains("bad header"));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Utc);
        assert_eq!("Local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!(
            "-05:30".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!(
            "Asia/Shanghai".parse::<Zone>().unwrap(),
            Zone::Named(chrono_tz::Asia::Shanghai)
        );
        assert!("Mars/Olympus".parse::<Zone>().is_err());
    }

    #[derive(Debug, Default)]
    struct Zoned {
        kolkata: DateTime<FixedOffset>,
        new_york_summer: DateTime<FixedOffset>,
        new_york_winter: DateTime<FixedOffset>,
        skipped: DateTime<FixedOffset>,
    }

    impl FromHeaders for Zoned {
        fn header_fields(fields: &mut HeaderFields<Self>) {
            fields
                .field("x-kolkata", |z: &mut Self| &mut z.kolkata)
                .time_format("%Y-%m-%d %H:%M:%S")
                .time_location("Asia/Kolkata");
            fields
                .field("x-ny-summer", |z: &mut Self| &mut z.new_york_summer)
                .time_format("%Y-%m-%d %H:%M:%S")
                .time_location("America/New_York");
            fields
                .field("x-ny-winter", |z: &mut Self| &mut z.new_york_winter)
                .time_format("%Y-%m-%d %H:%M:%S")
                .time_location("America/New_York");
            fields
                .field("x-skipped", |z: &mut Self| &mut z.skipped)
                .time_format("%Y-%m-%d %H:%M:%S")
                .time_location("America/New_York");
        }
    }

    #[test]
    fn test_named_zones_follow_dst() {
        let schema = HeaderSchema::<Zoned>::new().unwrap();
        let decoded = schema
            .decode(&headers(&[
                ("x-kolkata", "2024-03-01 12:00:00"),
                ("x-ny-summer", "2024-07-01 12:00:00"),
                ("x-ny-winter", "2024-01-15 12:00:00"),
            ]))
            .unwrap();

        assert_eq!(decoded.kolkata.offset().local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(decoded.kolkata.with_timezone(&Utc).hour(), 6);
        assert_eq!(decoded.kolkata.with_timezone(&Utc).minute(), 30);
        assert_eq!(decoded.new_york_summer.offset().local_minus_utc(), -4 * 3600);
        assert_eq!(decoded.new_york_winter.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(decoded.skipped, DateTime::<FixedOffset>::default());
    }

    #[test]
    fn test_skipped_local_time_is_an_error() {
        let schema = HeaderSchema::<Zoned>::new().unwrap();
        // clocks jump from 02:00 to 03:00 on this day
        let result = schema.decode(&headers(&[("x-skipped", "2024-03-10 02:30:00")]));
        assert!(matches!(result, Err(HeaderError::Invalid { .. })));
    }
}
