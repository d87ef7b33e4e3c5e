//! Result codes and the response envelope.
//!
//! Every bound handler answers with HTTP 200 and a JSON envelope
//! `{"ret", "msg", "trace_id"?, "data"?}`. `ret` is a [`Code`]: `0` for
//! success, a registered client or server code otherwise. Codes carry
//! messages in several languages; the envelope picks one per request.
//!
//! Codes are registered in a [`CodeBook`], which rejects duplicate `ret`
//! values and message sets without English:
//!
//! ```rust
//! use axum_bind::CodeBook;
//!
//! let mut book = CodeBook::new();
//! let not_owner = book.add_local(-1, "not the owner of this order").unwrap();
//! assert_eq!(not_owner.ret(), -1_000_001);
//! assert!(book.add_local(-1, "again").is_err());
//! ```

pub mod lang;
mod envelope;

pub use envelope::*;

use {
    crate::{BoxError, Error, ErrorKind, Result, config::MIN_CODE_PREFIX},
    std::{
        collections::{BTreeMap, HashMap},
        fmt,
        sync::{Arc, LazyLock},
    },
    thiserror::Error,
};

/// Local codes must lie strictly within ±`LOCAL_CODE_LIMIT`.
pub const LOCAL_CODE_LIMIT: i32 = 100_000;

/// Reasons a code definition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("ret {0} is already registered")]
    Duplicate(i32),
    #[error("ret {0} has no English message")]
    MissingEnglish(i32),
    #[error("local ret {0} must be within ±{limit} and not 0", limit = LOCAL_CODE_LIMIT)]
    LocalOutOfRange(i32),
    #[error("code prefix {0} must be >= {min}", min = MIN_CODE_PREFIX)]
    PrefixTooSmall(i32),
}

impl From<CodeError> for Error {
    fn from(err: CodeError) -> Self {
        Error::new(ErrorKind::InvalidInput, err)
    }
}

/// Messages of a code keyed by language. A plain string is English.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages(BTreeMap<String, String>);

impl Messages {
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn english(&self) -> Option<&str> {
        self.get(lang::ENGLISH)
    }
}

impl From<&str> for Messages {
    fn from(msg: &str) -> Self {
        Messages(BTreeMap::from([(lang::ENGLISH.to_string(), msg.to_string())]))
    }
}

impl From<String> for Messages {
    fn from(msg: String) -> Self {
        Messages(BTreeMap::from([(lang::ENGLISH.to_string(), msg)]))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Messages {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Messages(
            pairs
                .into_iter()
                .map(|(lang, msg)| (lang.to_string(), msg.to_string()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for Messages {
    fn from(map: HashMap<String, String>) -> Self {
        Messages(map.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Messages {
    fn from(map: BTreeMap<String, String>) -> Self {
        Messages(map)
    }
}

/// A result code: numeric `ret`, localized messages and an optional error
/// detail. Codes compare by `ret`.
///
/// `Code` implements [`std::error::Error`], so a handler returns it as its
/// error value:
///
/// ```rust
/// use axum_bind::{Code, code::CLIENT_ERR};
///
/// fn check(age: u32) -> Result<(), Code> {
///     if age < 18 {
///         return Err(CLIENT_ERR.clone().with_error(format!("age {age} below 18")));
///     }
///     Ok(())
/// }
/// assert_eq!(check(3).unwrap_err().ret(), 4000);
/// ```
#[derive(Clone)]
pub struct Code {
    ret: i32,
    msg: String,
    messages: Arc<Messages>,
    error: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    split: Option<String>,
    pass: bool,
}

impl Code {
    /// Creates a code outside any [`CodeBook`]. Prefer [`CodeBook::add`],
    /// which also rejects duplicates.
    pub fn new(ret: i32, messages: impl Into<Messages>) -> Result<Code> {
        let messages = messages.into();
        if messages.english().is_none() {
            return Err(CodeError::MissingEnglish(ret).into());
        }
        Ok(Self::from_parts(ret, messages))
    }

    fn from_parts(ret: i32, messages: Messages) -> Code {
        Code {
            ret,
            msg: String::new(),
            messages: Arc::new(messages),
            error: None,
            split: None,
            pass: false,
        }
    }

    pub fn ret(&self) -> i32 {
        self.ret
    }

    /// The resolved message, or the English one when none was resolved yet.
    pub fn message(&self) -> &str {
        if self.msg.is_empty() {
            self.messages.english().unwrap_or_default()
        } else {
            &self.msg
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Returns a copy whose message is resolved for `lang`, falling back to
    /// English.
    pub fn localized(&self, lang: Option<&str>) -> Code {
        let mut code = self.clone();
        let chosen = lang
            .into_iter()
            .flat_map(lang::lookup_keys)
            .find_map(|key| self.messages.get(key))
            .or_else(|| self.messages.english());
        if let Some(msg) = chosen {
            code.msg = msg.to_string();
        }
        code
    }

    /// Attaches the underlying error. It is shown to clients only when error
    /// detail is exposed.
    pub fn with_error(mut self, error: impl Into<BoxError>) -> Code {
        let error: BoxError = error.into();
        self.error = Some(Arc::from(error));
        self
    }

    /// Separator between message and error detail. It must not occur in the
    /// message itself, otherwise the default separator is used.
    pub fn with_split(mut self, split: impl Into<String>) -> Code {
        self.split = Some(split.into());
        self
    }

    /// Marks the code as passed through from a downstream service.
    pub fn with_pass(mut self) -> Code {
        self.pass = true;
        self
    }

    pub fn is_pass(&self) -> bool {
        self.pass
    }

    pub fn detail(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.error.as_deref()
    }

    pub fn is_server_err(&self) -> bool {
        is_server_err(self.ret)
    }

    pub fn is_client_err(&self) -> bool {
        is_client_err(self.ret)
    }

    /// Message with the error detail appended using the code's split, or
    /// `default_split` when the split is unset or part of the message.
    pub fn message_with_detail(&self, default_split: &str) -> String {
        let msg = self.message();
        match &self.error {
            None => msg.to_string(),
            Some(err) => {
                let split = match self.split.as_deref() {
                    Some(split) if !split.is_empty() && !msg.contains(split) => split,
                    _ => default_split,
                };
                format!("{msg}{split}{err}")
            }
        }
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.ret == other.ret
    }
}

impl Eq for Code {}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Code")
            .field("ret", &self.ret)
            .field("msg", &self.message())
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .field("pass", &self.pass)
            .finish()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) => write!(f, "{err}"),
            None => write!(f, "ret: {}, msg: {}", self.ret, self.message()),
        }
    }
}

impl std::error::Error for Code {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.error {
            Some(err) => Some(&**err),
            None => None,
        }
    }
}

/// Whether `ret` denotes a server error: legacy `5000..6000`, otherwise any
/// positive value.
pub fn is_server_err(ret: i32) -> bool {
    match ret {
        4000..5000 => false,
        5000..6000 => true,
        ret => ret > 0,
    }
}

/// Whether `ret` denotes a client error: legacy `4000..5000`, otherwise any
/// negative value.
pub fn is_client_err(ret: i32) -> bool {
    match ret {
        4000..5000 => true,
        5000..6000 => false,
        ret => ret < 0,
    }
}

macro_rules! builtin_codes {
    ($($(#[$doc:meta])* $name:ident = $ret:literal, $msg:literal;)*) => {
        $(
            $(#[$doc])*
            pub static $name: LazyLock<Code> =
                LazyLock::new(|| Code::from_parts($ret, Messages::from($msg)));
        )*

        fn builtins() -> Vec<&'static Code> {
            vec![$(&*$name),*]
        }
    };
}

builtin_codes! {
    SUCCESS = 0, "success";
    /// Unclassified server failure. Clients never see more than "server error".
    SERVER_ERR = 5000, "server error";
    /// A handler panicked.
    SERVER_ERR_PANIC = 5201, "server error";
    SERVER_ERR_REDIS = 5202, "server error";
    /// A downstream service call failed.
    SERVER_ERR_RPC = 5203, "server error";
    CLIENT_ERR = 4000, "client error";
    CLIENT_ERR_QUERY = 4002, "verify query params failed";
    CLIENT_ERR_BODY = 4004, "verify body params failed";
    CLIENT_ERR_HEADER = 4005, "verify header params failed";
    CLIENT_ERR_URI = 4006, "verify uri params failed";
    CLIENT_ERR_404 = 4040, "not found";
    CLIENT_ERR_FORBID_CONCURRENT = 4201, "forbid concurrent by same user";
}

/// Registry of the codes a service defines.
///
/// Built-in codes are reserved in every book. Local codes are shifted by the
/// service prefix so that `ret` values stay unique across services.
#[derive(Debug, Clone)]
pub struct CodeBook {
    prefix: i32,
    codes: BTreeMap<i32, Code>,
}

impl Default for CodeBook {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBook {
    pub fn new() -> Self {
        let codes = builtins()
            .into_iter()
            .map(|code| (code.ret, code.clone()))
            .collect();
        CodeBook {
            prefix: MIN_CODE_PREFIX,
            codes,
        }
    }

    pub fn with_prefix(prefix: i32) -> Result<Self> {
        if prefix < MIN_CODE_PREFIX {
            return Err(CodeError::PrefixTooSmall(prefix).into());
        }
        Ok(CodeBook {
            prefix,
            ..Self::new()
        })
    }

    pub fn prefix(&self) -> i32 {
        self.prefix
    }

    /// Registers a code under its global `ret`.
    pub fn add(&mut self, ret: i32, messages: impl Into<Messages>) -> Result<Code> {
        if self.codes.contains_key(&ret) {
            return Err(CodeError::Duplicate(ret).into());
        }
        let code = Code::new(ret, messages)?;
        self.codes.insert(ret, code.clone());
        Ok(code)
    }

    /// Registers a service-local code: positive values become
    /// `ret + prefix`, negative ones `ret - prefix`.
    pub fn add_local(&mut self, ret_local: i32, messages: impl Into<Messages>) -> Result<Code> {
        let ret = match ret_local {
            r if r > 0 && r < LOCAL_CODE_LIMIT => r + self.prefix,
            r if r < 0 && r > -LOCAL_CODE_LIMIT => r - self.prefix,
            r => return Err(CodeError::LocalOutOfRange(r).into()),
        };
        self.add(ret, messages)
    }

    pub fn get(&self, ret: i32) -> Option<&Code> {
        self.codes.get(&ret)
    }

    pub fn contains(&self, ret: i32) -> bool {
        self.codes.contains_key(&ret)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Code> {
        self.codes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code_error(err: Error) -> CodeError {
        err.into_inner()
            .downcast::<CodeError>()
            .map(|e| *e)
            .expect("expected a CodeError")
    }

    #[test]
    fn test_builtins_are_reserved() {
        let mut book = CodeBook::new();
        assert_eq!(book.len(), 12);
        assert!(book.contains(0));
        assert!(book.contains(4004));
        let err = book.add(5000, "again").unwrap_err();
        assert_eq!(code_error(err), CodeError::Duplicate(5000));
    }

    #[test]
    fn test_add_requires_english() {
        let mut book = CodeBook::new();
        let err = book.add(7001, [(lang::HINDI, "गलत")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(code_error(err), CodeError::MissingEnglish(7001));
        assert!(!book.contains(7001), "a rejected code must not reserve its ret");
    }

    #[test]
    fn test_empty_english_message_is_allowed() {
        let mut book = CodeBook::new();
        let code = book.add(7002, "").unwrap();
        assert_eq!(code.message(), "");
    }

    #[test]
    fn test_add_local_out_of_range() {
        let mut book = CodeBook::new();
        for ret in [0, 100_000, -100_000, 250_000] {
            let err = book.add_local(ret, "x").unwrap_err();
            assert_eq!(code_error(err), CodeError::LocalOutOfRange(ret));
        }
    }

    #[test]
    fn test_with_prefix_rejects_small_prefix() {
        assert!(CodeBook::with_prefix(999).is_err());
        let book = CodeBook::with_prefix(2_000_000).unwrap();
        assert_eq!(book.prefix(), 2_000_000);
        assert_eq!(book.len(), 12);
    }

    #[test]
    fn test_localized_falls_back_to_english() {
        let code = Code::new(
            9,
            [(lang::ENGLISH, "not found"), (lang::HINDI, "नहीं मिला")],
        )
        .unwrap();
        assert_eq!(code.localized(Some(lang::HINDI)).message(), "नहीं मिला");
        assert_eq!(code.localized(Some("hi-IN,en;q=0.5")).message(), "नहीं मिला");
        assert_eq!(code.localized(Some("fr-FR")).message(), "not found");
        assert_eq!(code.localized(None).message(), "not found");
    }

    #[test]
    fn test_display_and_source() {
        let plain = CLIENT_ERR_BODY.clone();
        assert_eq!(plain.to_string(), "ret: 4004, msg: verify body params failed");
        assert!(std::error::Error::source(&plain).is_none());

        let wrapped = plain.with_error("missing field `name`");
        assert_eq!(wrapped.to_string(), "missing field `name`");
        assert!(std::error::Error::source(&wrapped).is_some());
        assert_eq!(wrapped, *CLIENT_ERR_BODY);
    }

    #[test]
    fn test_message_with_detail_split_rules() {
        let code = CLIENT_ERR.clone().with_error("boom");
        assert_eq!(code.message_with_detail(": "), "client error: boom");

        let code = CLIENT_ERR.clone().with_error("boom").with_split(" | ");
        assert_eq!(code.message_with_detail(": "), "client error | boom");

        // the split occurs in the message, so the default one is used
        let code = CLIENT_ERR.clone().with_error("boom").with_split("error");
        assert_eq!(code.message_with_detail(": "), "client error: boom");

        assert_eq!(CLIENT_ERR.message_with_detail(": "), "client error");
    }

    #[test]
    fn test_classification() {
        assert!(!is_server_err(0) && !is_client_err(0));
        assert!(is_client_err(4002) && !is_server_err(4002));
        assert!(is_server_err(5201) && !is_client_err(5201));
        assert!(is_server_err(1_000_001) && !is_client_err(1_000_001));
        assert!(is_client_err(-1_000_001) && !is_server_err(-1_000_001));
        assert!(SERVER_ERR_PANIC.is_server_err());
        assert!(CLIENT_ERR_404.is_client_err());
    }

    proptest! {
        #[test]
        fn prop_add_local_applies_prefix(local in 1i32..LOCAL_CODE_LIMIT, negative in any::<bool>()) {
            let mut book = CodeBook::with_prefix(3_000_000).unwrap();
            let local = if negative { -local } else { local };
            let code = book.add_local(local, "local").unwrap();
            let expected = if negative { local - 3_000_000 } else { local + 3_000_000 };
            prop_assert_eq!(code.ret(), expected);
            prop_assert!(book.add_local(local, "local").is_err());
            prop_assert_eq!(is_client_err(code.ret()), negative);
        }
    }
}
