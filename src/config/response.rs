use {
    crate::{Error, Result},
    serde::Deserialize,
};

/// Smallest prefix accepted for service-local result codes.
pub const MIN_CODE_PREFIX: i32 = 1_000_000;

///
/// Configuration of the response envelope.
///
/// ```toml
/// [response]
/// code_prefix = 2000000
/// default_split = ": "
/// release = true
/// show_error_detail = "non-release"
/// show_trace_id = "always"
/// ```
///
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseConfig {
    /// Offset applied by `CodeBook::add_local` to service-local codes.
    /// The default `code_prefix` is 1000000.
    #[serde(default = "ResponseConfig::default_code_prefix")]
    pub code_prefix: i32,

    /// Separator placed between a code message and the appended error detail
    /// when the code carries no split of its own. The default is ": ".
    #[serde(default = "ResponseConfig::default_split")]
    pub default_split: String,

    /// Whether the service runs in release mode. `non-release` exposures are
    /// switched off in release mode. By default `release` is false.
    #[serde(default)]
    pub release: bool,

    /// Whether error details are appended to envelope messages.
    /// By default `show_error_detail` is `never`.
    #[serde(default)]
    pub show_error_detail: Exposure,

    /// Whether the request id is echoed as the envelope `trace_id`.
    /// By default `show_trace_id` is `never`.
    #[serde(default)]
    pub show_trace_id: Exposure,
}

/// When an optional envelope field is exposed.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Exposure {
    #[default]
    Never,
    Always,
    NonRelease,
}

impl ResponseConfig {
    fn default_code_prefix() -> i32 {
        MIN_CODE_PREFIX
    }

    fn default_split() -> String {
        ": ".into()
    }

    fn exposes(&self, exposure: Exposure) -> bool {
        match exposure {
            Exposure::Never => false,
            Exposure::Always => true,
            Exposure::NonRelease => !self.release,
        }
    }

    /// Whether error detail is exposed on every route.
    pub fn shows_error_detail(&self) -> bool {
        self.exposes(self.show_error_detail)
    }

    /// Whether trace ids are exposed on every route.
    pub fn shows_trace_id(&self) -> bool {
        self.exposes(self.show_trace_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.code_prefix < MIN_CODE_PREFIX {
            return Err(Error::invalid_input(format!(
                "response.code_prefix must be >= {MIN_CODE_PREFIX}, got {}",
                self.code_prefix
            )));
        }
        if self.default_split.is_empty() {
            return Err(Error::invalid_input(
                "response.default_split must not be empty. Set [response] default_split = \": \" in config.",
            ));
        }
        Ok(())
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        ResponseConfig {
            code_prefix: Self::default_code_prefix(),
            default_split: Self::default_split(),
            release: false,
            show_error_detail: Exposure::default(),
            show_trace_id: Exposure::default(),
        }
    }
}
