//! Failure kinds for the extraction pipeline.
//!
//! Every failure is fatal to the current request - nothing here is retried
//! and no partial calendar is ever produced. The variants exist so the
//! boundary layer can tell a retryable-looking condition (upstream page
//! unavailable) from a definitively terminal one (credentials rejected)
//! without leaking internal detail to callers.

use reqwest::StatusCode;
use thiserror::Error;

/// Login handshake failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login page returned a non-success status.
    #[error("login page returned status {0}")]
    PageUnavailable(StatusCode),
    /// The anti-bot cookie value was not embedded in the login page.
    #[error("session token not found in login page")]
    TokenNotFound,
    /// The login form block could not be located in the page markup.
    #[error("login form not found in login page")]
    LoginFormMissing,
    /// The service bounced us back to the canonical login page.
    #[error("credentials rejected")]
    LoginRejected,
    /// The account hit a security checkpoint requiring manual verification.
    #[error("security checkpoint requires additional verification")]
    CheckpointRequired,
    #[error("network error during login: {0}")]
    Network(#[from] reqwest::Error),
}

/// Birthday listing and token/locale lookup failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An authenticated page returned a non-success status.
    #[error("page returned status {0}")]
    PageUnavailable(StatusCode),
    /// The async authorization token pattern did not match exactly once.
    #[error("failed to extract async authorization token")]
    TokenExtractionFailed,
    /// The account locale did not match the `xx_XX` form.
    #[error("unsupported locale format: {0:?}")]
    UnsupportedLocaleFormat(String),
    /// A JSON payload did not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),
    /// Twelve monthly windows yielded zero birthday records.
    #[error("no birthday records recovered")]
    NoData,
    #[error("network error during fetch: {0}")]
    Network(#[from] reqwest::Error),
}

/// Tooltip date resolution failures.
#[derive(Debug, Error)]
pub enum DateParseError {
    /// Locale absent from the static format table.
    #[error("unsupported locale: {0}")]
    UnsupportedLocale(String),
    /// The tooltip was neither a date nor a known weekday name.
    #[error("unrecognized day name: {0:?}")]
    UnrecognizedDayName(String),
    /// No provider could produce weekday names for the locale.
    #[error("weekday names unavailable for locale: {0}")]
    LocaleUnavailable(String),
}

/// Neither lookup tier resolved a vanity name to an entity id.
#[derive(Debug, Error)]
#[error("could not resolve entity id for {vanity_name:?}")]
pub struct EntityResolutionError {
    pub vanity_name: String,
}

/// Top-level pipeline failure, one variant per component.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    DateParse(#[from] DateParseError),
    #[error(transparent)]
    Entity(#[from] EntityResolutionError),
    /// The HTTP client itself could not be constructed.
    #[error("http client setup failed: {0}")]
    ClientSetup(reqwest::Error),
}
