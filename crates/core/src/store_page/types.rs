use reqwest::Url;
use thiserror::Error;

/// One HTTP exchange as seen by the redirect state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Address that produced this response.
    pub url: Url,
    pub status: u16,
    /// `Location` header, if any.
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn ok(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            status: 200,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(url: Url, location: impl Into<String>) -> Self {
        Self {
            url,
            status: 302,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    pub fn status(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            location: None,
            body: String::new(),
        }
    }

    /// Redirect target when this is a 3xx with a `Location` header.
    pub fn redirect_location(&self) -> Option<&str> {
        if (300..400).contains(&self.status) {
            self.location.as_deref()
        } else {
            None
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure below the redirect logic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Why a store page could not be obtained for an id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("redirected to the storefront root")]
    RedirectedToRoot,

    #[error("store page redirected to itself")]
    SelfRedirectLoop,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("age check without a redirect target")]
    AgeGateNoRedirect,

    #[error("resolved outside the app route: {path}")]
    OutsideItemRoute { path: String },

    #[error("resolved address is missing the app id")]
    MissingIdSegment,

    #[error("redirected to an unknown id: {0}")]
    UnknownRedirectTarget(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("storefront returned a site error")]
    SiteError,

    #[error("page is neither a game nor an application")]
    UnrecognizedPage,
}

impl FetchFailure {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchFailure::RedirectedToRoot => "redirected_to_root",
            FetchFailure::SelfRedirectLoop => "self_redirect_loop",
            FetchFailure::TooManyRedirects => "too_many_redirects",
            FetchFailure::AgeGateNoRedirect => "age_gate_no_redirect",
            FetchFailure::OutsideItemRoute { .. } => "outside_item_route",
            FetchFailure::MissingIdSegment => "missing_id_segment",
            FetchFailure::UnknownRedirectTarget(_) => "unknown_redirect_target",
            FetchFailure::EmptyBody => "empty_body",
            FetchFailure::Transport(_) => "transport_error",
            FetchFailure::SiteError => "site_error",
            FetchFailure::UnrecognizedPage => "unrecognized_page",
        }
    }
}

impl From<TransportError> for FetchFailure {
    fn from(e: TransportError) -> Self {
        FetchFailure::Transport(e.0)
    }
}

/// A resolved app page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePage {
    pub requested_id: u32,
    /// Different app id the storefront pointed the request at, if any.
    pub alias_id: Option<u32>,
    pub final_url: Url,
    pub body: String,
}
