//! Client-identifying User-Agent for upstream collection traffic.
//!
//! Upstream crawler heuristics reject anonymous clients, so every request
//! names the tool, its version and a contact URL.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/gallery";

/// Default User-Agent for collection API requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("gallery/{version} (collection-browser; +{PROJECT_UA_URL})")
}
