//! Shared User-Agent string for remote service clients.

/// Default User-Agent for every outgoing request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    format!("collection-factory/{}", env!("CARGO_PKG_VERSION"))
}
