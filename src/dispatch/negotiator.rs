//! Content negotiation.

use crate::dispatch::Fault;

/// Resolve the Accept value against an operation's produced media types.
///
/// Exact string equality only: no wildcards, quality factors or lists.
/// A missing Accept value never matches.
pub fn negotiate<'a>(accept: Option<&str>, produces: &'a [String]) -> Result<&'a str, Fault> {
    let requested = accept.unwrap_or_default();
    produces
        .iter()
        .find(|media_type| media_type.as_str() == requested)
        .map(String::as_str)
        .ok_or_else(|| Fault::UnsupportedMediaType(requested.to_string()))
}
