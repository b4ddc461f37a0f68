use std::fmt;

use url::Url;

use crate::{definitions::PageRequest, errors::Result};

/// Path of the query api on a standard MediaWiki install.
const WIKI_API_PATH: &str = "/w/api.php";

// https://www.mediawiki.org/wiki/API:Query
// Order matters, callers compare built urls literally.
const QUERY_PARAMS: [(&str, &str); 4] = [
    ("action", "query"),
    ("prop", "revisions"),
    ("format", "json"),
    ("rvprop", "content"),
];

/// Scheme-relative url (`//host/w/api.php?...`) for one page query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryUrl(String);

impl QueryUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Turn the url into an absolute one using `scheme` (`http` / `https`).
    pub fn resolve(&self, scheme: &str) -> std::result::Result<Url, url::ParseError> {
        Url::parse(&format!("{}:{}", scheme, self.0))
    }

    #[cfg(test)]
    pub(crate) fn from_raw<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for QueryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build the query url for a request.
///
/// The selector value is appended as given. `Url::query_pairs_mut` would
/// percent-encode it, which changes what existing wikis receive, so the string is
/// assembled by hand.
///
/// # Returns
/// - Ok(QueryUrl) -> `//<host>/w/api.php?action=query&prop=revisions&format=json&rvprop=content&<filter>`
/// - Err(StorageError::InvalidArgument) -> no host, or no selector.
pub fn build_query_url(request: &PageRequest) -> Result<QueryUrl> {
    let host = request.host_str()?;
    let selector = request.selector()?;

    let mut url = format!("//{}{}", host, WIKI_API_PATH);
    for (i, (key, value)) in QUERY_PARAMS.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url.push('&');
    url.push_str(&selector.to_string());

    Ok(QueryUrl(url))
}
