// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MediaWiki action API plumbing shared by the listing, article and media
//! lookups. Every query is issued with `formatversion=2`, so `pages` is an
//! array and booleans are real JSON booleans.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::WikiError;
use crate::http::HttpClient;

/// Envelope of an `action=query` response
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse<Q> {
    pub query: Option<Q>,
    #[serde(rename = "continue")]
    pub continuation: Option<Continuation>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub info: String,
}

/// Continuation parameters for the next page of a list
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Continuation {
    pub cmcontinue: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryMembersQuery {
    #[serde(default)]
    pub categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryMember {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PagesQuery {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Page {
    #[serde(default)]
    pub missing: bool,
    pub extract: Option<String>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
    #[serde(default)]
    pub imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Revision {
    pub slots: Option<Slots>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Slots {
    pub main: Option<Slot>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Slot {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageInfo {
    pub url: Option<String>,
}

impl PagesQuery {
    /// The single page a one-title query asked about
    pub fn into_first_page(self) -> Option<Page> {
        self.pages.into_iter().next()
    }
}

/// Build an `action=query` URL against `endpoint`
pub(crate) fn query_url(endpoint: &Url, params: &[(&str, &str)]) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("action", "query")
        .append_pair("format", "json")
        .append_pair("formatversion", "2")
        .extend_pairs(params);
    url
}

/// Issue a query and decode its response envelope
pub(crate) async fn run_query<C, Q>(client: &C, url: &Url) -> Result<QueryResponse<Q>, WikiError>
where
    C: HttpClient,
    Q: DeserializeOwned,
{
    tracing::debug!(%url, "querying wiki API");

    let bytes = client
        .get_bytes(url.as_str())
        .await
        .map_err(|e| WikiError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

    let response: QueryResponse<Q> =
        serde_json::from_slice(&bytes).map_err(|e| WikiError::InvalidResponse {
            url: url.to_string(),
            source: e,
        })?;

    if let Some(error) = response.error {
        return Err(WikiError::Api {
            url: url.to_string(),
            code: error.code,
            info: error.info,
        });
    }

    Ok(response)
}
