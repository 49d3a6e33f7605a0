// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::WikiError;
use crate::http::HttpClient;

use super::api::{PagesQuery, query_url, run_query};

/// Fetch the plain-text rendering of an article
///
/// Returns an empty string when the article does not exist or has no text.
pub async fn fetch_extract<C: HttpClient>(
    client: &C,
    api: &Url,
    title: &str,
) -> Result<String, WikiError> {
    let url = query_url(
        api,
        &[("prop", "extracts"), ("explaintext", "1"), ("titles", title)],
    );
    let response = run_query::<_, PagesQuery>(client, &url).await?;

    Ok(response
        .query
        .and_then(PagesQuery::into_first_page)
        .and_then(|page| page.extract)
        .unwrap_or_default())
}

/// Fetch the raw markup of an article's latest revision
///
/// Returns an empty string when the article has no revision.
pub async fn fetch_wikitext<C: HttpClient>(
    client: &C,
    api: &Url,
    title: &str,
) -> Result<String, WikiError> {
    let url = query_url(
        api,
        &[
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("titles", title),
        ],
    );
    let response = run_query::<_, PagesQuery>(client, &url).await?;

    let page = response.query.and_then(PagesQuery::into_first_page);
    if page.as_ref().is_some_and(|page| page.missing) {
        tracing::debug!(title, "article does not exist");
    }

    Ok(page
        .and_then(|page| page.revisions.into_iter().next())
        .and_then(|revision| revision.slots)
        .and_then(|slots| slots.main)
        .and_then(|main| main.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{MockHttpClient, MockReply};
    use serde_json::json;

    fn api() -> Url {
        Url::parse("https://zh.wikipedia.org/w/api.php").unwrap()
    }

    #[tokio::test]
    async fn extract_returns_plain_text() {
        let client = MockHttpClient::new().route(
            "prop=extracts",
            MockReply::json(json!({
                "query": { "pages": [
                    { "pageid": 1, "ns": 0, "title": "颱風", "extract": "颱風是一種熱帶氣旋。" }
                ] }
            })),
        );

        let text = fetch_extract(&client, &api(), "颱風").await.unwrap();

        assert_eq!(text, "颱風是一種熱帶氣旋。");
        assert!(client.requests()[0].contains("titles=颱風"));
        assert!(client.requests()[0].contains("explaintext=1"));
    }

    #[tokio::test]
    async fn extract_of_missing_page_is_empty() {
        let client = MockHttpClient::new().route(
            "prop=extracts",
            MockReply::json(json!({
                "query": { "pages": [ { "ns": 0, "title": "不存在", "missing": true } ] }
            })),
        );

        let text = fetch_extract(&client, &api(), "不存在").await.unwrap();

        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn wikitext_reads_main_slot() {
        let client = MockHttpClient::new().route(
            "prop=revisions",
            MockReply::json(json!({
                "query": { "pages": [ {
                    "pageid": 7, "ns": 0, "title": "韓國教育",
                    "revisions": [ { "slots": { "main": {
                        "contentmodel": "wikitext",
                        "content": "{{Spoken Wikipedia|Zh-韓國教育.ogg}}"
                    } } } ]
                } ] }
            })),
        );

        let markup = fetch_wikitext(&client, &api(), "韓國教育").await.unwrap();

        assert_eq!(markup, "{{Spoken Wikipedia|Zh-韓國教育.ogg}}");
        assert!(client.requests()[0].contains("rvslots=main"));
    }

    #[tokio::test]
    async fn wikitext_without_revisions_is_empty() {
        let client = MockHttpClient::new().route(
            "prop=revisions",
            MockReply::json(json!({
                "query": { "pages": [ { "ns": 0, "title": "不存在", "missing": true } ] }
            })),
        );

        let markup = fetch_wikitext(&client, &api(), "不存在").await.unwrap();

        assert!(markup.is_empty());
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let client = MockHttpClient::new().route("api.php", MockReply::TransportError);

        assert!(fetch_extract(&client, &api(), "颱風").await.is_err());
        assert!(fetch_wikitext(&client, &api(), "颱風").await.is_err());
    }
}
