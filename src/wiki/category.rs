// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::WikiError;
use crate::http::HttpClient;
use crate::pacing::{Pacer, Pause};

use super::api::{CategoryMembersQuery, query_url, run_query};

/// Which category to list and how
#[derive(Debug, Clone)]
pub struct CategoryListing<'a> {
    pub api: &'a Url,
    pub category: &'a str,
    pub namespace: u32,
    pub page_size: u32,
}

/// List every member title of a category, in API order
///
/// Follows `cmcontinue` tokens until the listing is exhausted, pausing between
/// pages. Any failed page aborts the whole listing.
pub async fn list_category_members<C: HttpClient>(
    client: &C,
    listing: &CategoryListing<'_>,
    pacer: &Pacer,
) -> Result<Vec<String>, WikiError> {
    let namespace = listing.namespace.to_string();
    let page_size = listing.page_size.to_string();

    let mut titles = Vec::new();
    let mut continue_token: Option<String> = None;

    loop {
        let mut params = vec![
            ("list", "categorymembers"),
            ("cmtitle", listing.category),
            ("cmnamespace", namespace.as_str()),
            ("cmlimit", page_size.as_str()),
        ];
        if let Some(token) = continue_token.as_deref() {
            params.push(("cmcontinue", token));
        }

        let url = query_url(listing.api, &params);
        let response = run_query::<_, CategoryMembersQuery>(client, &url).await?;

        let members = response.query.unwrap_or_default().categorymembers;
        tracing::debug!(
            category = listing.category,
            page_titles = members.len(),
            "listed category page"
        );
        titles.extend(members.into_iter().map(|member| member.title));

        continue_token = response
            .continuation
            .and_then(|c| c.cmcontinue)
            .filter(|token| !token.is_empty());

        if continue_token.is_none() {
            break;
        }

        pacer.pause(Pause::BetweenPages).await;
    }

    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{MockHttpClient, MockReply};
    use crate::pacing::testing::recording_pacer;
    use serde_json::json;
    use std::time::Duration;

    fn api() -> Url {
        Url::parse("https://zh.wikipedia.org/w/api.php").unwrap()
    }

    fn listing(api: &Url) -> CategoryListing<'_> {
        CategoryListing {
            api,
            category: "Category:有声条目",
            namespace: 0,
            page_size: 500,
        }
    }

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let client = MockHttpClient::new()
            .route(
                "cmcontinue=page|2",
                MockReply::json(json!({
                    "query": { "categorymembers": [ { "ns": 0, "title": "颱風" } ] }
                })),
            )
            .route(
                "list=categorymembers",
                MockReply::json(json!({
                    "continue": { "cmcontinue": "page|2", "continue": "-||" },
                    "query": { "categorymembers": [
                        { "ns": 0, "title": "韓國教育" },
                        { "ns": 0, "title": "0號元素" }
                    ] }
                })),
            );
        let (pacer, sleeper) = recording_pacer();
        let api = api();

        let titles = list_category_members(&client, &listing(&api), &pacer)
            .await
            .unwrap();

        assert_eq!(titles, ["韓國教育", "0號元素", "颱風"]);
        assert_eq!(client.requests().len(), 2);
        assert!(client.requests()[0].contains("cmtitle=Category:有声条目"));
        assert!(client.requests()[0].contains("cmnamespace=0"));
        assert_eq!(sleeper.recorded(), [Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn empty_category_yields_no_titles() {
        let client = MockHttpClient::new()
            .route("list=categorymembers", MockReply::json(json!({ "batchcomplete": true })));
        let (pacer, sleeper) = recording_pacer();
        let api = api();

        let titles = list_category_members(&client, &listing(&api), &pacer)
            .await
            .unwrap();

        assert!(titles.is_empty());
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn failed_page_aborts_listing() {
        let client = MockHttpClient::new()
            .route("cmcontinue=next", MockReply::TransportError)
            .route(
                "list=categorymembers",
                MockReply::json(json!({
                    "continue": { "cmcontinue": "next" },
                    "query": { "categorymembers": [ { "title": "颱風" } ] }
                })),
            );
        let (pacer, _) = recording_pacer();
        let api = api();

        let result = list_category_members(&client, &listing(&api), &pacer).await;

        assert!(matches!(result, Err(WikiError::RequestFailed { .. })));
    }
}
