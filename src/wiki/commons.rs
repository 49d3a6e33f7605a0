// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::WikiError;
use crate::http::HttpClient;
use crate::wikitext::AudioFilename;

use super::api::{PagesQuery, query_url, run_query};

/// An audio filename paired with its download URL, if the media repository knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub filename: AudioFilename,
    pub url: Option<Url>,
}

/// Look up the current download URL of a file on the media repository
///
/// `Ok(None)` means the repository has no such file, which is common for
/// locally uploaded or misspelled references.
pub async fn resolve_file_url<C: HttpClient>(
    client: &C,
    api: &Url,
    filename: &AudioFilename,
) -> Result<Option<Url>, WikiError> {
    let page_title = filename.file_page_title();
    let url = query_url(
        api,
        &[
            ("prop", "imageinfo"),
            ("iiprop", "url"),
            ("titles", page_title.as_str()),
        ],
    );
    let response = run_query::<_, PagesQuery>(client, &url).await?;

    let download_url = response
        .query
        .and_then(PagesQuery::into_first_page)
        .and_then(|page| page.imageinfo.into_iter().next())
        .and_then(|info| info.url);

    Ok(download_url.and_then(|raw| match Url::parse(&raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(filename = %filename, url = %raw, error = %e, "ignoring malformed file URL");
            None
        }
    }))
}

/// Resolve a filename into a [`ResolvedAsset`]
pub async fn resolve_asset<C: HttpClient>(
    client: &C,
    api: &Url,
    filename: AudioFilename,
) -> Result<ResolvedAsset, WikiError> {
    let url = resolve_file_url(client, api, &filename).await?;
    Ok(ResolvedAsset { filename, url })
}
