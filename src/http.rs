// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

use crate::config::HttpSettings;

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// HTTP response with status, content length, and body stream
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the entire response body as bytes; non-success statuses are errors
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error>;

    /// Get a streaming response for large downloads
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    api_timeout: Duration,
}

impl ReqwestClient {
    /// Create a client with the given user agent and timeouts
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .read_timeout(settings.download_timeout)
            .build()?;

        Ok(Self {
            client,
            api_timeout: settings.api_timeout,
        })
    }

    /// Create a new ReqwestClient with a custom reqwest::Client
    pub fn with_client(client: reqwest::Client, api_timeout: Duration) -> Self {
        Self {
            client,
            api_timeout,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
        self.client
            .get(url)
            .timeout(self.api_timeout)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        use futures::StreamExt;

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();

        let body: ByteStream = Box::pin(response.bytes_stream().map(|result| result));

        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Canned reply for a mocked route
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// 200 with this body
        Body(Vec<u8>),
        /// 200 with a body streamed in chunks, each preceded by `delay`
        Chunked { chunks: Vec<Vec<u8>>, delay: Duration },
        /// 200 whose body stream fails after the headers
        BrokenStream,
        /// Error status with an empty body
        Status(u16),
        /// Connection-level failure
        TransportError,
    }

    impl MockReply {
        pub fn json(value: serde_json::Value) -> Self {
            MockReply::Body(value.to_string().into_bytes())
        }

        pub fn chunked<B: AsRef<[u8]>>(chunks: &[B], delay: Duration) -> Self {
            MockReply::Chunked {
                chunks: chunks.iter().map(|c| c.as_ref().to_vec()).collect(),
                delay,
            }
        }
    }

    /// Routes requests by substring match against the decoded URL
    ///
    /// Routes are tried in insertion order, so register specific routes before
    /// general ones. Unmatched requests fail like a transport error.
    #[derive(Default)]
    pub struct MockHttpClient {
        routes: Vec<(String, MockReply)>,
        requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, pattern: &str, reply: MockReply) -> Self {
            self.routes.push((pattern.to_string(), reply));
            self
        }

        /// Decoded URLs requested so far, in order
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn reply_for(&self, url: &str) -> Option<MockReply> {
            let decoded = decode(url);
            self.requests.lock().unwrap().push(decoded.clone());
            self.routes
                .iter()
                .find(|(pattern, _)| decoded.contains(pattern.as_str()))
                .map(|(_, reply)| reply.clone())
        }
    }

    /// `https://host/path?a=b&c=d` with the query percent-decoded
    fn decode(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(parsed) => {
                let query: Vec<String> = parsed
                    .query_pairs()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                let base = format!(
                    "{}://{}{}",
                    parsed.scheme(),
                    parsed.host_str().unwrap_or_default(),
                    parsed.path()
                );
                if query.is_empty() {
                    base
                } else {
                    format!("{base}?{}", query.join("&"))
                }
            }
            Err(_) => url.to_string(),
        }
    }

    /// A real reqwest error for simulating connection failures
    pub fn transport_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a valid url")
            .build()
            .unwrap_err()
    }

    /// A real reqwest error carrying an HTTP status, as `error_for_status` returns
    pub fn status_error(status: u16) -> reqwest::Error {
        let response = ::http::Response::builder()
            .status(status)
            .body(Vec::<u8>::new())
            .unwrap();
        reqwest::Response::from(response)
            .error_for_status()
            .unwrap_err()
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
            match self.reply_for(url) {
                Some(MockReply::Body(body)) => Ok(Bytes::from(body)),
                Some(MockReply::Chunked { chunks, .. }) => Ok(Bytes::from(chunks.concat())),
                Some(MockReply::Status(status)) => Err(status_error(status)),
                _ => Err(transport_error()),
            }
        }

        async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            use futures::StreamExt;

            let (status, content_length, body): (u16, Option<u64>, ByteStream) =
                match self.reply_for(url) {
                    Some(MockReply::Body(data)) => {
                        let len = data.len() as u64;
                        let body: ByteStream =
                            Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) }));
                        (200, Some(len), body)
                    }
                    Some(MockReply::Chunked { chunks, delay }) => {
                        let len = chunks.iter().map(|c| c.len() as u64).sum();
                        let body: ByteStream =
                            Box::pin(futures::stream::iter(chunks).then(move |chunk| async move {
                                tokio::time::sleep(delay).await;
                                Ok(Bytes::from(chunk))
                            }));
                        (200, Some(len), body)
                    }
                    Some(MockReply::BrokenStream) => {
                        let body: ByteStream = Box::pin(futures::stream::iter([
                            Ok(Bytes::from_static(b"OggS")),
                            Err(transport_error()),
                        ]));
                        (200, None, body)
                    }
                    Some(MockReply::Status(status)) => {
                        let body: ByteStream = Box::pin(futures::stream::empty());
                        (status, Some(0), body)
                    }
                    Some(MockReply::TransportError) | None => return Err(transport_error()),
                };

            Ok(HttpResponse {
                status,
                content_length,
                body,
            })
        }
    }
}
