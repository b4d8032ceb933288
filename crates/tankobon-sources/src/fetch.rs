use std::{sync::Arc, time::Duration};

use reqwest::{
    Method, RequestBuilder, StatusCode,
    cookie::Jar,
    header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tankobon_lib::prelude::{RetryPolicy, SourceError, SourceResult};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

/// Per request extras; sources set a referer or a different user agent
#[derive(Debug, Clone, Default)]
pub struct RequestOptions<'a> {
    pub query: &'a [(&'a str, &'a str)],
    pub referer: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

impl<'a> RequestOptions<'a> {
    pub fn query(query: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn referer(mut self, referer: &'a str) -> Self {
        self.referer = Some(referer);
        self
    }

    pub fn user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

/// The fetch primitive every source goes through.
///
/// Wraps one `reqwest::Client` and applies the shared [`RetryPolicy`] to each
/// request. Responses are never cached.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(retry: RetryPolicy, timeout: Duration) -> SourceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = reqwest::ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .cookie_provider(Arc::new(Jar::default()))
            .brotli(true)
            .deflate(true)
            .gzip(true)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unsupported(format!("http client: {e}")))?;

        Ok(Self { client, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn get_text(&self, url: &str, opts: RequestOptions<'_>) -> SourceResult<String> {
        self.send_text(Method::GET, url, &opts, None).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: RequestOptions<'_>,
    ) -> SourceResult<T> {
        let body = self.send_text(Method::GET, url, &opts, None).await?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::Unavailable(format!("unexpected response from {url}: {e}")))
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        opts: RequestOptions<'_>,
    ) -> SourceResult<String> {
        self.send_text(Method::POST, url, &opts, Some(form)).await
    }

    async fn send_text(
        &self,
        method: Method,
        url: &str,
        opts: &RequestOptions<'_>,
        form: Option<&[(&str, &str)]>,
    ) -> SourceResult<String> {
        let client = &self.client;
        let method = &method;

        self.retry
            .run(url, move || {
                let request = build_request(client, method.clone(), url, opts, form);
                async move {
                    debug!("{method} {url}");
                    let res = request.send().await.map_err(classify_error)?;
                    check_status(res.status(), url)?;
                    res.text().await.map_err(classify_error)
                }
            })
            .await
    }
}

fn build_request(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    opts: &RequestOptions<'_>,
    form: Option<&[(&str, &str)]>,
) -> RequestBuilder {
    let mut req = client.request(method, url);
    if !opts.query.is_empty() {
        req = req.query(opts.query);
    }
    if let Some(referer) = opts.referer {
        req = req.header(REFERER, referer);
    }
    if let Some(user_agent) = opts.user_agent {
        req = req.header(USER_AGENT, user_agent);
    }
    if let Some(form) = form {
        req = req
            .header(
                HeaderName::from_static("x-requested-with"),
                HeaderValue::from_static("XMLHttpRequest"),
            )
            .form(form);
    }

    req
}

/// Maps a response status onto the source error taxonomy
pub fn check_status(status: StatusCode, url: &str) -> SourceResult<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = format!("{url} returned {status}");
    match status.as_u16() {
        404 | 410 => Err(SourceError::NotFound(message)),
        408 | 425 | 429 | 500..=599 => Err(SourceError::Unavailable(message)),
        _ => Err(SourceError::Rejected(message)),
    }
}

fn classify_error(e: reqwest::Error) -> SourceError {
    if let Some(status) = e.status() {
        if let Err(err) = check_status(status, e.url().map(|u| u.as_str()).unwrap_or_default()) {
            return err;
        }
    }

    if e.is_builder() {
        SourceError::Rejected(e.to_string())
    } else {
        SourceError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(check_status(StatusCode::OK, "u"), Ok(()));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "u"),
            Err(SourceError::NotFound(_))
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, "u"),
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "u"),
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            check_status(StatusCode::from_u16(522).unwrap(), "u"),
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "u"),
            Err(SourceError::Rejected(_))
        ));
    }

    #[test]
    fn test_client_builds() {
        let client = HttpClient::new(RetryPolicy::none(), Duration::from_secs(5));
        assert!(client.is_ok());
    }
}
