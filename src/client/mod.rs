use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::model::PageResponse;
use crate::view::PageQuery;

pub const DATA_PATH: &str = "/sf444/data";

const USER_AGENT: &str = concat!("sf444view/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not decode page data: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

/// Anything that can produce a page for a query. The session spawns each
/// fetch as its own task, so implementors are cheap to clone.
pub trait PageSource: Clone + Send + Sync + 'static {
    fn fetch_page(
        &self,
        query: PageQuery,
    ) -> impl Future<Output = Result<PageResponse, ClientError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HistoryClient {
    http: reqwest::Client,
    data_url: reqwest::Url,
}

impl HistoryClient {
    pub fn new(base_url: &str, options: &ClientOptions) -> Result<Self, ClientError> {
        let data_url = data_url(base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout);

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;
        Ok(Self { http, data_url })
    }

    pub fn data_url(&self) -> &reqwest::Url {
        &self.data_url
    }

    pub async fn fetch(&self, query: &PageQuery) -> Result<PageResponse, ClientError> {
        let page = query.page.to_string();
        let page_size = query.page_size.query_value();
        let params = [
            ("page", page.as_str()),
            ("pageSize", page_size.as_str()),
            ("filterType", query.filter.query_value()),
        ];
        tracing::debug!(
            event = "client.fetch",
            page = query.page,
            page_size = %page_size,
            filter = query.filter.query_value()
        );

        let url = self.data_url.as_str().to_string();
        let response = self
            .http
            .get(self.data_url.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| ClientError::Request {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Request { url, source: e })?;
        serde_json::from_slice::<PageResponse>(&body).map_err(|e| ClientError::Decode { source: e })
    }
}

impl PageSource for HistoryClient {
    fn fetch_page(
        &self,
        query: PageQuery,
    ) -> impl Future<Output = Result<PageResponse, ClientError>> + Send {
        let client = self.clone();
        async move { client.fetch(&query).await }
    }
}

/// Resolves `{base}/sf444/data`, keeping any path prefix of the base URL.
pub fn data_url(base_url: &str) -> Result<reqwest::Url, ClientError> {
    let invalid = |message: String| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        message,
    };
    let trimmed = base_url.trim();
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    let joined = format!("{}{}", trimmed.trim_end_matches('/'), DATA_PATH);
    reqwest::Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterType, PageSize};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and hands back the request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn query(page: usize, page_size: PageSize, filter: FilterType) -> PageQuery {
        PageQuery {
            page,
            page_size,
            filter,
        }
    }

    #[test]
    fn data_url_appends_endpoint() {
        assert_eq!(
            data_url("http://localhost:8080").unwrap().as_str(),
            "http://localhost:8080/sf444/data"
        );
        assert_eq!(
            data_url("http://localhost:8080/app/").unwrap().as_str(),
            "http://localhost:8080/app/sf444/data"
        );
        assert!(data_url("ftp://localhost").is_err());
        assert!(data_url("not a url").is_err());
    }

    #[tokio::test]
    async fn fetch_sends_query_and_decodes_page() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"records":[{"period":101,"finalResult":"1"}],"totalRecords":41,"totalPages":5}"#,
        )
        .await;
        let client = HistoryClient::new(&base, &ClientOptions::default()).unwrap();
        let page = client
            .fetch(&query(2, PageSize::Fixed(10), FilterType::Killed))
            .await
            .unwrap();
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total_records, 41);
        assert_eq!(page.records[0].period.as_deref(), Some("101"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /sf444/data?page=2&pageSize=10&filterType=1 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn fetch_encodes_hit_filter_and_all_page_size() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK", r#"{"records":[],"totalRecords":0,"totalPages":0}"#)
                .await;
        let client = HistoryClient::new(&base, &ClientOptions::default()).unwrap();
        client
            .fetch(&query(0, PageSize::All, FilterType::Hit))
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /sf444/data?page=0&pageSize=all&filterType=%E4%B8%AD "));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let client = HistoryClient::new(&base, &ClientOptions::default()).unwrap();
        let err = client
            .fetch(&query(0, PageSize::default(), FilterType::All))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (base, _server) = serve_once("HTTP/1.1 200 OK", "<html>oops</html>").await;
        let client = HistoryClient::new(&base, &ClientOptions::default()).unwrap();
        let err = client
            .fetch(&query(0, PageSize::default(), FilterType::All))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = HistoryClient::new(&format!("http://{addr}"), &ClientOptions::default())
            .unwrap();
        let err = client
            .fetch(&query(0, PageSize::default(), FilterType::All))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Request { .. }));
    }
}
