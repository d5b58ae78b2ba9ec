//! Checking-service transport over HTTP.
//!
//! Sends the text as an `application/x-www-form-urlencoded` POST and decodes
//! the JSON reply with [`decode_check_result`].

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{ACCEPT, HeaderValue};
use spellreview_core::error::{TransportError, TransportResult};
use spellreview_core::transport::{
    CheckRequest, CheckResult, CheckTransport, decode_check_result,
};

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const REQUESTED_WITH: &str = "X-Requested-With";

/// [`CheckTransport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The service URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CheckTransport for HttpTransport {
    async fn check(&self, request: &CheckRequest) -> TransportResult<CheckResult> {
        tracing::debug!(
            endpoint = %self.endpoint,
            field = %request.field,
            text_len = request.text.len(),
            "posting check request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_JSON))
            .header(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"))
            .form(&request.form_pairs())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "checking service rejected request");
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        decode_check_result(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with `status` and `body`; the task yields the raw
    /// request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/check", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0_u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(raw).unwrap()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= header_end + 4 + length
    }

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(url, Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn builds_with_timeout() {
        let transport =
            HttpTransport::new("http://127.0.0.1:9/check", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/check");
    }

    #[tokio::test]
    async fn posts_form_with_text_first_and_ajax_headers() {
        let (url, server) = serve_once("200 OK", r#"{"success":true,"errors":false}"#).await;
        let request = CheckRequest::new("Helo wrold & more")
            .with_field("content")
            .with_extra("lang", "en_US");

        let result = transport(&url).check(&request).await.unwrap();
        assert_eq!(result, CheckResult::clean());

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let head = head.to_ascii_lowercase();
        assert!(head.starts_with("post /check http/1.1"));
        assert!(head.contains("content-type: application/x-www-form-urlencoded"));
        assert!(head.contains("accept: application/json, text/javascript, */*; q=0.01"));
        assert!(head.contains("x-requested-with: xmlhttprequest"));
        assert_eq!(body, "content=Helo+wrold+%26+more&lang=en_US");
    }

    #[tokio::test]
    async fn success_body_is_decoded_in_service_order() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"success":true,"errors":true,"words":{"wrold":["world"],"Helo":["Hello","Help"]}}"#,
        )
        .await;

        let result = transport(&url)
            .check(&CheckRequest::new("Helo wrold"))
            .await
            .unwrap();
        server.await.unwrap();

        assert!(result.success);
        assert!(result.has_errors);
        assert_eq!(result.words.words().collect::<Vec<_>>(), vec!["wrold", "Helo"]);
        assert_eq!(
            result.words.get("Helo"),
            Some(&["Hello".to_string(), "Help".to_string()][..])
        );
    }

    #[tokio::test]
    async fn error_status_maps_to_status() {
        let (url, server) = serve_once("500 Internal Server Error", "oops").await;

        let err = transport(&url)
            .check(&CheckRequest::new("Helo wrold"))
            .await
            .unwrap_err();
        server.await.unwrap();
        assert_eq!(err, TransportError::Status(500));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>").await;

        let err = transport(&url)
            .check(&CheckRequest::new("Helo wrold"))
            .await
            .unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/check", listener.local_addr().unwrap());
        drop(listener);

        let err = transport(&url)
            .check(&CheckRequest::new("Helo wrold"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
