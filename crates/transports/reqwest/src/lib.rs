use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::transport::{
    emit_transport_event, ByteStream, HttpTransport, TransportBody, TransportConfig,
    TransportEvent,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    fn configure_builder(
        mut builder: reqwest::ClientBuilder,
        cfg: &TransportConfig,
    ) -> reqwest::ClientBuilder {
        builder = builder
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Duration::from_secs(90));
        if let Some(req_timeout) = cfg.request_timeout {
            builder = builder.timeout(req_timeout);
        }
        builder.connect_timeout(cfg.connect_timeout)
    }

    fn try_new_with_builder(
        cfg: &TransportConfig,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, TransportError> {
        let builder = Self::configure_builder(builder, cfg);
        let client = builder.build().map_err(|err| {
            TransportError::Other(format!(
                "reqwest client build failed: {}",
                format_reqwest_error_chain(&err)
            ))
        })?;
        Ok(Self { client })
    }

    fn new_with_builder(cfg: &TransportConfig, builder: reqwest::ClientBuilder) -> Self {
        match Self::try_new_with_builder(cfg, builder) {
            Ok(transport) => transport,
            Err(err) => {
                debug!(
                    target: "chat_stream::transport::reqwest",
                    error = %err,
                    "falling back to reqwest::Client::new after transport init failure"
                );
                Self {
                    client: Client::new(),
                }
            }
        }
    }

    pub fn try_new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        Self::try_new_with_builder(cfg, Client::builder())
    }

    pub fn new(cfg: &TransportConfig) -> Self {
        Self::new_with_builder(cfg, Client::builder())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

/// What was sent, kept around so every exit path can report it.
struct RequestRecord {
    started_at: SystemTime,
    start_instant: Instant,
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<TransportBody>,
    is_stream: bool,
}

impl RequestRecord {
    fn capture(
        req: &RequestBuilder,
        fallback_url: &str,
        body: Option<Value>,
        stream: bool,
    ) -> Self {
        let snapshot = req.try_clone().and_then(|r| r.build().ok());
        let (method, url, headers) = match snapshot.as_ref() {
            Some(built) => (
                built.method().to_string(),
                built.url().to_string(),
                header_pairs(built.headers()),
            ),
            None => (
                if body.is_some() { "POST" } else { "GET" }.to_string(),
                fallback_url.to_string(),
                Vec::new(),
            ),
        };
        Self {
            started_at: SystemTime::now(),
            start_instant: Instant::now(),
            method,
            url,
            headers,
            body: body.map(TransportBody::Json),
            is_stream: stream,
        }
    }

    fn emit(
        self,
        status: Option<u16>,
        response_headers: Vec<(String, String)>,
        response_body: Option<TransportBody>,
        error: Option<String>,
    ) {
        let response_size = match &response_body {
            Some(TransportBody::Text(text)) => Some(text.len()),
            Some(TransportBody::Json(json)) => Some(json.to_string().len()),
            None => None,
        };
        emit_transport_event(TransportEvent {
            started_at: self.started_at,
            latency: Some(self.start_instant.elapsed()),
            method: self.method,
            url: self.url,
            status,
            request_headers: self.headers,
            response_headers,
            request_body: self.body,
            response_body,
            response_size,
            error,
            is_stream: self.is_stream,
        });
    }
}

async fn send_recorded(
    req: RequestBuilder,
    record: RequestRecord,
    cfg: &TransportConfig,
) -> Result<(Response, RequestRecord), TransportError> {
    match req.send().await {
        Ok(resp) => Ok((resp, record)),
        Err(e) => {
            let detail = format_reqwest_error_chain(&e);
            debug!(target: "chat_stream::transport::reqwest", %detail, "reqwest send failed");
            record.emit(None, Vec::new(), None, Some(detail.clone()));
            Err(if e.is_connect() {
                TransportError::Network(format!("connect: {detail}"))
            } else if e.is_timeout() {
                TransportError::ConnectTimeout(cfg.connect_timeout)
            } else {
                TransportError::Network(detail)
            })
        }
    }
}

/// Drain a non-success response into `TransportError::HttpStatus`.
async fn status_error(resp: Response, record: RequestRecord) -> TransportError {
    let status = resp.status().as_u16();
    let res_headers = header_pairs(resp.headers());
    let body_text = resp.text().await.unwrap_or_default();
    let err = build_http_status_transport_error(status, body_text.clone(), res_headers.clone());
    record.emit(
        Some(status),
        res_headers,
        Some(TransportBody::Text(body_text)),
        Some(err.to_string()),
    );
    err
}

fn has_no_body(status: StatusCode, content_length: Option<u64>) -> bool {
    status == StatusCode::NO_CONTENT || content_length == Some(0)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    type StreamResponse = (ByteStream, Vec<(String, String)>);

    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Vec<(String, String)>) {
        resp
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError> {
        let mut req = self.client.post(url).json(body);
        for (k, v) in headers {
            // .json() already sets it
            if !k.eq_ignore_ascii_case("content-type") {
                req = req.header(k, v);
            }
        }

        let record = RequestRecord::capture(&req, url, Some(body.clone()), true);
        let (resp, record) = send_recorded(req, record, cfg).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(resp, record).await);
        }

        let res_headers = header_pairs(resp.headers());
        if has_no_body(status, resp.content_length()) {
            let err = TransportError::MissingBody;
            record.emit(
                Some(status.as_u16()),
                res_headers,
                None,
                Some(err.to_string()),
            );
            return Err(err);
        }
        record.emit(Some(status.as_u16()), res_headers.clone(), None, None);

        let idle = cfg.idle_read_timeout;
        let mut inner = resp.bytes_stream();
        let s = async_stream::try_stream! {
            loop {
                let next = tokio::time::timeout(idle, inner.next()).await;
                match next {
                    Err(_) => Err(TransportError::IdleReadTimeout(idle))?,
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        if e.is_timeout() { Err(TransportError::IdleReadTimeout(idle))?; }
                        else { Err(TransportError::BodyRead(format_reqwest_error_chain(&e)))?; }
                    }
                    Ok(Some(Ok(bytes))) => { yield bytes; }
                }
            }
        };
        Ok((Box::pin(s), res_headers))
    }

    async fn get_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        cfg: &TransportConfig,
    ) -> Result<(Value, Vec<(String, String)>), TransportError> {
        let mut req = self.client.get(url);
        for (k, v) in headers {
            req = req.header(k, v);
        }

        let record = RequestRecord::capture(&req, url, None, false);
        let (resp, record) = send_recorded(req, record, cfg).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(resp, record).await);
        }

        let res_headers = header_pairs(resp.headers());
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;
        let json: Value = serde_json::from_str(&text)
            .map_err(|_| TransportError::BodyRead("invalid json".into()))?;
        record.emit(
            Some(status.as_u16()),
            res_headers.clone(),
            Some(TransportBody::Json(json.clone())),
            None,
        );
        Ok((json, res_headers))
    }
}

fn header_pairs(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn format_reqwest_error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(src) = current {
        out.push_str(": ");
        out.push_str(&src.to_string());
        current = src.source();
    }
    out
}
