//! Backend submission and session-token verification.

use serde::{Deserialize, Serialize};
use thermogrid_engine::{ColumnSpec, Dataset, Record, Value};
use ureq::Agent;

use crate::chart::png_data_url;
use crate::config::Config;
use crate::error::{Result, ThermogridError};

/// Body posted to the submission endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct SubmissionPayload {
    pub token: Option<String>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Record>,
    /// PNG snapshot as a `data:image/png;base64,...` URL, or null.
    pub chart1: Option<String>,
    pub chart2: Option<String>,
}

impl SubmissionPayload {
    pub fn new(
        token: Option<&str>,
        dataset: &Dataset,
        chart1: Option<&[u8]>,
        chart2: Option<&[u8]>,
    ) -> Self {
        SubmissionPayload {
            token: token.map(str::to_string),
            columns: dataset.schema().to_specs(),
            rows: dataset.rows().rows(),
            chart1: chart1.map(png_data_url),
            chart2: chart2.map(png_data_url),
        }
    }
}

/// Outcome of a token lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Verification {
    /// Token accepted. Either part may be absent when the backend has no
    /// stored data for the session yet.
    Valid {
        columns: Option<Vec<ColumnSpec>>,
        rows: Option<Vec<Record>>,
    },
    Invalid { reason: Option<String> },
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    result: Option<VerifyResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct VerifyResult {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    columns_data: Option<Vec<ColumnSpec>>,
    #[serde(default)]
    rows_data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

impl VerifyResponse {
    fn into_verification(self) -> Verification {
        match self.result {
            Some(result) if result.valid => Verification::Valid {
                columns: result.columns_data,
                rows: result.rows_data.map(|rows| {
                    rows.iter()
                        .map(|row| {
                            row.iter()
                                .map(|(k, v)| (k.clone(), Value::from_json(v)))
                                .collect()
                        })
                        .collect()
                }),
            },
            _ => Verification::Invalid {
                reason: self.error.map(|e| match e {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                }),
            },
        }
    }
}

/// Blocking HTTP client for the backend endpoints.
pub struct RemoteClient {
    http: Agent,
    submit_url: String,
    verify_url: String,
    redirect_url: String,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout_read(config.timeout())
            .timeout_write(config.timeout())
            .timeout_connect(config.timeout())
            .build();
        RemoteClient {
            http,
            submit_url: config.submit_url.clone(),
            verify_url: config.verify_url.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }

    /// Post the payload. On success returns the page the backend expects the
    /// user to continue on.
    pub fn submit(&self, payload: &SubmissionPayload) -> Result<String> {
        if self.submit_url.trim().is_empty() {
            return Err(ThermogridError::NoEndpoint("submission"));
        }
        log::info!(
            "submitting {} rows, {} columns to {}",
            payload.rows.len(),
            payload.columns.len(),
            self.submit_url
        );
        let response = self.post(&self.submit_url, payload, ThermogridError::Submission)?;
        if response.status() >= 300 {
            return Err(ThermogridError::Submission(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(self.redirect_url.clone())
    }

    /// Resolve a session token against the verification endpoint.
    pub fn verify(&self, token: &str) -> Result<Verification> {
        if self.verify_url.trim().is_empty() {
            return Err(ThermogridError::NoEndpoint("verification"));
        }
        let body = serde_json::json!({ "token": token });
        let response = self.post(&self.verify_url, &body, ThermogridError::Verification)?;
        let parsed: VerifyResponse = response
            .into_json()
            .map_err(|err| ThermogridError::Http(err.to_string()))?;
        Ok(parsed.into_verification())
    }

    /// Post `body` as JSON. A non-2xx status becomes the error built by `rejected`.
    fn post<T: Serialize>(
        &self,
        url: &str,
        body: &T,
        rejected: fn(String) -> ThermogridError,
    ) -> Result<ureq::Response> {
        match self
            .http
            .post(url)
            .set("Content-Type", "application/json")
            .send_json(body)
        {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(rejected(format!("HTTP {}: {}", code, text.trim())))
            }
            Err(err) => Err(ThermogridError::Http(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use thermogrid_engine::presets::temperature_monitoring;

    /// Accept one request, answer with `status` and `body`, return the
    /// request body.
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/endpoint", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request = vec![0u8; content_length];
            reader.read_exact(&mut request).unwrap();
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            String::from_utf8(request).unwrap()
        });
        (url, handle)
    }

    fn client(url: &str) -> RemoteClient {
        RemoteClient::new(&Config {
            submit_url: url.to_string(),
            verify_url: url.to_string(),
            redirect_url: "http://backend/web".to_string(),
            timeout_secs: 5,
            ..Config::default()
        })
    }

    fn dataset() -> Dataset {
        Dataset::new(temperature_monitoring().unwrap()).append_row(
            Record::new()
                .with("thermocouple2_middle", 36.5)
                .with("thermocouple3_top", 34.0),
        )
    }

    #[test]
    fn test_payload_shape() {
        let payload = SubmissionPayload::new(Some("tok"), &dataset(), Some(b"png"), None);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["columns"].as_array().unwrap().len(), 6);
        assert_eq!(json["columns"][5]["editable"], false);
        assert_eq!(json["rows"][0]["temperature_differential"], 2.5);
        assert_eq!(json["chart1"], "data:image/png;base64,cG5n");
        assert!(json["chart2"].is_null());
    }

    #[test]
    fn test_submit_success_returns_redirect() {
        let (url, server) = serve_once(200, "{}");
        let payload = SubmissionPayload::new(Some("tok"), &dataset(), None, None);
        let redirect = client(&url).submit(&payload).unwrap();
        assert_eq!(redirect, "http://backend/web");
        let body: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(body["token"], "tok");
    }

    #[test]
    fn test_submit_rejected() {
        let (url, server) = serve_once(500, "{\"error\":\"boom\"}");
        let payload = SubmissionPayload::new(None, &dataset(), None, None);
        let err = client(&url).submit(&payload).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ThermogridError::Submission(msg) if msg.contains("500")));
    }

    #[test]
    fn test_verify_valid_with_data() {
        let (url, server) = serve_once(
            200,
            r#"{"result":{"valid":true,
                "columns_data":[{"field":"a","headerName":"A","editable":true,"type":"numericColumn"}],
                "rows_data":[{"a":1.5},{"a":null}]}}"#,
        );
        let verification = client(&url).verify("abc").unwrap();
        let request: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(request, serde_json::json!({"token": "abc"}));
        match verification {
            Verification::Valid { columns, rows } => {
                assert_eq!(columns.unwrap()[0].field, "a");
                let rows = rows.unwrap();
                assert_eq!(rows[0].get("a"), Some(&Value::Number(1.5)));
                assert_eq!(rows[1].get("a"), Some(&Value::empty()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_verify_invalid() {
        let (url, server) = serve_once(200, r#"{"result":{"valid":false},"error":"expired"}"#);
        let verification = client(&url).verify("old").unwrap();
        server.join().unwrap();
        assert_eq!(
            verification,
            Verification::Invalid {
                reason: Some("expired".to_string())
            }
        );
    }

    #[test]
    fn test_verify_rejected_status() {
        let (url, server) = serve_once(403, "forbidden");
        let err = client(&url).verify("abc").unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ThermogridError::Verification(msg) if msg.contains("403")));
    }

    #[test]
    fn test_missing_endpoint() {
        let c = RemoteClient::new(&Config {
            submit_url: String::new(),
            ..Config::default()
        });
        let payload = SubmissionPayload::new(None, &dataset(), None, None);
        assert!(matches!(c.submit(&payload), Err(ThermogridError::NoEndpoint(_))));
    }
}
