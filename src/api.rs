//! HTTP client for the LegalZen service.
//!
//! Endpoints: `POST /` (multipart analyze), `POST /ask` (form Q&A),
//! `GET /demo` (canned analysis), `GET /health` (connectivity check).

use crate::document::SelectedDocument;
use crate::model::{AnalyzeResponse, AskResponse, ClientConfig};
use anyhow::{Context, Result};

#[derive(Clone)]
pub struct LegalZenClient {
    http: reqwest::Client,
    base_url: String,
}

impl LegalZenClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        // No timeout unless configured: an in-flight analyze is never
        // aborted by the client.
        if let Some(t) = cfg.request_timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a document for analysis.
    pub async fn analyze(&self, doc: &SelectedDocument) -> Result<AnalyzeResponse> {
        let mut part = reqwest::multipart::Part::bytes(doc.bytes.clone())
            .file_name(doc.file_name.clone());
        if let Some(mime) = doc.mime.as_deref() {
            part = part.mime_str(mime).context("invalid MIME type")?;
        }
        let form = reqwest::multipart::Form::new().part("document", part);

        let resp = self
            .http
            .post(self.url("/"))
            .multipart(form)
            .send()
            .await
            .context("could not reach the analysis service")?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        resp.json::<AnalyzeResponse>()
            .await
            .context("the analysis service returned an unreadable response")
    }

    /// Ask a follow-up question about the analyzed document.
    pub async fn ask(&self, session_key: &str, question: &str) -> Result<String> {
        let form = [("question", question), ("session_key", session_key)];
        let resp = self
            .http
            .post(self.url("/ask"))
            .form(&form)
            .send()
            .await
            .context("could not reach the analysis service")?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let parsed: AskResponse = resp
            .json()
            .await
            .context("the analysis service returned an unreadable answer")?;
        match (parsed.answer, parsed.error) {
            (Some(answer), _) => Ok(answer),
            (None, Some(error)) => Err(anyhow::anyhow!(error)),
            (None, None) => Err(anyhow::anyhow!("the service returned no answer")),
        }
    }

    /// Fetch the canned demo analysis.
    pub async fn demo(&self) -> Result<AnalyzeResponse> {
        let resp = self
            .http
            .get(self.url("/demo"))
            .send()
            .await
            .context("could not reach the analysis service")?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        resp.json::<AnalyzeResponse>()
            .await
            .context("the analysis service returned an unreadable response")
    }

    /// Connectivity check: any 2xx counts as healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .context("could not reach the analysis service")?;
        Ok(resp.status().is_success())
    }
}

/// Prefer the server-supplied `error` field; fall back to a generic message
/// when the body is missing or not JSON.
async fn error_from_response(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<AskResponse>(&body) {
        Ok(parsed) if parsed.error.is_some() => {
            anyhow::anyhow!(parsed.error.unwrap_or_default())
        }
        _ => anyhow::anyhow!("the service returned an error (HTTP {status})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> ClientConfig {
        ClientConfig {
            base_url,
            progress_step: Duration::from_millis(1),
            progress_linger: Duration::from_millis(1),
            request_timeout: None,
            user_agent: "legalzen-cli/test".into(),
        }
    }

    fn sample_document() -> SelectedDocument {
        SelectedDocument::from_parts("contract.pdf", None, b"%PDF-1.4 fake".to_vec()).unwrap()
    }

    #[tokio::test]
    async fn analyze_parses_success_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "S",
                "clauses": [{"title": "Term", "original": "O1", "simplified": "Si1"}],
                "session_key": "sk1"
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let resp = client.analyze(&sample_document()).await.unwrap();
        assert_eq!(resp.summary.as_deref(), Some("S"));
        assert_eq!(resp.session_key.as_deref(), Some("sk1"));
        let clauses = resp.clauses.unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].title.as_deref(), Some("Term"));
        assert!(clauses[0].explanation.is_none());
    }

    #[tokio::test]
    async fn analyze_surfaces_server_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "Could not extract text from document."
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let err = client.analyze(&sample_document()).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not extract text from document.");
    }

    #[tokio::test]
    async fn analyze_falls_back_to_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let err = client.analyze(&sample_document()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"), "got: {err}");
    }

    #[tokio::test]
    async fn analyze_rejects_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("this is not json {{{"))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let err = client.analyze(&sample_document()).await.unwrap_err();
        assert!(err.to_string().contains("unreadable"), "got: {err:#}");
    }

    #[tokio::test]
    async fn ask_sends_form_fields_and_parses_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_string_contains("question=What+is+the+term%3F"))
            .and(body_string_contains("session_key=sk1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Thirty days."
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let answer = client.ask("sk1", "What is the term?").await.unwrap();
        assert_eq!(answer, "Thirty days.");
    }

    #[tokio::test]
    async fn ask_surfaces_rate_limit_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "rate limited"
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let err = client.ask("sk1", "anything").await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
    }

    #[tokio::test]
    async fn demo_returns_analysis_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "Demo summary",
                "session_key": "demo_session"
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        let resp = client.demo().await.unwrap();
        assert_eq!(resp.session_key.as_deref(), Some("demo_session"));
    }

    #[tokio::test]
    async fn health_is_any_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy"
            })))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        assert!(client.health().await.unwrap());
    }

    #[tokio::test]
    async fn health_false_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = LegalZenClient::new(&test_config(server.uri())).unwrap();
        assert!(!client.health().await.unwrap());
    }
}
