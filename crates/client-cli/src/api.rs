//! Backend API client.
//!
//! Every authenticated request reads the bearer credential fresh from the
//! session gate at construction time; nothing caches it. A 401-class
//! response is reported to the gate (implicit sign-out) and surfaced as
//! [`ApiError::Unauthorized`].

use std::path::Path;
use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::company::{validate_siren_format, RegistryError, RegistryResponse};
use shared::{CompanyInfo, Invoice, NewInvoice, ProfileUpdate, UserProfile};

use crate::session::SessionGate;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected our credential; the gate has already been told.
    #[error("session expired, please log in again")]
    Unauthorized,
    /// Backend or network unreachable, or a malformed response.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Well-formed request rejected for domain reasons.
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// Input refused client-side, before any network call.
    #[error("{detail}")]
    Validation { detail: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Error payload the backend attaches to rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct AiQuery<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct AiAnswer {
    answer: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    gate: Arc<SessionGate>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, gate: Arc<SessionGate>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            gate,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Attach the current credential, or fail fast when there is none.
    fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        match self.gate.access_token() {
            Some(token) => Ok(req.bearer_auth(token)),
            None => Err(ApiError::Unauthorized),
        }
    }

    /// Common response handling: 401 clears the session via the gate,
    /// other failures become domain rejections with the backend's detail
    /// when it sent one.
    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.gate.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ApiError::Rejected { status, detail });
        }
        Ok(resp)
    }

    /// Fetch the authoritative invoice list.
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        let req = self.authorize(self.http.get(self.endpoint("invoices/list")))?;
        let resp = self.check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Create an invoice from form fields. The server assigns id, initial
    /// status, score and possible financing.
    pub async fn create_invoice(&self, new: &NewInvoice) -> Result<Invoice, ApiError> {
        let req = self.authorize(self.http.post(self.endpoint("invoices/create")))?;
        let resp = self.check(req.json(new).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Upload an invoice document; the server extracts the fields. Only
    /// PDF files are accepted, checked here before any network call.
    pub async fn upload_invoice(&self, path: &Path) -> Result<Invoice, ApiError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ApiError::Validation {
                detail: "only PDF files can be uploaded".to_string(),
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Validation {
            detail: format!("cannot read {}: {}", path.display(), e),
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice.pdf")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let req = self.authorize(self.http.post(self.endpoint("invoices/upload")))?;
        let resp = self.check(req.multipart(form).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Trigger the send transition for one invoice. No meaningful body;
    /// the authoritative status change is observed on the next list fetch.
    pub async fn send_invoice(&self, invoice_id: &str) -> Result<(), ApiError> {
        let req = self.authorize(
            self.http
                .post(self.endpoint(&format!("invoices/{}/send", invoice_id))),
        )?;
        self.check(req.send().await?).await?;
        Ok(())
    }

    /// Ask the assistant a free-form question about the user's invoices.
    /// Answering happens entirely server-side; the client only relays text.
    pub async fn ask(&self, query: &str) -> Result<String, ApiError> {
        let req = self.authorize(self.http.post(self.endpoint("ai/query")))?;
        let resp = self.check(req.json(&AiQuery { query }).send().await?).await?;
        let body: AiAnswer = resp.json().await?;
        Ok(body.answer)
    }

    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        let req = self.authorize(self.http.get(self.endpoint("users/me")))?;
        let resp = self.check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let req = self.authorize(self.http.put(self.endpoint("users/me")))?;
        let resp = self.check(req.json(update).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Look up a company by SIREN. Format errors never reach the network;
    /// 404 and 400 from the registry map to their distinguished errors.
    pub async fn validate_siren(&self, siren: &str) -> Result<CompanyInfo, ApiError> {
        if !validate_siren_format(siren) {
            return Err(RegistryError::InvalidFormat.into());
        }

        let req = self.authorize(
            self.http
                .get(self.endpoint(&format!("siren/validate/{}", siren))),
        )?;
        let resp = req.send().await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            self.gate.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        match resp.status() {
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound.into()),
            StatusCode::BAD_REQUEST => Err(RegistryError::InvalidFormat.into()),
            status if status.is_success() => {
                let body: RegistryResponse = resp.json().await?;
                Ok(CompanyInfo::from(body))
            }
            status => Err(RegistryError::Unavailable(status.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionUser};

    fn gate_with_token(token: &str) -> Arc<SessionGate> {
        let gate = Arc::new(SessionGate::new());
        gate.initialize(Some(
            Session::new(token.to_string(), "r".to_string(), SessionUser::default()).unwrap(),
        ));
        gate
    }

    #[test]
    fn test_requests_without_session_fail_fast() {
        let gate = Arc::new(SessionGate::new());
        gate.initialize(None);
        let client = ApiClient::new("https://api.example.com", gate);
        let result = client.authorize(client.http.get("https://api.example.com/x"));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_bearer_token_is_read_fresh_per_request() {
        let gate = gate_with_token("first");
        let client = ApiClient::new("https://api.example.com", gate.clone());

        let req = client
            .authorize(client.http.get("https://api.example.com/x"))
            .unwrap()
            .build()
            .unwrap();
        let auth = req.headers().get("authorization").unwrap();
        assert_eq!(auth, "Bearer first");

        // A provider refresh replaces the credential; the next request
        // picks it up without any client-side caching.
        gate.sign_in(
            Session::new("second".to_string(), "r".to_string(), SessionUser::default()).unwrap(),
        );
        let req = client
            .authorize(client.http.get("https://api.example.com/x"))
            .unwrap()
            .build()
            .unwrap();
        let auth = req.headers().get("authorization").unwrap();
        assert_eq!(auth, "Bearer second");
    }

    #[tokio::test]
    async fn test_siren_format_checked_before_any_network_call() {
        // Unroutable base URL: if the format check did not short-circuit,
        // this would fail with a network error instead.
        let client = ApiClient::new("http://127.0.0.1:0", gate_with_token("tok"));
        let err = client.validate_siren("12AB").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Registry(RegistryError::InvalidFormat)
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf_before_network() {
        let client = ApiClient::new("http://127.0.0.1:0", gate_with_token("tok"));
        let err = client
            .upload_invoice(Path::new("/tmp/invoice.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_ask_is_gated_on_a_session() {
        // Unroutable base URL: the missing session must fail the call
        // before anything goes on the wire.
        let gate = Arc::new(SessionGate::new());
        gate.initialize(None);
        let client = ApiClient::new("http://127.0.0.1:0", gate);
        let err = client.ask("which invoices are overdue?").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_ai_answer_deserialization() {
        let body: AiAnswer = serde_json::from_str(r#"{"answer":"INV-100 is overdue"}"#).unwrap();
        assert_eq!(body.answer, "INV-100 is overdue");
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = ApiClient::new("https://api.example.com/", gate_with_token("tok"));
        assert_eq!(
            client.endpoint("invoices/list"),
            "https://api.example.com/invoices/list"
        );
    }
}
