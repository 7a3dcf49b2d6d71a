//! Command API client
//!
//! Stateless HTTP wrappers for the server's command surface. Every call is
//! a single request/response; connection-state concerns live entirely in
//! [`EventSocket`](crate::EventSocket).
//!
//! The server's responses are inconsistently structured (bare strings,
//! `null` bodies, plain text where JSON is documented), so all lenient
//! read paths go through one decode-or-default combinator instead of
//! hand-rolled fallbacks per endpoint.

use std::time::Duration;

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;
use crate::constants::USER_AGENT;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Account, AccountsEnvelope, ApiResponse, AppVersion, Call, CallsEnvelope, ConfigReport,
    DevicesReport, DialRequest, LoginRequest, TransferRequest,
};

/// Decode `body` as `T`, or build a fallback value from the raw text.
fn decode_or_else<T, F>(body: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce(&str) -> T,
{
    serde_json::from_str(body).unwrap_or_else(|_| fallback(body))
}

/// `null` and blank bodies stand in for an empty result on list endpoints.
fn is_empty_body(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty() || trimmed == "null"
}

/// HTTP client for the Tinyphone command API.
#[derive(Debug, Clone)]
pub struct CommandClient {
    http: reqwest::Client,
    base: Url,
}

impl CommandClient {
    /// Build a client for the configured server.
    pub fn new(settings: &Settings) -> ClientResult<Self> {
        let base = Url::parse(&settings.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, base })
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(ClientError::from)
    }

    /// Fetch a body, requiring a success status.
    async fn read_body(&self, path: &str) -> ClientResult<String> {
        let response = self
            .http
            .get(self.url(path)?)
            .send()
            .await?;
        let status = response.status();
        let body = response
            .text()
            .await?;
        debug!("GET {} -> {} ({} bytes)", path, status, body.len());
        if !status.is_success() {
            warn!("GET {} failed with {}: {}", path, status, body);
            return Err(ClientError::UnexpectedStatus { status, body });
        }
        Ok(body)
    }

    /// Synthesize a command outcome from the HTTP status.
    async fn ack(
        response: Response,
        ok_message: String,
        failed_message: String,
    ) -> ApiResponse {
        if response
            .status()
            .is_success()
        {
            ApiResponse::ok(ok_message)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_default();
            warn!("{}: {}", failed_message, body);
            ApiResponse::failed(failed_message, body)
        }
    }

    async fn post_ack(
        &self,
        path: &str,
        ok_message: String,
        failed_message: String,
    ) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .post(self.url(path)?)
            .send()
            .await?;
        Ok(Self::ack(response, ok_message, failed_message).await)
    }

    /// Application version from `GET /`.
    ///
    /// The server may answer with a JSON object, a bare JSON string, or
    /// plain text; anything unstructured degrades to a version of
    /// `Unknown` with the body as the message.
    pub async fn version(&self) -> ClientResult<AppVersion> {
        let body = self
            .read_body("/")
            .await?;
        Ok(decode_or_else(&body, |raw| AppVersion {
            message: serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string()),
            version: "Unknown".to_string(),
        }))
    }

    /// Register an account.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .post(self.url("/login")?)
            .json(request)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            "Login successful".to_string(),
            "Login failed".to_string(),
        )
        .await)
    }

    /// Unregister every account.
    pub async fn logout(&self) -> ClientResult<ApiResponse> {
        self.post_ack(
            "/logout",
            "Logout successful".to_string(),
            "Logout failed".to_string(),
        )
        .await
    }

    /// Registered accounts. `null` or blank bodies yield an empty list.
    pub async fn accounts(&self) -> ClientResult<Vec<Account>> {
        let body = self
            .read_body("/accounts")
            .await?;
        if is_empty_body(&body) {
            return Ok(Vec::new());
        }
        let envelope: AccountsEnvelope = decode_or_else(&body, |_| AccountsEnvelope::default());
        Ok(envelope.accounts)
    }

    /// Unregister a single account.
    pub async fn logout_account(&self, account_name: &str) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/accounts/{}/logout", account_name),
            format!("Account {} logout successful", account_name),
            format!("Account {} logout failed", account_name),
        )
        .await
    }

    /// Force a re-registration of an account.
    pub async fn reregister_account(&self, account_name: &str) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/accounts/{}/reregister", account_name),
            format!("Account {} re-registration successful", account_name),
            format!("Account {} re-registration failed", account_name),
        )
        .await
    }

    /// Place a call.
    pub async fn dial(&self, request: &DialRequest) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .post(self.url("/dial")?)
            .json(request)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Dial {} successful", request.uri),
            "Dial failed".to_string(),
        )
        .await)
    }

    /// Active calls. `null` or blank bodies yield an empty list.
    pub async fn calls(&self) -> ClientResult<Vec<Call>> {
        let body = self
            .read_body("/calls")
            .await?;
        if is_empty_body(&body) {
            return Ok(Vec::new());
        }
        let envelope: CallsEnvelope = decode_or_else(&body, |_| CallsEnvelope::default());
        Ok(envelope.calls)
    }

    /// Answer an incoming call.
    pub async fn answer(&self, call_id: i64) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/calls/{}/answer", call_id),
            format!("Answer call {} successful", call_id),
            "Answer call failed".to_string(),
        )
        .await
    }

    /// Send DTMF digits into a call.
    pub async fn send_dtmf(&self, call_id: i64, digits: &str) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/calls/{}/dtmf/{}", call_id, digits),
            format!("Send DTMF {} to call {} successful", digits, call_id),
            "Send DTMF failed".to_string(),
        )
        .await
    }

    /// Put a call on hold.
    pub async fn hold(&self, call_id: i64) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .put(self.url(&format!("/calls/{}/hold", call_id))?)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Hold call {} successful", call_id),
            "Hold call failed".to_string(),
        )
        .await)
    }

    /// Take a call off hold.
    pub async fn unhold(&self, call_id: i64) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .delete(self.url(&format!("/calls/{}/hold", call_id))?)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Unhold call {} successful", call_id),
            "Unhold call failed".to_string(),
        )
        .await)
    }

    /// Merge a call into a conference.
    pub async fn create_conference(&self, call_id: i64) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .put(self.url(&format!("/calls/{}/conference", call_id))?)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Create conference with call {} successful", call_id),
            "Create conference failed".to_string(),
        )
        .await)
    }

    /// Break a call out of a conference.
    pub async fn break_conference(&self, call_id: i64) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .delete(self.url(&format!("/calls/{}/conference", call_id))?)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Break call {} out of conference successful", call_id),
            "Break conference failed".to_string(),
        )
        .await)
    }

    /// Blind-transfer a call to a new destination.
    pub async fn transfer(
        &self,
        call_id: i64,
        request: &TransferRequest,
    ) -> ClientResult<ApiResponse> {
        let response = self
            .http
            .post(self.url(&format!("/calls/{}/transfer", call_id))?)
            .json(request)
            .send()
            .await?;
        Ok(Self::ack(
            response,
            format!("Transfer call {} to {} successful", call_id, request.uri),
            "Transfer call failed".to_string(),
        )
        .await)
    }

    /// Attended transfer: connect a call to another established call.
    pub async fn attended_transfer(
        &self,
        call_id: i64,
        dest_call_id: i64,
    ) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/calls/{}/attended-transfer/{}", call_id, dest_call_id),
            format!(
                "Attended transfer call {} to {} successful",
                call_id, dest_call_id
            ),
            "Attended transfer failed".to_string(),
        )
        .await
    }

    /// Hang up a call.
    pub async fn hangup(&self, call_id: i64) -> ClientResult<ApiResponse> {
        self.post_ack(
            &format!("/calls/{}/hangup", call_id),
            format!("Hangup call {} successful", call_id),
            "Hangup call failed".to_string(),
        )
        .await
    }

    /// Hang up every active call.
    pub async fn hangup_all(&self) -> ClientResult<ApiResponse> {
        self.post_ack(
            "/hangup_all",
            "Hangup all calls successful".to_string(),
            "Hangup all calls failed".to_string(),
        )
        .await
    }

    /// Audio devices known to the server.
    pub async fn devices(&self) -> ClientResult<DevicesReport> {
        let body = self
            .read_body("/devices")
            .await?;
        if is_empty_body(&body) {
            return Ok(DevicesReport {
                message: "No devices".to_string(),
                ..DevicesReport::default()
            });
        }
        Ok(decode_or_else(&body, |_| DevicesReport {
            message: "Failed to parse devices response".to_string(),
            ..DevicesReport::default()
        }))
    }

    /// Server configuration summary.
    pub async fn config(&self) -> ClientResult<ConfigReport> {
        let body = self
            .read_body("/config")
            .await?;
        if is_empty_body(&body) {
            return Ok(ConfigReport {
                version: "Unknown".to_string(),
            });
        }
        Ok(decode_or_else(&body, |_| ConfigReport {
            version: "Failed to parse".to_string(),
        }))
    }

    /// Ask the server process to exit.
    pub async fn exit(&self) -> ClientResult<ApiResponse> {
        self.post_ack(
            "/exit",
            "Exit application successful".to_string(),
            "Exit application failed".to_string(),
        )
        .await
    }
}
