//! Request and response payloads for the command API

use serde::{Deserialize, Serialize};

/// Application version information from `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    /// Server greeting or raw body when the response was not structured.
    #[serde(default)]
    pub message: String,
    /// Version string, `Unknown` when the server did not report one.
    #[serde(default)]
    pub version: String,
}

/// SIP account login request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Optional login id, when distinct from the username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Account password.
    pub password: String,
    /// SIP domain to register against.
    pub domain: String,
    /// Optional outbound proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

/// Dial request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialRequest {
    /// Destination SIP URI or number.
    pub uri: String,
    /// Account to dial from.
    pub account: String,
}

/// Blind transfer request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Destination SIP URI.
    pub uri: String,
}

/// A registered SIP account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account name used in command paths.
    #[serde(default)]
    pub account_name: String,
    /// SIP username.
    #[serde(default)]
    pub username: String,
    /// SIP domain.
    #[serde(default)]
    pub domain: String,
    /// Registration status string.
    #[serde(default)]
    pub status: String,
}

/// An active call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Call id string as reported by the server.
    #[serde(default)]
    pub call_id: String,
    /// Call direction.
    #[serde(default)]
    pub direction: String,
    /// Remote party URI.
    #[serde(default)]
    pub remote_uri: String,
    /// Local party URI.
    #[serde(default)]
    pub local_uri: String,
    /// Call state string.
    #[serde(default)]
    pub state: String,
    /// Call duration in seconds.
    #[serde(default)]
    pub duration: i64,
}

/// Outcome of a command, synthesized from the HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the server accepted the command.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Server-provided error body on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Successful outcome with the given description.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    /// Failed outcome with the given description and server error body.
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

/// Envelope for `GET /accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsEnvelope {
    /// Registered accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Envelope for `GET /calls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallsEnvelope {
    /// Active calls.
    #[serde(default)]
    pub calls: Vec<Call>,
}

/// An audio device known to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    /// Device id.
    #[serde(default)]
    pub id: i64,
    /// Device name.
    #[serde(default)]
    pub name: String,
    /// Audio driver backing the device.
    #[serde(default)]
    pub driver: String,
    /// Number of input channels.
    #[serde(default)]
    pub input_count: i64,
    /// Number of output channels.
    #[serde(default)]
    pub output_count: i64,
}

/// Response for `GET /devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicesReport {
    /// Server-provided description.
    #[serde(default)]
    pub message: String,
    /// Number of devices.
    #[serde(default)]
    pub count: i64,
    /// The devices themselves.
    #[serde(default)]
    pub devices: Vec<AudioDevice>,
}

/// Response for `GET /config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReport {
    /// Server version string.
    #[serde(default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_omits_empty_optionals() {
        let request = LoginRequest {
            username: "alice".into(),
            password: "secret".into(),
            domain: "example.com".into(),
            ..LoginRequest::default()
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("login"));
        assert!(!json.contains("proxy"));
        assert!(json.contains(r#""username":"alice""#));
    }

    #[test]
    fn account_uses_snake_case_wire_names() {
        let account: Account = serde_json::from_str(
            r#"{"account_name":"work","username":"alice","domain":"example.com","status":"Registered"}"#,
        )
        .unwrap();
        assert_eq!(account.account_name, "work");
        assert_eq!(account.status, "Registered");
    }

    #[test]
    fn call_fields_default_when_absent() {
        let call: Call = serde_json::from_str(r#"{"call_id":"12","state":"CONFIRMED"}"#).unwrap();
        assert_eq!(call.call_id, "12");
        assert_eq!(call.duration, 0);
        assert_eq!(call.remote_uri, "");
    }

    #[test]
    fn devices_report_decodes_camel_case() {
        let report: DevicesReport = serde_json::from_str(
            r#"{"message":"ok","count":1,"devices":[{"id":0,"name":"default","driver":"ALSA","inputCount":2,"outputCount":2}]}"#,
        )
        .unwrap();
        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.devices[0].input_count, 2);
    }
}
