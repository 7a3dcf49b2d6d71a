//! Typed events delivered on the event stream

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionStatus;
use crate::error::ClientError;

/// A complete text message as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Arrival order, starting at 0. Keeps counting across reconnects.
    pub sequence: u64,
    /// The reassembled UTF-8 payload, verbatim.
    pub text: String,
}

/// One-time payload the server sends on every new connection.
///
/// Identified by the presence of its subscription-acknowledgment field
/// (which the server spells `subcription`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeNotice {
    /// Subscription acknowledgment value.
    #[serde(rename = "subcription")]
    pub subscription: String,
    /// Human-readable greeting.
    #[serde(default)]
    pub message: String,
}

/// Registration-state change for a SIP account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEvent {
    /// Account name or id.
    pub account: String,
    /// Registration status string (e.g. `REGISTERED`).
    pub status: String,
}

/// State change for a call.
///
/// Only `id` and `state` are interpreted; the remaining fields are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Call id, as used by the command API (`/calls/{id}/...`).
    pub id: i64,
    /// Call state string (e.g. `CALLING`, `CONFIRMED`, `DISCONNECTED`).
    pub state: String,
    /// Call direction, if the server included it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Remote party, if the server included it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    /// Call duration in seconds, if the server included it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Everything the event socket reports, on one channel.
///
/// `Raw` fires for every received message; at most one of the typed
/// variants accompanies it. Status changes and socket errors share the
/// channel so a consumer observes the full connection history in order.
#[derive(Debug)]
#[non_exhaustive]
pub enum SocketEvent {
    /// The connection status changed. Fired once per actual change.
    StatusChanged {
        /// Status before the transition.
        previous: ConnectionStatus,
        /// Status after the transition.
        current: ConnectionStatus,
    },
    /// The server's connection greeting.
    Welcome(WelcomeNotice),
    /// An account registration-state change.
    Account(AccountEvent),
    /// A call state change.
    Call(CallEvent),
    /// The verbatim payload of a received message.
    Raw(RawMessage),
    /// A connect or receive failure. The socket keeps retrying; this is
    /// informational.
    Error(ClientError),
}
