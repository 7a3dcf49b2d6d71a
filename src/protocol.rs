//! Frame reassembly and message classification

use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use crate::constants::{EVENT_TYPE_ACCOUNT, EVENT_TYPE_CALL, WELCOME_MARKER};
use crate::error::ClientResult;
use crate::event::{AccountEvent, CallEvent, RawMessage, WelcomeNotice};

/// What one transport frame contributed to the stream.
#[derive(Debug)]
pub(crate) enum Step {
    /// A logical message completed.
    Complete(RawMessage),
    /// The frame was consumed without completing a message.
    Pending,
    /// The server sent a close frame; the receive cycle is over.
    Closed,
}

/// Accumulates transport fragments into complete logical messages.
///
/// The byte buffer belongs to the current connection epoch and is cleared
/// by [`reset`](Self::reset); the sequence counter is not, so arrival order
/// stays monotonic across reconnects.
#[derive(Debug, Default)]
pub(crate) struct FrameAssembler {
    buffer: Vec<u8>,
    sequence: u64,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partial message left over from a dead connection.
    pub fn reset(&mut self) {
        self.buffer
            .clear();
    }

    /// Append one fragment of a text message.
    pub fn push_fragment(&mut self, payload: &[u8]) {
        self.buffer
            .extend_from_slice(payload);
    }

    /// End of logical message: decode the accumulator and emit.
    pub fn complete(&mut self) -> ClientResult<RawMessage> {
        let bytes = std::mem::take(&mut self.buffer);
        let text = String::from_utf8(bytes)?;
        let sequence = self.sequence;
        self.sequence += 1;
        Ok(RawMessage { sequence, text })
    }

    /// Feed one received frame.
    ///
    /// Text frames complete a logical message (the transport reassembles
    /// continuations before they reach us, so every text frame is final).
    /// Binary frames are never produced by this server and are ignored.
    pub fn push(&mut self, message: Message) -> ClientResult<Step> {
        match message {
            Message::Text(text) => {
                self.push_fragment(text.as_bytes());
                Ok(Step::Complete(self.complete()?))
            }
            Message::Binary(payload) => {
                debug!("ignoring unexpected binary frame ({} bytes)", payload.len());
                Ok(Step::Pending)
            }
            Message::Ping(_) | Message::Pong(_) => {
                trace!("ignoring ping/pong frame");
                Ok(Step::Pending)
            }
            Message::Close(frame) => {
                debug!("close frame received: {:?}", frame);
                Ok(Step::Closed)
            }
            Message::Frame(_) => {
                trace!("ignoring raw frame");
                Ok(Step::Pending)
            }
        }
    }
}

/// Semantic kind of a logical message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Classification {
    /// The server's connection greeting.
    Welcome(WelcomeNotice),
    /// An account registration-state change.
    Account(AccountEvent),
    /// A call state change.
    Call(CallEvent),
    /// Anything else; delivered as raw text only.
    Unclassified,
}

/// Classify a logical message. First match wins; a decode failure at any
/// stage falls through rather than failing the message.
pub(crate) fn classify(text: &str) -> Classification {
    if text.contains(WELCOME_MARKER) {
        if let Ok(notice) = serde_json::from_str::<WelcomeNotice>(text) {
            return Classification::Welcome(notice);
        }
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return Classification::Unclassified;
    };
    let Some(kind) = value
        .get("type")
        .and_then(|v| v.as_str())
    else {
        return Classification::Unclassified;
    };

    if kind.eq_ignore_ascii_case(EVENT_TYPE_ACCOUNT) {
        match serde_json::from_value::<AccountEvent>(value) {
            Ok(event) => Classification::Account(event),
            Err(_) => Classification::Unclassified,
        }
    } else if kind.eq_ignore_ascii_case(EVENT_TYPE_CALL) {
        match serde_json::from_value::<CallEvent>(value) {
            Ok(event) => Classification::Call(event),
            Err(_) => Classification::Unclassified,
        }
    } else {
        debug!("unrecognized event type: {}", kind);
        Classification::Unclassified
    }
}
