//! Protocol constants and configuration defaults

/// Default base address of the Tinyphone HTTP API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:6060";

/// Default request timeout for the command API, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path of the event stream endpoint, appended to the base address.
pub const EVENTS_PATH: &str = "/events";

/// WebSocket handshake deadline in milliseconds.
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Delay between reconnect attempts in milliseconds.
pub const RECONNECT_DELAY_MS: u64 = 5_000;

/// Maximum number of queued events before dropping.
pub const MAX_EVENT_QUEUE_SIZE: usize = 1000;

/// Marker field identifying the one-time welcome payload.
/// Spelled exactly as the server sends it.
pub const WELCOME_MARKER: &str = "subcription";

/// `type` field value for account registration events.
pub const EVENT_TYPE_ACCOUNT: &str = "ACCOUNT";

/// `type` field value for call state events.
pub const EVENT_TYPE_CALL: &str = "CALL";

/// User-Agent header sent with command API requests.
pub const USER_AGENT: &str = concat!("tinyphone-tokio/", env!("CARGO_PKG_VERSION"));
