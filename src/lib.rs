//! Tinyphone client for Rust
//!
//! This crate provides an async Rust client for the [Tinyphone] softphone
//! control server: a command API for issuing calls and an event socket
//! that streams account and call state changes in real time.
//!
//! # Architecture
//!
//! The event side uses a split socket/stream design:
//! - [`EventSocket`] (Clone + Send) — control the connection and send
//!   messages from any task
//! - [`EventStream`] — receive typed [`SocketEvent`]s in arrival order
//!
//! [`EventSocket::run`] drives the connection: it connects to the server's
//! `/events` WebSocket endpoint (derived from the configured base address),
//! reads until the connection drops, then waits a fixed delay and
//! reconnects, forever, until [`EventSocket::disconnect`] is called.
//! Consumers never handle transport errors directly; they observe
//! [`ConnectionStatus`] transitions and error events on the stream.
//!
//! The command side ([`CommandClient`]) is a stateless HTTP wrapper:
//! login, dial, answer, hold, transfer, hangup, and the various queries.
//!
//! # Examples
//!
//! ## Watching the event stream
//!
//! ```rust,no_run
//! use tinyphone_tokio::{EventSocket, Settings, SocketEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::new("http://localhost:6060");
//!     let (socket, mut events) = EventSocket::new(settings);
//!
//!     let driver = socket.clone();
//!     tokio::spawn(async move { driver.run().await });
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SocketEvent::Account(e) => println!("{} is {}", e.account, e.status),
//!             SocketEvent::Call(e) => println!("call {} is {}", e.id, e.state),
//!             SocketEvent::StatusChanged { current, .. } => println!("socket: {}", current),
//!             _ => {}
//!         }
//!     }
//! }
//! ```
//!
//! ## Issuing commands
//!
//! ```rust,no_run
//! use tinyphone_tokio::{CommandClient, DialRequest, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tinyphone_tokio::ClientError> {
//!     let client = CommandClient::new(&Settings::default())?;
//!
//!     let version = client.version().await?;
//!     println!("server: {} ({})", version.message, version.version);
//!
//!     client.dial(&DialRequest {
//!         uri: "sip:echo@example.com".into(),
//!         account: "work".into(),
//!     }).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod models;

pub mod constants;
pub(crate) mod protocol;

pub use api::CommandClient;
pub use config::Settings;
pub use connection::{ConnectOptions, ConnectionStatus, EventSocket, EventStream};
pub use error::{ClientError, ClientResult};
pub use event::{AccountEvent, CallEvent, RawMessage, SocketEvent, WelcomeNotice};
pub use models::{
    Account, AccountsEnvelope, ApiResponse, AppVersion, AudioDevice, Call, CallsEnvelope,
    ConfigReport, DevicesReport, DialRequest, LoginRequest, TransferRequest,
};
