/*
[INPUT]:  Connection configuration, outbound requests and topic listeners
[OUTPUT]: One multiplexed WebSocket connection with correlation and streams
[POS]:    WebSocket layer - connection manager and wire plumbing
[UPDATE]: When adding connection operations or changing transport handling
*/

mod actor;
pub mod config;
pub mod manager;
pub mod message;
pub mod transport;

pub use config::{ClientConfig, DEFAULT_WS_URL, check_transport_url};
pub use manager::{
    ConnectionEvent, ConnectionManager, ConnectionManagerBuilder, ConnectionState,
    ConnectionStats, Listener, Subscription,
};
pub use message::{InboundEnvelope, OutboundMessage};
pub use transport::{Connector, TransportEvent, TransportLink, TungsteniteConnector};
