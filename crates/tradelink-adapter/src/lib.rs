/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public tradelink adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod api;
pub mod auth;
pub mod error;
pub mod schema;
pub mod types;
pub mod ws;

// Re-export commonly used types from api
pub use api::{
    AccountApi,
    ApiKind,
    ApiManager,
    ApiRef,
    AuthApi,
    CashierApi,
    MarketApi,
    PositionsApi,
    StreamHandle,
    TradingApi,
};

// Re-export commonly used types from auth
pub use auth::{SessionProvider, StaticSession, TokenData, TokenStore};

pub use error::{Result, TradelinkError};

pub use schema::{EndpointDescriptor, SchemaRegistry, ValidationError};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    ClientConfig,
    ConnectionEvent,
    ConnectionManager,
    ConnectionState,
    ConnectionStats,
    Connector,
    Subscription,
    TransportEvent,
    TransportLink,
    TungsteniteConnector,
};
