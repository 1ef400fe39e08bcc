/*
[INPUT]:  ConnectionManager and typed request parameters
[OUTPUT]: Typed endpoint wrappers and the API manager
[POS]:    API layer - application-facing protocol operations
[UPDATE]: When adding endpoint wrappers or wrapper operations
*/

pub mod account;
pub mod auth;
pub mod base;
pub mod cashier;
pub mod manager;
pub mod market;
pub mod positions;
pub mod trading;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use base::{BaseApi, StreamHandle, topic_for};
pub use cashier::CashierApi;
pub use manager::{ApiKind, ApiManager, ApiRef};
pub use market::MarketApi;
pub use positions::PositionsApi;
pub use trading::TradingApi;
