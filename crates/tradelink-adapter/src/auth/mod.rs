/*
[INPUT]:  Session tokens from the host application and the server's verdict
[OUTPUT]: Token store and session provider abstractions
[POS]:    Auth layer - token bookkeeping for the authorize handshake
[UPDATE]: When the session contract or token handling changes
*/

pub mod session;
pub mod token;

pub use session::{SessionProvider, StaticSession};
pub use token::{TokenData, TokenStore};
