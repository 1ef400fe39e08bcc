/*
[INPUT]:  A ConnectionManager and API names
[OUTPUT]: Lazily built, cached endpoint wrappers sharing one connection
[POS]:    API layer - single entry point for application code
[UPDATE]: When adding an endpoint wrapper
*/

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::debug;

use super::{AccountApi, AuthApi, CashierApi, MarketApi, PositionsApi, TradingApi};
use crate::error::{Result, TradelinkError};
use crate::ws::ConnectionManager;

/// Names accepted by [`ApiManager::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    Auth,
    Market,
    Trading,
    Account,
    Cashier,
    Positions,
}

impl ApiKind {
    pub const ALL: [ApiKind; 6] = [
        ApiKind::Auth,
        ApiKind::Market,
        ApiKind::Trading,
        ApiKind::Account,
        ApiKind::Cashier,
        ApiKind::Positions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Auth => "auth",
            ApiKind::Market => "market",
            ApiKind::Trading => "trading",
            ApiKind::Account => "account",
            ApiKind::Cashier => "cashier",
            ApiKind::Positions => "positions",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiKind {
    type Err = TradelinkError;

    fn from_str(name: &str) -> Result<Self> {
        ApiKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| TradelinkError::UnknownApi(name.to_string()))
    }
}

/// Borrowed wrapper returned by name lookup
#[derive(Debug, Clone, Copy)]
pub enum ApiRef<'a> {
    Auth(&'a AuthApi),
    Market(&'a MarketApi),
    Trading(&'a TradingApi),
    Account(&'a AccountApi),
    Cashier(&'a CashierApi),
    Positions(&'a PositionsApi),
}

impl ApiRef<'_> {
    pub fn kind(&self) -> ApiKind {
        match self {
            ApiRef::Auth(_) => ApiKind::Auth,
            ApiRef::Market(_) => ApiKind::Market,
            ApiRef::Trading(_) => ApiKind::Trading,
            ApiRef::Account(_) => ApiKind::Account,
            ApiRef::Cashier(_) => ApiKind::Cashier,
            ApiRef::Positions(_) => ApiKind::Positions,
        }
    }
}

#[derive(Debug)]
struct ApiSet {
    auth: AuthApi,
    market: MarketApi,
    trading: TradingApi,
    account: AccountApi,
    cashier: CashierApi,
    positions: PositionsApi,
}

impl ApiSet {
    fn new(manager: &ConnectionManager) -> Self {
        debug!("building api wrappers");
        Self {
            auth: AuthApi::new(manager.clone()),
            market: MarketApi::new(manager.clone()),
            trading: TradingApi::new(manager.clone()),
            account: AccountApi::new(manager.clone()),
            cashier: CashierApi::new(manager.clone()),
            positions: PositionsApi::new(manager.clone()),
        }
    }
}

/// Owns the endpoint wrappers. They are built together on first access and
/// reused for the lifetime of the manager.
#[derive(Debug)]
pub struct ApiManager {
    connection: ConnectionManager,
    apis: OnceLock<ApiSet>,
}

impl ApiManager {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            apis: OnceLock::new(),
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Whether the wrappers have been built yet
    pub fn is_initialized(&self) -> bool {
        self.apis.get().is_some()
    }

    fn apis(&self) -> &ApiSet {
        self.apis.get_or_init(|| ApiSet::new(&self.connection))
    }

    pub fn auth(&self) -> &AuthApi {
        &self.apis().auth
    }

    pub fn market(&self) -> &MarketApi {
        &self.apis().market
    }

    pub fn trading(&self) -> &TradingApi {
        &self.apis().trading
    }

    pub fn account(&self) -> &AccountApi {
        &self.apis().account
    }

    pub fn cashier(&self) -> &CashierApi {
        &self.apis().cashier
    }

    pub fn positions(&self) -> &PositionsApi {
        &self.apis().positions
    }

    pub fn api(&self, kind: ApiKind) -> ApiRef<'_> {
        let apis = self.apis();
        match kind {
            ApiKind::Auth => ApiRef::Auth(&apis.auth),
            ApiKind::Market => ApiRef::Market(&apis.market),
            ApiKind::Trading => ApiRef::Trading(&apis.trading),
            ApiKind::Account => ApiRef::Account(&apis.account),
            ApiKind::Cashier => ApiRef::Cashier(&apis.cashier),
            ApiKind::Positions => ApiRef::Positions(&apis.positions),
        }
    }

    /// Look a wrapper up by name; unknown names fail with
    /// [`TradelinkError::UnknownApi`].
    pub fn get(&self, name: &str) -> Result<ApiRef<'_>> {
        let kind: ApiKind = name.parse()?;
        Ok(self.api(kind))
    }
}
