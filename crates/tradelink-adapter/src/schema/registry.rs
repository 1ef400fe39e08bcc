/*
[INPUT]:  Protocol endpoint definitions (wire method, request/response shapes)
[OUTPUT]: Immutable endpoint descriptors looked up by name
[POS]:    Schema layer - static endpoint registry
[UPDATE]: When adding endpoints or the server changes a message shape
*/

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Value, json};

use super::types::{Field, Schema};
use crate::error::{Result, TradelinkError};

static STANDARD: LazyLock<SchemaRegistry> =
    LazyLock::new(|| SchemaRegistry::from_descriptors(standard_endpoints()));

/// Static metadata for one protocol operation.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub name: &'static str,
    /// Key whose presence selects the operation on the wire
    pub wire_method: &'static str,
    /// Whether the endpoint accepts `subscribe: 1`
    pub is_subscription: bool,
    /// Value written under `wire_method` when the caller left it out
    pub sentinel: Option<Value>,
    pub request: Schema,
    pub response: Schema,
}

/// Endpoint name -> descriptor.
#[derive(Debug)]
pub struct SchemaRegistry {
    endpoints: HashMap<&'static str, EndpointDescriptor>,
}

impl SchemaRegistry {
    /// Registry holding every endpoint the adapter speaks.
    pub fn standard() -> &'static SchemaRegistry {
        &STANDARD
    }

    pub fn from_descriptors(descriptors: Vec<EndpointDescriptor>) -> Self {
        let endpoints = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.name, descriptor))
            .collect();
        Self { endpoints }
    }

    pub fn get(&self, name: &str) -> Result<&EndpointDescriptor> {
        self.endpoints
            .get(name)
            .ok_or_else(|| TradelinkError::UnknownEndpoint(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.endpoints.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn endpoint(
    name: &'static str,
    is_subscription: bool,
    sentinel: Option<Value>,
    method_schema: Schema,
    params: Vec<Field>,
    msg_types: &[&'static str],
    body: Vec<Field>,
) -> EndpointDescriptor {
    let mut request_fields = vec![Field::required(name, method_schema)];
    request_fields.extend(params);
    request_fields.push(Field::optional("req_id", Schema::number()));
    request_fields.push(Field::optional("passthrough", Schema::any_object()));
    if is_subscription {
        request_fields.push(Field::optional("subscribe", Schema::flag()));
    }

    let mut response_fields = vec![
        Field::required("msg_type", Schema::string_enum(msg_types)),
        Field::optional("echo_req", Schema::any_object()),
        Field::optional("req_id", Schema::number()),
        Field::optional(
            "subscription",
            Schema::object(vec![Field::required("id", Schema::string())]),
        ),
    ];
    response_fields.extend(body);

    EndpointDescriptor {
        name,
        wire_method: name,
        is_subscription,
        sentinel,
        request: Schema::object(request_fields),
        response: Schema::object(response_fields),
    }
}

fn flag_sentinel() -> Option<Value> {
    Some(json!(1))
}

fn paging_params() -> Vec<Field> {
    vec![
        Field::optional("limit", Schema::number()),
        Field::optional("offset", Schema::number()),
        Field::optional("description", Schema::number_enum(&[0.0, 1.0])),
        Field::optional("date_from", Schema::number()),
        Field::optional("date_to", Schema::number()),
    ]
}

fn tick_object() -> Schema {
    Schema::object(vec![
        Field::required("symbol", Schema::string()),
        Field::required("quote", Schema::number()),
        Field::required("epoch", Schema::number()),
        Field::optional("ask", Schema::number()),
        Field::optional("bid", Schema::number()),
        Field::optional("id", Schema::string()),
        Field::optional("pip_size", Schema::number()),
    ])
}

fn standard_endpoints() -> Vec<EndpointDescriptor> {
    vec![
        // auth
        endpoint(
            "authorize",
            false,
            None,
            Schema::string(),
            vec![Field::optional("add_to_login_history", Schema::number_enum(&[0.0, 1.0]))],
            &["authorize"],
            vec![Field::required(
                "authorize",
                Schema::object(vec![
                    Field::required("loginid", Schema::string()),
                    Field::required("currency", Schema::string()),
                    Field::required("balance", Schema::number()),
                    Field::optional("email", Schema::string()),
                    Field::optional("fullname", Schema::string()),
                    Field::optional("is_virtual", Schema::number_enum(&[0.0, 1.0])),
                    Field::optional("landing_company_name", Schema::string()),
                    Field::optional("scopes", Schema::array(Schema::string())),
                    Field::optional(
                        "account_list",
                        Schema::array(Schema::object(vec![
                            Field::required("loginid", Schema::string()),
                            Field::optional("currency", Schema::string()),
                            Field::optional("is_virtual", Schema::number_enum(&[0.0, 1.0])),
                        ])),
                    ),
                ]),
            )],
        ),
        endpoint(
            "logout",
            false,
            flag_sentinel(),
            Schema::flag(),
            vec![],
            &["logout"],
            vec![Field::required("logout", Schema::number())],
        ),
        // connection plumbing
        endpoint(
            "ping",
            false,
            flag_sentinel(),
            Schema::flag(),
            vec![],
            &["ping"],
            vec![Field::required("ping", Schema::string_enum(&["pong"]))],
        ),
        endpoint(
            "forget",
            false,
            None,
            Schema::string(),
            vec![],
            &["forget"],
            vec![Field::required("forget", Schema::number_enum(&[0.0, 1.0]))],
        ),
        endpoint(
            "forget_all",
            false,
            None,
            Schema::union(vec![Schema::string(), Schema::array(Schema::string())]),
            vec![],
            &["forget_all"],
            vec![Field::required("forget_all", Schema::array(Schema::string()))],
        ),
        // market
        endpoint(
            "active_symbols",
            false,
            Some(json!("brief")),
            Schema::string_enum(&["brief", "full"]),
            vec![
                Field::optional("product_type", Schema::string_enum(&["basic"])),
                Field::optional("landing_company", Schema::string()),
            ],
            &["active_symbols"],
            vec![Field::required(
                "active_symbols",
                Schema::array(Schema::object(vec![
                    Field::required("symbol", Schema::string()),
                    Field::required("display_name", Schema::string()),
                    Field::required("market", Schema::string()),
                    Field::optional("market_display_name", Schema::string()),
                    Field::optional("submarket", Schema::string()),
                    Field::required("exchange_is_open", Schema::number_enum(&[0.0, 1.0])),
                    Field::required("is_trading_suspended", Schema::number_enum(&[0.0, 1.0])),
                    Field::required("pip", Schema::number()),
                    Field::optional("symbol_type", Schema::string()),
                    Field::optional("spot", Schema::nullable_number()),
                ])),
            )],
        ),
        endpoint(
            "ticks",
            true,
            None,
            Schema::union(vec![Schema::string(), Schema::array(Schema::string())]),
            vec![],
            &["tick"],
            vec![Field::required("tick", tick_object())],
        ),
        endpoint(
            "ticks_history",
            true,
            None,
            Schema::string(),
            vec![
                Field::required("end", Schema::string()),
                Field::optional("start", Schema::number()),
                Field::optional("count", Schema::number()),
                Field::optional("style", Schema::string_enum(&["ticks", "candles"])),
                Field::optional(
                    "granularity",
                    Schema::number_enum(&[
                        60.0, 120.0, 180.0, 300.0, 600.0, 900.0, 1800.0, 3600.0, 7200.0,
                        14400.0, 28800.0, 86400.0,
                    ]),
                ),
                Field::optional("adjust_start_time", Schema::number_enum(&[0.0, 1.0])),
            ],
            &["history", "candles", "tick", "ohlc"],
            vec![
                Field::optional(
                    "history",
                    Schema::object(vec![
                        Field::required("prices", Schema::array(Schema::number())),
                        Field::required("times", Schema::array(Schema::number())),
                    ]),
                ),
                Field::optional(
                    "candles",
                    Schema::array(Schema::object(vec![
                        Field::required("epoch", Schema::number()),
                        Field::required("open", Schema::number()),
                        Field::required("high", Schema::number()),
                        Field::required("low", Schema::number()),
                        Field::required("close", Schema::number()),
                    ])),
                ),
                Field::optional("tick", tick_object()),
                Field::optional(
                    "ohlc",
                    Schema::object(vec![
                        Field::required("symbol", Schema::string()),
                        Field::required("epoch", Schema::number()),
                        Field::required("open_time", Schema::number()),
                        Field::required("granularity", Schema::number()),
                        Field::required("open", Schema::string()),
                        Field::required("high", Schema::string()),
                        Field::required("low", Schema::string()),
                        Field::required("close", Schema::string()),
                    ]),
                ),
                Field::optional("pip_size", Schema::number()),
            ],
        ),
        endpoint(
            "contracts_for",
            false,
            None,
            Schema::string(),
            vec![
                Field::optional("currency", Schema::string()),
                Field::optional("landing_company", Schema::string()),
                Field::optional("product_type", Schema::string_enum(&["basic"])),
            ],
            &["contracts_for"],
            vec![Field::required(
                "contracts_for",
                Schema::object(vec![
                    Field::required(
                        "available",
                        Schema::array(Schema::object(vec![
                            Field::required("contract_type", Schema::string()),
                            Field::optional("contract_category", Schema::string()),
                            Field::optional("contract_display", Schema::string()),
                            Field::optional("min_contract_duration", Schema::string()),
                            Field::optional("max_contract_duration", Schema::string()),
                            Field::optional("sentiment", Schema::string()),
                            Field::optional("barriers", Schema::number()),
                        ])),
                    ),
                    Field::optional("spot", Schema::nullable_number()),
                    Field::optional("open", Schema::number()),
                    Field::optional("close", Schema::number()),
                ]),
            )],
        ),
        // trading
        endpoint(
            "proposal",
            true,
            flag_sentinel(),
            Schema::flag(),
            vec![
                Field::required("amount", Schema::number()),
                Field::required("basis", Schema::string_enum(&["payout", "stake"])),
                Field::required("contract_type", Schema::string()),
                Field::required("currency", Schema::string()),
                Field::required("symbol", Schema::string()),
                Field::optional("duration", Schema::number()),
                Field::optional("duration_unit", Schema::string_enum(&["t", "s", "m", "h", "d"])),
                Field::optional("date_expiry", Schema::number()),
                Field::optional(
                    "barrier",
                    Schema::union(vec![Schema::string(), Schema::number()]),
                ),
            ],
            &["proposal"],
            vec![Field::required(
                "proposal",
                Schema::object(vec![
                    Field::required("id", Schema::string()),
                    Field::required("ask_price", Schema::number()),
                    Field::required("payout", Schema::number()),
                    Field::required("spot", Schema::number()),
                    Field::required("spot_time", Schema::number()),
                    Field::required("date_start", Schema::number()),
                    Field::required("longcode", Schema::string()),
                    Field::optional("display_value", Schema::string()),
                    Field::optional("date_expiry", Schema::number()),
                ]),
            )],
        ),
        endpoint(
            "buy",
            false,
            None,
            Schema::string(),
            vec![
                Field::required("price", Schema::number()),
                Field::optional("parameters", Schema::any_object()),
            ],
            &["buy"],
            vec![Field::required(
                "buy",
                Schema::object(vec![
                    Field::required("contract_id", Schema::number()),
                    Field::required("transaction_id", Schema::number()),
                    Field::required("buy_price", Schema::number()),
                    Field::required("balance_after", Schema::number()),
                    Field::required("start_time", Schema::number()),
                    Field::required("longcode", Schema::string()),
                    Field::optional("payout", Schema::number()),
                    Field::optional("shortcode", Schema::string()),
                ]),
            )],
        ),
        endpoint(
            "sell",
            false,
            None,
            Schema::number(),
            vec![Field::required("price", Schema::number())],
            &["sell"],
            vec![Field::required(
                "sell",
                Schema::object(vec![
                    Field::required("contract_id", Schema::number()),
                    Field::required("transaction_id", Schema::number()),
                    Field::required("sold_for", Schema::number()),
                    Field::required("balance_after", Schema::number()),
                    Field::optional("reference_id", Schema::number()),
                ]),
            )],
        ),
        endpoint(
            "proposal_open_contract",
            true,
            flag_sentinel(),
            Schema::flag(),
            vec![Field::optional("contract_id", Schema::number())],
            &["proposal_open_contract"],
            vec![Field::required(
                "proposal_open_contract",
                Schema::object(vec![
                    Field::optional("contract_id", Schema::number()),
                    Field::optional("contract_type", Schema::string()),
                    Field::optional("currency", Schema::string()),
                    Field::optional("underlying", Schema::string()),
                    Field::optional("buy_price", Schema::number()),
                    Field::optional("bid_price", Schema::number()),
                    Field::optional("profit", Schema::number()),
                    Field::optional("current_spot", Schema::number()),
                    Field::optional("entry_spot", Schema::nullable_number()),
                    Field::optional("status", Schema::nullable_string()),
                    Field::optional("is_sold", Schema::number_enum(&[0.0, 1.0])),
                    Field::optional("is_expired", Schema::number_enum(&[0.0, 1.0])),
                ]),
            )],
        ),
        // account
        endpoint(
            "balance",
            true,
            flag_sentinel(),
            Schema::flag(),
            vec![Field::optional("account", Schema::string())],
            &["balance"],
            vec![Field::required(
                "balance",
                Schema::object(vec![
                    Field::required("balance", Schema::number()),
                    Field::required("currency", Schema::string()),
                    Field::required("loginid", Schema::string()),
                    Field::optional("id", Schema::string()),
                ]),
            )],
        ),
        endpoint(
            "get_settings",
            false,
            flag_sentinel(),
            Schema::flag(),
            vec![],
            &["get_settings"],
            vec![Field::required(
                "get_settings",
                Schema::object(vec![
                    Field::optional("email", Schema::string()),
                    Field::optional("country", Schema::nullable_string()),
                    Field::optional("residence", Schema::nullable_string()),
                    Field::optional("first_name", Schema::string()),
                    Field::optional("last_name", Schema::string()),
                    Field::optional("preferred_language", Schema::nullable_string()),
                ]),
            )],
        ),
        endpoint(
            "statement",
            false,
            flag_sentinel(),
            Schema::flag(),
            {
                let mut params = paging_params();
                params.push(Field::optional(
                    "action_type",
                    Schema::string_enum(&[
                        "buy",
                        "sell",
                        "deposit",
                        "withdrawal",
                        "escrow",
                        "adjustment",
                        "virtual_credit",
                        "transfer",
                    ]),
                ));
                params
            },
            &["statement"],
            vec![Field::required(
                "statement",
                Schema::object(vec![
                    Field::required("count", Schema::number()),
                    Field::required(
                        "transactions",
                        Schema::array(Schema::object(vec![
                            Field::required("transaction_id", Schema::number()),
                            Field::required("action_type", Schema::string()),
                            Field::required("amount", Schema::number()),
                            Field::required("balance_after", Schema::number()),
                            Field::required("transaction_time", Schema::number()),
                            Field::optional("contract_id", Schema::nullable_number()),
                            Field::optional("reference_id", Schema::number()),
                            Field::optional("longcode", Schema::string()),
                        ])),
                    ),
                ]),
            )],
        ),
        // cashier
        endpoint(
            "cashier",
            false,
            None,
            Schema::string_enum(&["deposit", "withdraw"]),
            vec![
                Field::optional("provider", Schema::string_enum(&["doughflow", "crypto"])),
                Field::optional("type", Schema::string_enum(&["url", "api"])),
                Field::optional("verification_code", Schema::string()),
            ],
            &["cashier"],
            vec![Field::required(
                "cashier",
                Schema::union(vec![Schema::string(), Schema::any_object()]),
            )],
        ),
        // positions
        endpoint(
            "portfolio",
            false,
            flag_sentinel(),
            Schema::flag(),
            vec![Field::optional("contract_type", Schema::array(Schema::string()))],
            &["portfolio"],
            vec![Field::required(
                "portfolio",
                Schema::object(vec![Field::required(
                    "contracts",
                    Schema::array(Schema::object(vec![
                        Field::required("contract_id", Schema::number()),
                        Field::required("contract_type", Schema::string()),
                        Field::required("currency", Schema::string()),
                        Field::required("symbol", Schema::string()),
                        Field::required("buy_price", Schema::number()),
                        Field::optional("payout", Schema::number()),
                        Field::optional("date_start", Schema::number()),
                        Field::optional("expiry_time", Schema::number()),
                        Field::optional("longcode", Schema::string()),
                        Field::optional("transaction_id", Schema::number()),
                    ])),
                )]),
            )],
        ),
        endpoint(
            "profit_table",
            false,
            flag_sentinel(),
            Schema::flag(),
            {
                let mut params = paging_params();
                params.push(Field::optional("sort", Schema::string_enum(&["ASC", "DESC"])));
                params
            },
            &["profit_table"],
            vec![Field::required(
                "profit_table",
                Schema::object(vec![
                    Field::required("count", Schema::number()),
                    Field::required(
                        "transactions",
                        Schema::array(Schema::object(vec![
                            Field::required("contract_id", Schema::number()),
                            Field::required("buy_price", Schema::number()),
                            Field::required("sell_price", Schema::number()),
                            Field::required("purchase_time", Schema::number()),
                            Field::optional("sell_time", Schema::nullable_number()),
                            Field::optional("contract_type", Schema::string()),
                            Field::optional("longcode", Schema::string()),
                            Field::optional("shortcode", Schema::string()),
                            Field::optional("transaction_id", Schema::number()),
                        ])),
                    ),
                ]),
            )],
        ),
    ]
}
