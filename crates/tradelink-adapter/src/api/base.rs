/*
[INPUT]:  Endpoint names, typed parameters, caller callbacks
[OUTPUT]: Validated requests, checked responses, typed stream updates
[POS]:    API layer - shared request/response plumbing for endpoint wrappers
[UPDATE]: When request building, error mapping or stream decoding changes
*/

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, TradelinkError};
use crate::schema::{EndpointDescriptor, SchemaRegistry, validate_request, validate_response};
use crate::ws::{ConnectionManager, Subscription};

const ENVELOPE_KEYS: &[&str] = &["req_id", "passthrough", "subscribe"];

/// Request plumbing shared by every endpoint wrapper
#[derive(Debug, Clone)]
pub struct BaseApi {
    manager: ConnectionManager,
    registry: &'static SchemaRegistry,
}

impl BaseApi {
    pub fn new(manager: ConnectionManager) -> Self {
        Self::with_registry(manager, SchemaRegistry::standard())
    }

    pub fn with_registry(manager: ConnectionManager, registry: &'static SchemaRegistry) -> Self {
        Self { manager, registry }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn descriptor(&self, endpoint: &str) -> Result<&'static EndpointDescriptor> {
        self.registry.get(endpoint)
    }

    /// Serialize `params` into a wire request for `endpoint`.
    ///
    /// Fills the wire method with the endpoint's sentinel when the params do
    /// not carry it, then validates the result.
    pub fn build_request<P: Serialize>(&self, endpoint: &str, params: &P) -> Result<Value> {
        let descriptor = self.descriptor(endpoint)?;
        let mut request = serde_json::to_value(params)?;
        let Some(object) = request.as_object_mut() else {
            return Err(TradelinkError::InvalidParams(format!(
                "{endpoint} parameters must serialize to an object"
            )));
        };
        if !object.contains_key(descriptor.wire_method) {
            let Some(sentinel) = &descriptor.sentinel else {
                return Err(TradelinkError::InvalidParams(format!(
                    "{endpoint} request needs a {} value",
                    descriptor.wire_method
                )));
            };
            object.insert(descriptor.wire_method.to_string(), sentinel.clone());
        }
        validate_request(descriptor, &request)?;
        Ok(request)
    }

    /// One request, one reply.
    ///
    /// Server errors become [`TradelinkError::Api`] or
    /// [`TradelinkError::Authorization`]; the latter also clears the session
    /// token. The reply is validated before it is returned.
    pub async fn call(&self, endpoint: &str, request: Value) -> Result<Value> {
        let descriptor = self.descriptor(endpoint)?;
        validate_request(descriptor, &request)?;
        debug!(endpoint, "api call");

        let response = self.manager.send_with_response(request, None).await?;
        if let Err(err) = check_response(descriptor, &response) {
            if err.is_auth_error() {
                warn!(endpoint, code = err.code(), "authorization rejected; clearing token");
                self.manager.clear_token();
            }
            return Err(err);
        }
        Ok(response)
    }

    /// [`call`](Self::call), then deserialize `field` of the reply.
    pub async fn call_field<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: Value,
        field: &str,
    ) -> Result<T> {
        let mut response = self.call(endpoint, request).await?;
        let value = response.get_mut(field).map(Value::take).unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Subscribe `callback` to pushes of a subscription endpoint.
    ///
    /// Each push is checked for a server error, validated and decoded (from
    /// `field`, or the whole message when `None`). Pushes that fail
    /// validation or decoding are dropped with a warning.
    pub async fn stream<T, F>(
        &self,
        endpoint: &str,
        request: Value,
        field: Option<&'static str>,
        callback: F,
    ) -> Result<StreamHandle>
    where
        T: DeserializeOwned + 'static,
        F: Fn(Result<T>) + Send + Sync + 'static,
    {
        let descriptor = self.descriptor(endpoint)?;
        if !descriptor.is_subscription {
            return Err(TradelinkError::InvalidParams(format!(
                "{endpoint} does not support subscriptions"
            )));
        }
        validate_request(descriptor, &request)?;

        let topic = topic_for(endpoint, &request);
        let subscription = self
            .manager
            .subscribe(&topic, request.clone(), move |message| {
                if let Some(update) = decode_push::<T>(descriptor, message, field) {
                    callback(update);
                }
            })
            .await?;

        Ok(StreamHandle {
            topic,
            request,
            subscription,
        })
    }
}

/// Live subscription returned by the wrappers; dropping it unsubscribes.
#[derive(Debug)]
pub struct StreamHandle {
    topic: String,
    request: Value,
    subscription: Subscription,
}

impl StreamHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn req_id(&self) -> u64 {
        self.subscription.req_id()
    }

    /// Request that opened the stream
    pub fn request(&self) -> &Value {
        &self.request
    }

    pub fn unsubscribe(self) {
        self.subscription.unsubscribe();
    }
}

/// Topic key: endpoint plus the request minus envelope metadata. Streams
/// opened with identical parameters share one wire subscription.
pub fn topic_for(endpoint: &str, request: &Value) -> String {
    let mut key = request.clone();
    if let Some(object) = key.as_object_mut() {
        for meta in ENVELOPE_KEYS {
            object.remove(*meta);
        }
    }
    format!("{endpoint}:{key}")
}

fn check_response(descriptor: &EndpointDescriptor, response: &Value) -> Result<()> {
    if let Some(error) = response.get("error").filter(|error| error.is_object()) {
        return Err(TradelinkError::from_server_error(error));
    }
    validate_response(descriptor, response)?;
    Ok(())
}

fn decode_push<T: DeserializeOwned>(
    descriptor: &EndpointDescriptor,
    message: &Value,
    field: Option<&str>,
) -> Option<Result<T>> {
    if let Err(err) = check_response(descriptor, message) {
        if let TradelinkError::Validation(reason) = &err {
            warn!(endpoint = descriptor.name, %reason, "stream push failed validation; dropped");
            return None;
        }
        return Some(Err(err));
    }

    let payload = match field {
        Some(field) => message.get(field).cloned().unwrap_or(Value::Null),
        None => message.clone(),
    };
    match serde_json::from_value(payload) {
        Ok(update) => Some(Ok(update)),
        Err(err) => {
            warn!(endpoint = descriptor.name, error = %err, "stream push could not be decoded; dropped");
            None
        }
    }
}
