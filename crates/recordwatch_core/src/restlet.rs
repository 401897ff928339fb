//! RESTlet-style verb router for the sales order endpoints.
//!
//! # Responsibility
//! - Map HTTP verbs onto sales order use-cases.
//! - Shape use-case outcomes into stable JSON envelopes.
//!
//! # Invariants
//! - `dispatch` never panics and never returns an error; failures become
//!   the not-found sentinel (GET) or `{success: false}` (POST).
//! - `PUT` and `DELETE` have no handler and answer `null`.

use crate::repo::record_store::RecordStore;
use crate::search::record_search::SearchService;
use crate::service::sales_order_service::{FetchOutcome, FulfillmentRequest, SalesOrderService};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Body returned by `GET` when the requested order does not resolve.
pub const NOT_FOUND_SENTINEL: &str = "RESULT: NOT FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported method `{other}`")),
        }
    }
}

/// Parsed inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RestletRequest {
    pub method: HttpMethod,
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RestletRequest {
    pub fn get(params: BTreeMap<String, String>) -> Self {
        Self {
            method: HttpMethod::Get,
            params,
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            params: BTreeMap::new(),
            body: Some(body),
        }
    }
}

/// Verb router over [`SalesOrderService`].
pub struct SalesOrderRestlet<S: RecordStore, Q: SearchService> {
    service: SalesOrderService<S, Q>,
}

impl<S: RecordStore, Q: SearchService> SalesOrderRestlet<S, Q> {
    pub fn new(service: SalesOrderService<S, Q>) -> Self {
        Self { service }
    }

    pub fn dispatch(&self, request: &RestletRequest) -> Value {
        match request.method {
            HttpMethod::Get => self.get(request.params.get("id").map(String::as_str)),
            HttpMethod::Post => self.post(request.body.as_ref()),
            HttpMethod::Put | HttpMethod::Delete => Value::Null,
        }
    }

    /// Lists open orders, or one order's lines when `id` is given.
    pub fn get(&self, id: Option<&str>) -> Value {
        let outcome = match self.service.fetch(id) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "event=restlet_get module=restlet status=error id={} error={}",
                    id.unwrap_or("-"),
                    err
                );
                return Value::String(NOT_FOUND_SENTINEL.to_string());
            }
        };

        match outcome {
            FetchOutcome::OpenOrders(orders) => to_json_or_sentinel(&orders),
            FetchOutcome::Lines(lines) => to_json_or_sentinel(&lines),
            FetchOutcome::NotFound => Value::String(NOT_FOUND_SENTINEL.to_string()),
        }
    }

    /// Creates a fulfillment from the request body.
    pub fn post(&self, body: Option<&Value>) -> Value {
        let request = match body {
            Some(body) => match FulfillmentRequest::deserialize(body) {
                Ok(request) => request,
                Err(err) => return failure(format!("invalid request body: {err}")),
            },
            None => FulfillmentRequest::default(),
        };

        match self.service.fulfill(&request) {
            Ok(fulfillment_id) => json!({
                "success": true,
                "itemFulfillmentId": fulfillment_id,
            }),
            Err(err) => failure(err.to_string()),
        }
    }
}

fn failure(message: String) -> Value {
    json!({
        "success": false,
        "message": message,
    })
}

fn to_json_or_sentinel<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        error!("event=restlet_encode module=restlet status=error error={err}");
        Value::String(NOT_FOUND_SENTINEL.to_string())
    })
}
