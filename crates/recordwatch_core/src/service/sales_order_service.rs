//! Sales order lookup and fulfillment use-cases.
//!
//! # Responsibility
//! - List open sales orders or the item lines of one order.
//! - Turn a sales order into a saved item fulfillment with quantity overrides.
//!
//! # Invariants
//! - An unresolvable order id is `FetchOutcome::NotFound`, never an error.
//! - Quantity overrides apply only to items present on the fulfillment.
//! - Storage and search faults surface as `ServiceError`.

use crate::model::record::{Record, RecordId, RecordType};
use crate::model::value::FieldValue;
use crate::repo::record_store::{RecordStore, RepoError, ITEM_SUBLIST};
use crate::search::record_search::{
    RecordSearch, SearchError, SearchFilter, SearchRow, SearchService, INTERNAL_ID_COLUMN,
};
use crate::snapshot::{RecordSnapshot, SnapshotError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Statuses treated as open: pending approval, pending fulfillment,
/// partially fulfilled, pending billing/partially fulfilled, pending billing.
pub const OPEN_SALES_ORDER_STATUSES: [&str; 5] = [
    "SalesOrd:A",
    "SalesOrd:B",
    "SalesOrd:D",
    "SalesOrd:E",
    "SalesOrd:F",
];

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("MISSING_REQUIRED_FIELDS: {0}")]
    MissingRequiredFields(&'static str),
    #[error("invalid {field}: `{value}`")]
    InvalidInput { field: &'static str, value: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Header summary of one open sales order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderSummary {
    pub internal_id: RecordId,
    pub document_number: Option<String>,
    pub date: Option<String>,
    pub total_amount: Option<f64>,
}

/// One item line of a sales order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderLine {
    pub item_name: Option<String>,
    pub quantity: Option<f64>,
    pub rate: Option<f64>,
    pub gross_amount: Option<f64>,
}

/// Result of a fetch call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// No id given: all open orders.
    OpenOrders(Vec<SalesOrderSummary>),
    /// Id resolved: that order's item lines.
    Lines(Vec<SalesOrderLine>),
    /// Id given but no such sales order.
    NotFound,
}

/// Requested quantity for one item on the fulfillment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdjustment {
    pub item_id: FieldValue,
    pub quantity: FieldValue,
}

/// Fulfillment request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRequest {
    #[serde(default)]
    pub sales_order_id: Option<FieldValue>,
    #[serde(default)]
    pub item_details: Option<Vec<ItemAdjustment>>,
}

/// Sales order endpoint service over store and search collaborators.
pub struct SalesOrderService<S: RecordStore, Q: SearchService> {
    store: S,
    search: Q,
}

impl<S: RecordStore, Q: SearchService> SalesOrderService<S, Q> {
    pub fn new(store: S, search: Q) -> Self {
        Self { store, search }
    }

    /// Lists open orders when `id` is blank, otherwise the order's lines.
    pub fn fetch(&self, id: Option<&str>) -> Result<FetchOutcome, ServiceError> {
        let Some(raw_id) = id.map(str::trim).filter(|value| !value.is_empty()) else {
            return self.list_open_orders().map(FetchOutcome::OpenOrders);
        };

        let Ok(order_id) = raw_id.parse::<RecordId>() else {
            debug!("event=sales_order_fetch module=service status=not_found id={raw_id}");
            return Ok(FetchOutcome::NotFound);
        };

        match self.store.load(RecordType::SalesOrder, order_id)? {
            Some(order) => order_lines(&order).map(FetchOutcome::Lines),
            None => {
                debug!("event=sales_order_fetch module=service status=not_found id={order_id}");
                Ok(FetchOutcome::NotFound)
            }
        }
    }

    /// Creates and saves an item fulfillment from a sales order.
    ///
    /// Adjustments for items missing from the fulfillment are skipped.
    pub fn fulfill(&self, request: &FulfillmentRequest) -> Result<RecordId, ServiceError> {
        let supplied_id = request
            .sales_order_id
            .as_ref()
            .filter(|value| !is_missing_id(value));
        let order_id = match supplied_id {
            None => {
                return Err(ServiceError::MissingRequiredFields(
                    "Sales Order ID is required",
                ))
            }
            Some(value) => parse_record_id(value).ok_or_else(|| ServiceError::InvalidInput {
                field: "salesOrderId",
                value: value.to_string(),
            })?,
        };

        let mut fulfillment =
            self.store
                .transform(RecordType::SalesOrder, order_id, RecordType::ItemFulfillment)?;

        for adjustment in request.item_details.iter().flatten() {
            let item_id = FieldValue::Text(adjustment.item_id.to_string());
            match fulfillment.find_sublist_line_with_value(ITEM_SUBLIST, "item", &item_id) {
                Some(line) => fulfillment.set_sublist_value(
                    ITEM_SUBLIST,
                    line,
                    "quantity",
                    adjustment.quantity.clone(),
                )?,
                None => warn!(
                    "event=fulfillment_adjust module=service status=skipped order_id={} item_id={}",
                    order_id, item_id
                ),
            }
        }

        let fulfillment_id = self.store.save(&mut fulfillment)?;
        info!(
            "event=fulfillment_create module=service status=ok order_id={} fulfillment_id={}",
            order_id, fulfillment_id
        );
        Ok(fulfillment_id)
    }

    fn list_open_orders(&self) -> Result<Vec<SalesOrderSummary>, ServiceError> {
        let search = RecordSearch::new(RecordType::SalesOrder)
            .filter(SearchFilter::any_of(
                "status",
                OPEN_SALES_ORDER_STATUSES.iter().map(|status| (*status).into()).collect(),
            ))
            .columns([INTERNAL_ID_COLUMN, "tranid", "trandate", "total"]);

        let mut orders = Vec::new();
        self.search.run_each(&search, &mut |row: SearchRow| {
            orders.push(SalesOrderSummary {
                internal_id: row.id,
                document_number: row.get_value("tranid").and_then(text_of),
                date: row.get_value("trandate").and_then(text_of),
                total_amount: row.get_value("total").and_then(FieldValue::as_number),
            });
            true
        })?;
        Ok(orders)
    }
}

fn order_lines(order: &Record) -> Result<Vec<SalesOrderLine>, ServiceError> {
    let count = order.line_count(ITEM_SUBLIST)?;

    let number_at = |field_id: &str, line: usize| -> Result<Option<f64>, SnapshotError> {
        Ok(order
            .sublist_value(ITEM_SUBLIST, field_id, line)?
            .and_then(|value| value.as_number()))
    };

    (0..count)
        .map(|line| -> Result<SalesOrderLine, ServiceError> {
            Ok(SalesOrderLine {
                item_name: order.sublist_text(ITEM_SUBLIST, "item", line)?,
                quantity: number_at("quantity", line)?,
                rate: number_at("rate", line)?,
                gross_amount: number_at("amount", line)?,
            })
        })
        .collect()
}

fn text_of(value: &FieldValue) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}

// Empty-ish ids (`null`, `""`, `0`, `false`) count as not supplied.
fn is_missing_id(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Bool(flag) => !flag,
        FieldValue::Number(number) => *number == 0.0 || number.is_nan(),
        FieldValue::Text(text) => text.trim().is_empty(),
    }
}

fn parse_record_id(value: &FieldValue) -> Option<RecordId> {
    match value {
        FieldValue::Number(number) if number.fract() == 0.0 && *number > 0.0 => {
            Some(*number as RecordId)
        }
        FieldValue::Text(text) => text.trim().parse().ok().filter(|id: &RecordId| *id > 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_missing_id, parse_record_id, text_of};
    use crate::model::value::FieldValue;

    #[test]
    fn parse_record_id_accepts_whole_numbers_and_digit_text() {
        assert_eq!(parse_record_id(&FieldValue::Number(42.0)), Some(42));
        assert_eq!(parse_record_id(&FieldValue::from(" 42 ")), Some(42));
        assert_eq!(parse_record_id(&FieldValue::Number(4.5)), None);
        assert_eq!(parse_record_id(&FieldValue::from("SO-42")), None);
        assert_eq!(parse_record_id(&FieldValue::Bool(true)), None);
        assert_eq!(parse_record_id(&FieldValue::Number(0.0)), None);
    }

    #[test]
    fn empty_ids_count_as_missing() {
        assert!(is_missing_id(&FieldValue::Null));
        assert!(is_missing_id(&FieldValue::from("  ")));
        assert!(is_missing_id(&FieldValue::Number(0.0)));
        assert!(is_missing_id(&FieldValue::Bool(false)));
        assert!(!is_missing_id(&FieldValue::from("0")));
        assert!(!is_missing_id(&FieldValue::Number(7.0)));
    }

    #[test]
    fn text_of_skips_null() {
        assert_eq!(text_of(&FieldValue::Null), None);
        assert_eq!(text_of(&FieldValue::from("SO1")).as_deref(), Some("SO1"));
    }
}
