//! Shape of the provider's `inference.result.fields` object.
//!
//! Every field is optional; the accessors apply the fallbacks used when the
//! provider could not read a value.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct Value<T> {
    #[serde(default)]
    pub(crate) value: Option<T>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LocaleFields {
    #[serde(default)]
    pub(crate) currency: Option<Value<String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct Locale {
    #[serde(default)]
    pub(crate) fields: Option<LocaleFields>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LineItems {
    #[serde(default)]
    pub(crate) items: Vec<LineItem>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LineItem {
    #[serde(default)]
    pub(crate) fields: LineItemFields,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LineItemFields {
    #[serde(default)]
    description: Option<Value<String>>,
    #[serde(default)]
    quantity: Option<Value<f64>>,
    #[serde(default)]
    unit_price: Option<Value<f64>>,
    #[serde(default)]
    total_price: Option<Value<f64>>,
}

fn number(field: &Option<Value<f64>>) -> Option<f64> {
    field
        .as_ref()
        .and_then(|f| f.value)
        .filter(|v| v.is_finite() && *v != 0.0)
}

fn text(field: &Option<Value<String>>) -> Option<&str> {
    field
        .as_ref()
        .and_then(|f| f.value.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl LineItemFields {
    pub fn description(&self) -> &str {
        text(&self.description).unwrap_or("")
    }

    pub fn quantity(&self) -> f64 {
        number(&self.quantity).unwrap_or(1.0)
    }

    pub fn unit_price(&self) -> f64 {
        number(&self.unit_price).unwrap_or(0.0)
    }

    pub fn total_price(&self) -> f64 {
        number(&self.total_price).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReceiptFields {
    #[serde(default)]
    total_amount: Option<Value<f64>>,
    #[serde(default)]
    date: Option<Value<String>>,
    #[serde(default)]
    supplier_name: Option<Value<String>>,
    #[serde(default)]
    line_items: Option<LineItems>,
    #[serde(default)]
    locale: Option<Locale>,
}

impl ReceiptFields {
    pub fn total_amount(&self) -> f64 {
        number(&self.total_amount).unwrap_or(0.0)
    }

    /// Receipt date, or `now` when missing or unreadable.
    pub fn date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        text(&self.date)
            .and_then(api_types::date::parse)
            .unwrap_or(now)
    }

    pub fn merchant_name(&self) -> &str {
        text(&self.supplier_name).unwrap_or(UNKNOWN_MERCHANT)
    }

    pub fn line_items(&self) -> impl Iterator<Item = &LineItemFields> {
        self.line_items
            .iter()
            .flat_map(|items| items.items.iter())
            .map(|item| &item.fields)
    }

    pub fn currency(&self) -> &str {
        self.locale
            .as_ref()
            .and_then(|locale| locale.fields.as_ref())
            .and_then(|fields| text(&fields.currency))
            .unwrap_or(DEFAULT_CURRENCY)
    }
}
