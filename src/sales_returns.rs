//! Sales returns and their tax impact.
//!
//! Tax totals are computed once, when a return is recorded, and persisted
//! with the return so later date-range reports only have to sum them.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use bizbooks_core::schema::{collections, sales_return, CREATED_AT, UPDATED_AT};

use crate::{
    error::{BooksError, Result},
    store::{DataValue, Document, DocumentStore, Fields, Predicate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxImpact {
    pub total_product_tax_returned: Decimal,
    pub total_shipping_tax_returned: Decimal,
    pub total_tax_impact: Decimal,
}

impl TaxImpact {
    /// Shipping tax is refunded only on full returns; partial returns never
    /// carry any of it.
    pub fn compute(returned_items: &[DataValue], is_full_return: bool, shipping_tax_refunded: Decimal) -> Self {
        let total_product_tax_returned: Decimal = returned_items
            .iter()
            .filter_map(DataValue::as_map)
            .map(|item| {
                item.get(sales_return::TAX_AMOUNT)
                    .map(DataValue::decimal_or_zero)
                    .unwrap_or(Decimal::ZERO)
            })
            .sum();
        let total_shipping_tax_returned = if is_full_return {
            shipping_tax_refunded
        } else {
            Decimal::ZERO
        };

        Self {
            total_product_tax_returned,
            total_shipping_tax_returned,
            total_tax_impact: total_product_tax_returned + total_shipping_tax_returned,
        }
    }

    pub fn from_payload(payload: &Fields) -> Self {
        let items = payload
            .get(sales_return::RETURNED_ITEMS)
            .and_then(DataValue::as_list)
            .unwrap_or(&[]);
        let is_full_return = payload
            .get(sales_return::IS_FULL_RETURN)
            .and_then(DataValue::as_bool)
            .unwrap_or(false);
        let shipping = payload
            .get(sales_return::SHIPPING_TAX_REFUNDED)
            .map(DataValue::decimal_or_zero)
            .unwrap_or(Decimal::ZERO);
        Self::compute(items, is_full_return, shipping)
    }
}

pub struct SalesReturnService {
    store: Arc<dyn DocumentStore>,
}

impl SalesReturnService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Records a return with its derived tax totals and returns the new id.
    ///
    /// Every payload field is kept. `returnDate` may be given as a
    /// `YYYY-MM-DD` string and is stored as a date; when absent the return
    /// is dated today.
    pub fn create_return(&self, mut payload: Fields) -> Result<Arc<str>> {
        let impact = TaxImpact::from_payload(&payload);
        let now = OffsetDateTime::now_utc();

        let return_date = match payload.get(sales_return::RETURN_DATE).filter(|v| !v.is_null()) {
            Some(value) => value.as_date().ok_or_else(|| {
                BooksError::Validation(format!("{} must be a date, got {}", sales_return::RETURN_DATE, value))
            })?,
            None => now.date(),
        };

        payload.insert(sales_return::RETURN_DATE.into(), DataValue::Date(return_date));
        payload.insert(
            sales_return::TOTAL_PRODUCT_TAX_RETURNED.into(),
            DataValue::Money(impact.total_product_tax_returned),
        );
        payload.insert(
            sales_return::TOTAL_SHIPPING_TAX_RETURNED.into(),
            DataValue::Money(impact.total_shipping_tax_returned),
        );
        payload.insert(sales_return::TOTAL_TAX_IMPACT.into(), DataValue::Money(impact.total_tax_impact));
        payload.insert(CREATED_AT.into(), DataValue::Timestamp(now));
        payload.insert(UPDATED_AT.into(), DataValue::Timestamp(now));

        let id = self.store.add(collections::SALES_RETURNS, payload)?;
        metrics::increment_counter!("bizbooks_sales_returns_created_total");
        tracing::info!(id = %id, total_tax_impact = %impact.total_tax_impact, "Sales return recorded");
        Ok(id)
    }

    pub fn get_return(&self, id: &str) -> Result<Document> {
        self.store
            .get(collections::SALES_RETURNS, id)?
            .ok_or_else(|| BooksError::NotFound(format!("sales return {}", id)))
    }

    /// Product plus shipping tax returned between `start` and `end`, inclusive.
    pub fn total_tax_returned(&self, start: Date, end: Date) -> Result<Decimal> {
        check_range(start, end)?;
        let returns = self.store.find_range(
            collections::SALES_RETURNS,
            sales_return::RETURN_DATE,
            DataValue::Date(start),
            DataValue::Date(end),
        )?;
        Ok(returns
            .iter()
            .map(|r| {
                r.decimal_or_zero(sales_return::TOTAL_PRODUCT_TAX_RETURNED)
                    + r.decimal_or_zero(sales_return::TOTAL_SHIPPING_TAX_RETURNED)
            })
            .sum())
    }

    /// Shipping tax returned on full returns between `start` and `end`,
    /// inclusive. Issued as its own query rather than derived from
    /// `total_tax_returned`.
    pub fn total_shipping_tax_returned(&self, start: Date, end: Date) -> Result<Decimal> {
        check_range(start, end)?;
        let returns = self.store.find_where(
            collections::SALES_RETURNS,
            &[
                Predicate::between(sales_return::RETURN_DATE, start, end),
                Predicate::eq(sales_return::IS_FULL_RETURN, true),
            ],
        )?;
        Ok(returns
            .iter()
            .map(|r| r.decimal_or_zero(sales_return::TOTAL_SHIPPING_TAX_RETURNED))
            .sum())
    }
}

fn check_range(start: Date, end: Date) -> Result<()> {
    if start > end {
        return Err(BooksError::Validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}
