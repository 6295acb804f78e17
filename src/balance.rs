//! Account balance aggregation.
//!
//! A balance is never stored. It is recomputed from the account's opening
//! balance, every transaction booked against it, and every sale paid into it
//! under either of the two sale field names.

use std::{collections::HashSet, sync::Arc};

use rust_decimal::Decimal;
use serde::Serialize;

use bizbooks_core::schema::{collections, sale, transaction};

use crate::{
    error::{BooksError, Result},
    records::{Account, Sale, Transaction},
    store::{DataValue, DocumentStore},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceBreakdown {
    pub account_id: Arc<str>,
    pub opening_balance: Decimal,
    pub transactions_total: Decimal,
    pub sales_total: Decimal,
    pub balance: Decimal,
}

/// A balance for display. `error` is set when the computation failed and
/// `balance` is the zero shown in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReading {
    pub balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How sales matched by both `paymentAccountId` and `paymentAccount` are
/// summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalesMatching {
    /// Each query contributes independently, so a sale carrying both fields
    /// is counted twice.
    #[default]
    PerField,
    /// Sales are deduplicated by document id before summing.
    DedupeById,
}

pub struct BalanceAggregator {
    store: Arc<dyn DocumentStore>,
    sales_matching: SalesMatching,
}

impl BalanceAggregator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            sales_matching: SalesMatching::default(),
        }
    }

    pub fn with_sales_matching(mut self, sales_matching: SalesMatching) -> Self {
        self.sales_matching = sales_matching;
        self
    }

    pub fn compute(&self, account_id: &str) -> Result<Decimal> {
        Ok(self.breakdown(account_id)?.balance)
    }

    /// Fail-soft variant for display: any failure is logged and reads as zero.
    pub fn balance_or_zero(&self, account_id: &str) -> Decimal {
        self.reading(account_id).balance
    }

    /// Like `balance_or_zero`, but keeps the reason a zero was reported.
    pub fn reading(&self, account_id: &str) -> BalanceReading {
        match self.compute(account_id) {
            Ok(balance) => BalanceReading {
                balance,
                error: None,
            },
            Err(e) => {
                metrics::increment_counter!("bizbooks_balance_failures_total");
                tracing::error!(account_id, error = %e, "Balance computation failed, reporting zero");
                BalanceReading {
                    balance: Decimal::ZERO,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn breakdown(&self, account_id: &str) -> Result<BalanceBreakdown> {
        if account_id.trim().is_empty() {
            return Err(BooksError::InvalidArgument("account_id".to_string()));
        }
        metrics::increment_counter!("bizbooks_balance_computations_total");

        let opening_balance = self
            .store
            .get(collections::ACCOUNTS, account_id)?
            .map(|doc| Account::from_document(&doc).opening_balance)
            .unwrap_or(Decimal::ZERO);

        let transactions_total: Decimal = self
            .store
            .find_eq(collections::TRANSACTIONS, transaction::ACCOUNT_ID, DataValue::from(account_id))?
            .iter()
            .map(|doc| Transaction::from_document(doc).effect())
            .sum();

        let by_id = self
            .store
            .find_eq(collections::SALES, sale::PAYMENT_ACCOUNT_ID, DataValue::from(account_id))?;
        let by_legacy = self
            .store
            .find_eq(collections::SALES, sale::PAYMENT_ACCOUNT, DataValue::from(account_id))?;
        let sales_total = self.sum_sales(by_id.iter().chain(by_legacy.iter()).map(Sale::from_document));

        let balance = opening_balance + transactions_total + sales_total;
        tracing::debug!(
            account_id,
            %opening_balance,
            %transactions_total,
            %sales_total,
            %balance,
            "Balance computed"
        );

        Ok(BalanceBreakdown {
            account_id: Arc::from(account_id),
            opening_balance,
            transactions_total,
            sales_total,
            balance,
        })
    }

    fn sum_sales(&self, sales: impl Iterator<Item = Sale>) -> Decimal {
        match self.sales_matching {
            SalesMatching::PerField => sales.map(|s| s.payment_amount).sum(),
            SalesMatching::DedupeById => {
                let mut seen = HashSet::new();
                sales
                    .filter(|s| seen.insert(s.id.clone()))
                    .map(|s| s.payment_amount)
                    .sum()
            }
        }
    }
}
