//! Typed views over the raw documents of the `accounts`, `transactions` and
//! `sales` collections. Decoding never fails: missing or malformed numbers
//! read as zero.

use std::sync::Arc;

use rust_decimal::Decimal;

use bizbooks_core::schema::{account, sale, transaction};

use crate::store::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub opening_balance: Decimal,
}

impl Account {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            opening_balance: doc.decimal_or_zero(account::OPENING_BALANCE),
        }
    }
}

/// Direction a transaction moves an account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Increase,
    Decrease,
}

impl Sign {
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Sign::Increase => amount,
            Sign::Decrease => -amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Expense,
    TransferOut,
    PurchasePayment,
    DepositOut,
    Income,
    TransferIn,
    Deposit,
    Sale,
    PurchaseReturn,
    /// Any type string outside the known vocabulary, kept verbatim.
    Other(Arc<str>),
}

impl TransactionKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "expense" => TransactionKind::Expense,
            "transfer_out" => TransactionKind::TransferOut,
            "purchase_payment" => TransactionKind::PurchasePayment,
            "deposit_out" => TransactionKind::DepositOut,
            "income" => TransactionKind::Income,
            "transfer_in" => TransactionKind::TransferIn,
            "deposit" => TransactionKind::Deposit,
            "sale" => TransactionKind::Sale,
            "purchase_return" => TransactionKind::PurchaseReturn,
            other => TransactionKind::Other(Arc::from(other)),
        }
    }

    /// Total mapping from kind to sign. Unrecognised types decrease the
    /// balance when their name mentions "expense" or "payment" (case
    /// sensitive) and increase it otherwise.
    pub fn sign(&self) -> Sign {
        match self {
            TransactionKind::Expense
            | TransactionKind::TransferOut
            | TransactionKind::PurchasePayment
            | TransactionKind::DepositOut => Sign::Decrease,
            TransactionKind::Income
            | TransactionKind::TransferIn
            | TransactionKind::Deposit
            | TransactionKind::Sale
            | TransactionKind::PurchaseReturn => Sign::Increase,
            TransactionKind::Other(raw) => {
                if raw.contains("expense") || raw.contains("payment") {
                    Sign::Decrease
                } else {
                    Sign::Increase
                }
            }
        }
    }
}

/// The two encodings a transaction may arrive in. They are alternatives,
/// never summed together.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEntry {
    DebitCredit { debit: Decimal, credit: Decimal },
    Typed { kind: TransactionKind, amount: Decimal },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Arc<str>,
    pub account_id: Option<Arc<str>>,
    pub entry: TransactionEntry,
}

impl Transaction {
    pub fn from_document(doc: &Document) -> Self {
        let entry = if doc.has(transaction::DEBIT) && doc.has(transaction::CREDIT) {
            TransactionEntry::DebitCredit {
                debit: doc.decimal_or_zero(transaction::DEBIT),
                credit: doc.decimal_or_zero(transaction::CREDIT),
            }
        } else {
            TransactionEntry::Typed {
                kind: TransactionKind::parse(doc.text(transaction::TYPE).unwrap_or_default()),
                amount: doc.decimal_or_zero(transaction::AMOUNT),
            }
        };

        Self {
            id: doc.id.clone(),
            account_id: doc.text(transaction::ACCOUNT_ID).map(Arc::from),
            entry,
        }
    }

    /// Signed contribution of this transaction to its account balance.
    pub fn effect(&self) -> Decimal {
        match &self.entry {
            TransactionEntry::DebitCredit { debit, credit } => credit - debit,
            TransactionEntry::Typed { kind, amount } => kind.sign().apply(*amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: Arc<str>,
    pub payment_amount: Decimal,
}

impl Sale {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            payment_amount: doc.decimal_or_zero(sale::PAYMENT_AMOUNT),
        }
    }
}
