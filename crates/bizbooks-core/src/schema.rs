//! Collection and field names shared with the hosted store. These are the
//! on-the-wire contract and must not be renamed.

pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    pub const TRANSACTIONS: &str = "transactions";
    pub const SALES: &str = "sales";
    pub const SALES_RETURNS: &str = "salesReturns";
    pub const LEAD_STATUSES: &str = "leadStatuses";

    pub const EXPENSES: &str = "expenses";
    pub const PURCHASES: &str = "purchases";
    pub const BILLS: &str = "bills";
    pub const PAYMENTS: &str = "payments";
    pub const REFUNDS: &str = "refunds";
}

pub mod account {
    pub const OPENING_BALANCE: &str = "openingBalance";
}

pub mod transaction {
    pub const ACCOUNT_ID: &str = "accountId";
    pub const AMOUNT: &str = "amount";
    pub const TYPE: &str = "type";
    pub const DEBIT: &str = "debit";
    pub const CREDIT: &str = "credit";
}

pub mod sale {
    pub const PAYMENT_ACCOUNT_ID: &str = "paymentAccountId";
    /// Legacy name for the same relationship as `PAYMENT_ACCOUNT_ID`.
    pub const PAYMENT_ACCOUNT: &str = "paymentAccount";
    pub const PAYMENT_AMOUNT: &str = "paymentAmount";
}

pub mod sales_return {
    pub const RETURNED_ITEMS: &str = "returnedItems";
    pub const TAX_AMOUNT: &str = "taxAmount";
    pub const IS_FULL_RETURN: &str = "isFullReturn";
    pub const SHIPPING_TAX_REFUNDED: &str = "shippingTaxRefunded";
    pub const RETURN_DATE: &str = "returnDate";
    pub const TOTAL_PRODUCT_TAX_RETURNED: &str = "totalProductTaxReturned";
    pub const TOTAL_SHIPPING_TAX_RETURNED: &str = "totalShippingTaxReturned";
    pub const TOTAL_TAX_IMPACT: &str = "totalTaxImpact";
}

pub mod lead_status {
    pub const NAME: &str = "name";
    pub const COLOR: &str = "color";
    pub const ORDER: &str = "order";
    pub const IS_DEFAULT: &str = "isDefault";
}

pub mod ledger_entry {
    pub const DATE: &str = "date";
    pub const DESCRIPTION: &str = "description";
    pub const PARTY: &str = "party";
    pub const CATEGORY: &str = "category";
    pub const PAYMENT_METHOD: &str = "paymentMethod";
    pub const REFERENCE: &str = "reference";
    pub const AMOUNT: &str = "amount";
    pub const TAX_AMOUNT: &str = "taxAmount";
    pub const CGST_AMOUNT: &str = "cgstAmount";
    pub const SGST_AMOUNT: &str = "sgstAmount";
    pub const IGST_AMOUNT: &str = "igstAmount";
}

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
