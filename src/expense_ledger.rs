//! Combined expense ledger: expenses, purchases, bills, payments and refunds
//! normalized into one entry shape, searchable and paginated.

use std::fmt::Display;

use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use bizbooks_core::schema::{collections, ledger_entry};

use crate::{
    error::Result,
    store::{DataValue, Document, DocumentStore},
};

pub const PAGE_SIZE: usize = 10;
pub const MAX_PAGE_LINKS: usize = 5;
pub const PLACEHOLDER: &str = "N/A";

time::serde::format_description!(ymd, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Expense,
    Purchase,
    Bill,
    Payment,
    Refund,
}

impl EntrySource {
    pub const ALL: [EntrySource; 5] = [
        EntrySource::Expense,
        EntrySource::Purchase,
        EntrySource::Bill,
        EntrySource::Payment,
        EntrySource::Refund,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            EntrySource::Expense => collections::EXPENSES,
            EntrySource::Purchase => collections::PURCHASES,
            EntrySource::Bill => collections::BILLS,
            EntrySource::Payment => collections::PAYMENTS,
            EntrySource::Refund => collections::REFUNDS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntrySource::Expense => "Expense",
            EntrySource::Purchase => "Purchase",
            EntrySource::Bill => "Bill",
            EntrySource::Payment => "Payment",
            EntrySource::Refund => "Refund",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub source: EntrySource,
    #[serde(with = "ymd::option")]
    pub date: Option<Date>,
    pub description: String,
    pub party: String,
    pub category: String,
    pub payment_method: String,
    pub reference: String,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub igst_amount: Decimal,
}

impl LedgerEntry {
    /// Missing CGST and SGST each default to half the tax amount, missing
    /// IGST to zero, missing text to a placeholder.
    pub fn normalize(source: EntrySource, doc: &Document) -> Self {
        let tax_amount = doc.decimal_or_zero(ledger_entry::TAX_AMOUNT);
        let half_tax = tax_amount / Decimal::TWO;
        let split = |field: &str| {
            doc.field(field)
                .map(DataValue::decimal_or_zero)
                .unwrap_or(half_tax)
        };
        let text = |field: &str| {
            doc.text(field)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(PLACEHOLDER)
                .to_string()
        };

        Self {
            id: doc.id.to_string(),
            source,
            date: doc.field(ledger_entry::DATE).and_then(DataValue::as_date),
            description: text(ledger_entry::DESCRIPTION),
            party: text(ledger_entry::PARTY),
            category: text(ledger_entry::CATEGORY),
            payment_method: text(ledger_entry::PAYMENT_METHOD),
            reference: text(ledger_entry::REFERENCE),
            amount: doc.decimal_or_zero(ledger_entry::AMOUNT),
            tax_amount,
            cgst_amount: split(ledger_entry::CGST_AMOUNT),
            sgst_amount: split(ledger_entry::SGST_AMOUNT),
            igst_amount: doc.decimal_or_zero(ledger_entry::IGST_AMOUNT),
        }
    }

    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        [
            self.description.as_str(),
            self.party.as_str(),
            self.category.as_str(),
            self.reference.as_str(),
            self.payment_method.as_str(),
            self.source.label(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub amount: Decimal,
    pub tax: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

impl LedgerTotals {
    fn add(&mut self, entry: &LedgerEntry) {
        self.amount += entry.amount;
        self.tax += entry.tax_amount;
        self.cgst += entry.cgst_amount;
        self.sgst += entry.sgst_amount;
        self.igst += entry.igst_amount;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
    pub page_numbers: Vec<usize>,
    /// Totals over every entry matching the search, not just this page.
    pub totals: LedgerTotals,
}

impl Display for LedgerPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.add_row(row!["Date", "Type", "Description", "Party", "Amount", "Tax", "CGST", "SGST", "IGST"]);
        table.add_empty_row();

        for e in &self.entries {
            let date = e.date.map(|d| d.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string());
            table.add_row(row![
                date,
                e.source.label(),
                e.description,
                e.party,
                e.amount,
                e.tax_amount,
                e.cgst_amount,
                e.sgst_amount,
                e.igst_amount
            ]);
        }

        table.add_empty_row();
        let t = &self.totals;
        table.add_row(row!["Total", "", "", "", t.amount, t.tax, t.cgst, t.sgst, t.igst]);

        write!(f, "\n{}\nPage {} of {}\n", table, self.page, self.total_pages)
    }
}

pub fn total_pages(entries: usize) -> usize {
    entries.div_ceil(PAGE_SIZE)
}

/// Up to `MAX_PAGE_LINKS` page numbers centred on `current`, clamped to
/// `1..=total`.
pub fn page_numbers(current: usize, total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let half = MAX_PAGE_LINKS / 2;
    let current = current.clamp(1, total);
    let start = current.saturating_sub(half).max(1);
    let end = (start + MAX_PAGE_LINKS - 1).min(total);
    let start = (end + 1).saturating_sub(MAX_PAGE_LINKS).max(1);
    (start..=end).collect()
}

pub struct ExpenseLedger {
    entries: Vec<LedgerEntry>,
}

impl ExpenseLedger {
    /// Reads every source collection and normalizes the documents.
    pub fn load(store: &dyn DocumentStore) -> Result<Self> {
        let mut entries = Vec::new();
        for source in EntrySource::ALL {
            let docs = store.list(source.collection())?;
            entries.extend(docs.iter().map(|d| LedgerEntry::normalize(source, d)));
        }
        tracing::debug!(entries = entries.len(), "Expense ledger loaded");
        Ok(Self::from_entries(entries))
    }

    /// Newest first; undated entries go last.
    pub fn from_entries(mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filter(&self, search: &str) -> Vec<&LedgerEntry> {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    /// One page of the entries matching `search`. Out-of-range page numbers
    /// are clamped.
    pub fn view(&self, search: &str, page: usize) -> LedgerPage {
        let filtered = self.filter(search);

        let mut totals = LedgerTotals::default();
        for e in &filtered {
            totals.add(e);
        }

        let total_entries = filtered.len();
        let total_pages = total_pages(total_entries);
        let page = page.clamp(1, total_pages.max(1));
        let entries = filtered
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        LedgerPage {
            entries,
            page,
            total_pages,
            total_entries,
            page_numbers: page_numbers(page, total_pages),
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizbooks_core::fields;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn entry(id: usize, day: Option<Date>, description: &str) -> LedgerEntry {
        LedgerEntry {
            id: format!("e{:02}", id),
            source: EntrySource::Expense,
            date: day,
            description: description.to_string(),
            party: PLACEHOLDER.to_string(),
            category: PLACEHOLDER.to_string(),
            payment_method: PLACEHOLDER.to_string(),
            reference: PLACEHOLDER.to_string(),
            amount: Decimal::from(id as i64),
            tax_amount: Decimal::ONE,
            cgst_amount: dec!(0.5),
            sgst_amount: dec!(0.5),
            igst_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn missing_gst_split_defaults_to_half_the_tax() {
        let doc = Document::new("x1", fields([
            ("amount", DataValue::Money(dec!(120))),
            ("taxAmount", DataValue::Money(dec!(20))),
        ]));
        let e = LedgerEntry::normalize(EntrySource::Purchase, &doc);
        assert_eq!(e.cgst_amount, dec!(10));
        assert_eq!(e.sgst_amount, dec!(10));
        assert_eq!(e.igst_amount, Decimal::ZERO);
        assert_eq!(e.description, PLACEHOLDER);
        assert_eq!(e.date, None);
    }

    #[test]
    fn explicit_gst_split_is_kept() {
        let doc = Document::new("x2", fields([
            ("taxAmount", DataValue::Money(dec!(20))),
            ("cgstAmount", DataValue::Money(dec!(0))),
            ("igstAmount", DataValue::Money(dec!(20))),
            ("date", DataValue::from("2024-02-10")),
        ]));
        let e = LedgerEntry::normalize(EntrySource::Bill, &doc);
        assert_eq!(e.cgst_amount, Decimal::ZERO);
        assert_eq!(e.sgst_amount, dec!(10));
        assert_eq!(e.igst_amount, dec!(20));
        assert_eq!(e.date, Some(date!(2024 - 02 - 10)));
    }

    #[test]
    fn twenty_three_entries_make_three_pages() {
        let entries = (1..=23)
            .map(|i| entry(i, Some(date!(2024 - 01 - 01)), "Stationery"))
            .collect();
        let ledger = ExpenseLedger::from_entries(entries);
        let page = ledger.view("", 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.entries.len(), 3);
        let ids: Vec<_> = page.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e21", "e22", "e23"]);
        assert_eq!(page.page_numbers, vec![1, 2, 3]);
    }

    #[test]
    fn page_numbers_are_centred_and_clamped() {
        assert_eq!(page_numbers(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_numbers(5, 10), vec![3, 4, 5, 6, 7]);
        assert_eq!(page_numbers(10, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_numbers(2, 2), vec![1, 2]);
        assert!(page_numbers(1, 0).is_empty());
    }

    #[test]
    fn totals_cover_the_filtered_set_only() {
        let ledger = ExpenseLedger::from_entries(vec![
            entry(1, Some(date!(2024 - 01 - 03)), "Printer ink"),
            entry(2, Some(date!(2024 - 01 - 02)), "Rent"),
            entry(4, Some(date!(2024 - 01 - 01)), "printer paper"),
        ]);
        let page = ledger.view("PRINTER", 1);
        assert_eq!(page.total_entries, 2);
        assert_eq!(page.totals.amount, dec!(5));
        assert_eq!(page.totals.tax, dec!(2));
        assert_eq!(page.totals.cgst, dec!(1));
    }

    #[test]
    fn newest_first_and_page_clamped() {
        let ledger = ExpenseLedger::from_entries(vec![
            entry(1, None, "Undated"),
            entry(2, Some(date!(2024 - 01 - 01)), "Old"),
            entry(3, Some(date!(2024 - 03 - 01)), "New"),
        ]);
        let page = ledger.view("", 99);
        assert_eq!(page.page, 1);
        let order: Vec<_> = page.entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, vec!["New", "Old", "Undated"]);
        assert!(page.to_string().contains("Page 1 of 1"));
    }

    #[test]
    fn empty_ledger_has_no_pages() {
        let page = ExpenseLedger::from_entries(Vec::new()).view("", 1);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 1);
        assert!(page.entries.is_empty());
        assert!(page.page_numbers.is_empty());
    }
}
