use std::sync::Arc;

use bizbooks::balance::{BalanceAggregator, SalesMatching};
use bizbooks::error::BooksError;
use bizbooks::expense_ledger::ExpenseLedger;
use bizbooks::lead_status::{LeadStatusInput, LeadStatusService};
use bizbooks::sales_returns::SalesReturnService;
use bizbooks::store::{DataValue, DocumentStore, Fields, InMemoryStore};
use bizbooks_core::fields;
use bizbooks_sqlite::SqliteStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::macros::date;

fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(InMemoryStore::new())
}

fn sqlite_store() -> Arc<dyn DocumentStore> {
    Arc::new(SqliteStore::new(":memory:").expect("Failed to open SQLite store"))
}

fn txn(account: &str, kind: &str, amount: Decimal) -> Fields {
    fields([
        ("accountId", DataValue::from(account)),
        ("type", DataValue::from(kind)),
        ("amount", DataValue::Money(amount)),
    ])
}

fn returned_items(taxes: &[i64]) -> DataValue {
    DataValue::List(
        taxes
            .iter()
            .map(|t| DataValue::Map(fields([("taxAmount", DataValue::Int(*t))])))
            .collect(),
    )
}

fn balance_fixture(store: Arc<dyn DocumentStore>) {
    store.put("accounts", "bank", fields([("openingBalance", DataValue::Money(dec!(1000)))])).unwrap();
    store.add("transactions", txn("bank", "income", dec!(200))).unwrap();
    store.add("transactions", fields([
        ("accountId", DataValue::from("bank")),
        ("debit", DataValue::Money(dec!(50))),
        ("credit", DataValue::Money(dec!(0))),
    ])).unwrap();
    store.add("sales", fields([
        ("paymentAccountId", DataValue::from("bank")),
        ("paymentAmount", DataValue::Money(dec!(300))),
    ])).unwrap();
}

fn check_fixture_balance(store: Arc<dyn DocumentStore>) {
    balance_fixture(store.clone());
    let agg = BalanceAggregator::new(store);
    assert_eq!(agg.compute("bank").unwrap(), dec!(1450));
}

fn check_mixed_transaction_types(store: Arc<dyn DocumentStore>) {
    store.put("accounts", "cash", fields([("openingBalance", DataValue::from("250"))])).unwrap();
    store.add("transactions", txn("cash", "expense", dec!(40))).unwrap();
    store.add("transactions", txn("cash", "transfer_out", dec!(10))).unwrap();
    store.add("transactions", txn("cash", "purchase_payment", dec!(5))).unwrap();
    store.add("transactions", txn("cash", "deposit_out", dec!(1))).unwrap();
    store.add("transactions", txn("cash", "transfer_in", dec!(100))).unwrap();
    store.add("transactions", txn("cash", "purchase_return", dec!(20))).unwrap();
    store.add("transactions", txn("cash", "salary_payment", dec!(30))).unwrap();
    store.add("transactions", txn("cash", "interest", dec!(3))).unwrap();
    // booked against another account
    store.add("transactions", txn("bank", "income", dec!(999))).unwrap();

    let b = BalanceAggregator::new(store).breakdown("cash").unwrap();
    assert_eq!(b.opening_balance, dec!(250));
    assert_eq!(b.transactions_total, dec!(37));
    assert_eq!(b.balance, dec!(287));
}

fn check_double_counted_sale(store: Arc<dyn DocumentStore>) {
    store.add("sales", fields([
        ("paymentAccountId", DataValue::from("bank")),
        ("paymentAccount", DataValue::from("bank")),
        ("paymentAmount", DataValue::Money(dec!(120))),
    ])).unwrap();
    store.add("sales", fields([
        ("paymentAccount", DataValue::from("bank")),
        ("paymentAmount", DataValue::Money(dec!(30))),
    ])).unwrap();

    let per_field = BalanceAggregator::new(store.clone());
    assert_eq!(per_field.compute("bank").unwrap(), dec!(270));

    let deduped = BalanceAggregator::new(store).with_sales_matching(SalesMatching::DedupeById);
    assert_eq!(deduped.compute("bank").unwrap(), dec!(150));
}

fn check_sales_return_totals(store: Arc<dyn DocumentStore>) {
    let service = SalesReturnService::new(store);
    let full = service.create_return(fields([
        ("returnedItems", returned_items(&[10, 15])),
        ("isFullReturn", DataValue::Bool(true)),
        ("shippingTaxRefunded", DataValue::Int(5)),
        ("returnDate", DataValue::from("2024-03-05")),
    ])).unwrap();
    service.create_return(fields([
        ("returnedItems", returned_items(&[10, 15])),
        ("isFullReturn", DataValue::Bool(false)),
        ("shippingTaxRefunded", DataValue::Int(5)),
        ("returnDate", DataValue::from("2024-03-20")),
    ])).unwrap();
    service.create_return(fields([
        ("returnedItems", returned_items(&[7])),
        ("isFullReturn", DataValue::Bool(true)),
        ("shippingTaxRefunded", DataValue::Int(2)),
        ("returnDate", DataValue::from("2024-04-01")),
    ])).unwrap();

    let doc = service.get_return(&full).unwrap();
    assert_eq!(doc.decimal_or_zero("totalTaxImpact"), dec!(30));

    let march = (date!(2024 - 03 - 01), date!(2024 - 03 - 31));
    assert_eq!(service.total_tax_returned(march.0, march.1).unwrap(), dec!(55));
    assert_eq!(service.total_shipping_tax_returned(march.0, march.1).unwrap(), dec!(5));

    let spring = (date!(2024 - 03 - 05), date!(2024 - 04 - 01));
    assert_eq!(service.total_tax_returned(spring.0, spring.1).unwrap(), dec!(64));
    assert_eq!(service.total_shipping_tax_returned(spring.0, spring.1).unwrap(), dec!(7));

    assert!(matches!(service.get_return("nope"), Err(BooksError::NotFound(_))));
}

fn check_expense_ledger(store: Arc<dyn DocumentStore>) {
    for i in 1..=12 {
        store.add("expenses", fields([
            ("description", DataValue::from(format!("Office supplies {}", i).as_str())),
            ("amount", DataValue::Int(100)),
            ("taxAmount", DataValue::Int(18)),
            ("date", DataValue::from(format!("2024-01-{:02}", i).as_str())),
        ])).unwrap();
    }
    for i in 1..=11 {
        store.add("bills", fields([
            ("description", DataValue::from("Electricity")),
            ("party", DataValue::from("City Power")),
            ("amount", DataValue::Int(50)),
            ("taxAmount", DataValue::Int(10)),
            ("igstAmount", DataValue::Int(10)),
            ("cgstAmount", DataValue::Int(0)),
            ("sgstAmount", DataValue::Int(0)),
            ("date", DataValue::from(format!("2023-12-{:02}", i).as_str())),
        ])).unwrap();
    }

    let ledger = ExpenseLedger::load(store.as_ref()).unwrap();
    assert_eq!(ledger.len(), 23);

    let all = ledger.view("", 3);
    assert_eq!(all.total_pages, 3);
    assert_eq!(all.entries.len(), 3);
    assert!(all.entries.iter().all(|e| e.description == "Electricity"));
    assert_eq!(all.totals.amount, dec!(1750));

    let bills = ledger.view("city power", 1);
    assert_eq!(bills.total_entries, 11);
    assert_eq!(bills.total_pages, 2);
    assert_eq!(bills.totals.igst, dec!(110));
    assert_eq!(bills.totals.cgst, Decimal::ZERO);

    let supplies = ledger.view("supplies", 1);
    assert_eq!(supplies.totals.cgst, dec!(108));
    assert_eq!(supplies.totals.sgst, dec!(108));
    assert_eq!(supplies.entries[0].description, "Office supplies 12");
}

fn check_lead_statuses(store: Arc<dyn DocumentStore>) {
    let svc = LeadStatusService::new(store);
    for name in ["New", "Contacted", "Won"] {
        svc.create(LeadStatusInput {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .unwrap();
    }
    let statuses = svc.list().unwrap();
    let won = statuses.iter().find(|s| s.name == "Won").unwrap();
    svc.update(&won.id, LeadStatusInput {
        order: Some(0),
        is_default: Some(true),
        ..Default::default()
    })
    .unwrap();

    let names: Vec<_> = svc.list().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["Won", "New", "Contacted"]);
}

macro_rules! backend_tests {
    ($($check:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[test]
                fn [<$check _memory>]() {
                    [<check_ $check>](memory_store());
                }

                #[test]
                fn [<$check _sqlite>]() {
                    [<check_ $check>](sqlite_store());
                }
            )*
        }
    };
}

backend_tests!(
    fixture_balance,
    mixed_transaction_types,
    double_counted_sale,
    sales_return_totals,
    expense_ledger,
    lead_statuses,
);
