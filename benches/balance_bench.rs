use std::sync::Arc;

use bizbooks::balance::{BalanceAggregator, SalesMatching};
use bizbooks::expense_ledger::ExpenseLedger;
use bizbooks::sales_returns::SalesReturnService;
use bizbooks::store::{DataValue, DocumentStore, InMemoryStore};
use bizbooks_core::fields;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

fn seed_data() -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    store
        .put("accounts", "bank", fields([("openingBalance", DataValue::Money(Decimal::from(100_000)))]))
        .unwrap();

    // 1000 transactions spread over ten accounts
    let kinds = ["income", "expense", "transfer_in", "transfer_out", "purchase_return"];
    for i in 0..1000 {
        store
            .add("transactions", fields([
                ("accountId", DataValue::from(if i % 10 == 0 { "bank".to_string() } else { format!("acc-{}", i % 10) }.as_str())),
                ("type", DataValue::from(kinds[i % kinds.len()])),
                ("amount", DataValue::Int(i as i64 + 1)),
            ]))
            .unwrap();
    }
    for i in 0..200 {
        let key = if i % 2 == 0 { "paymentAccountId" } else { "paymentAccount" };
        store
            .add("sales", fields([
                (key, DataValue::from("bank")),
                ("paymentAmount", DataValue::Int(250)),
            ]))
            .unwrap();
    }
    for i in 0..200 {
        store
            .add("expenses", fields([
                ("description", DataValue::from(format!("Expense {}", i).as_str())),
                ("amount", DataValue::Int(100)),
                ("taxAmount", DataValue::Int(18)),
                ("date", DataValue::from(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1).as_str())),
            ]))
            .unwrap();
    }
    let returns = SalesReturnService::new(store.clone());
    for i in 0..200 {
        returns
            .create_return(fields([
                ("returnedItems", DataValue::List(vec![DataValue::Map(fields([("taxAmount", DataValue::Int(12))]))])),
                ("isFullReturn", DataValue::Bool(i % 3 == 0)),
                ("shippingTaxRefunded", DataValue::Int(4)),
                ("returnDate", DataValue::from(format!("2024-03-{:02}", i % 28 + 1).as_str())),
            ]))
            .unwrap();
    }
    store
}

fn bench_balance(c: &mut Criterion) {
    let store = seed_data();

    let per_field = BalanceAggregator::new(store.clone());
    c.bench_function("balance_per_field", |b| {
        b.iter(|| per_field.compute(black_box("bank")).unwrap())
    });

    let deduped = BalanceAggregator::new(store).with_sales_matching(SalesMatching::DedupeById);
    c.bench_function("balance_dedupe_by_id", |b| {
        b.iter(|| deduped.compute(black_box("bank")).unwrap())
    });
}

fn bench_tax_returned(c: &mut Criterion) {
    let store = seed_data();
    let returns = SalesReturnService::new(store);
    let start = time::Date::from_calendar_date(2024, time::Month::March, 1).unwrap();
    let end = time::Date::from_calendar_date(2024, time::Month::March, 31).unwrap();

    c.bench_function("total_tax_returned", |b| {
        b.iter(|| returns.total_tax_returned(black_box(start), black_box(end)).unwrap())
    });
}

fn bench_expense_ledger(c: &mut Criterion) {
    let store = seed_data();

    c.bench_function("expense_ledger_view", |b| {
        b.iter(|| {
            let ledger = ExpenseLedger::load(store.as_ref()).unwrap();
            ledger.view(black_box("expense 1"), 2)
        })
    });
}

criterion_group!(benches, bench_balance, bench_tax_returned, bench_expense_ledger);
criterion_main!(benches);
