use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::America::Sao_Paulo;
use serde_json::json;
use uuid::Uuid;

use engine::{
    Admission, Author, Collection, Engine, EngineError, EntryKind, FileStore, KeywordAdded,
    MemoryStore, MoneyCents, OTHER_CATEGORY, Period, Sender, Store,
};

fn engine_with_store() -> (Engine, MemoryStore) {
    let store = MemoryStore::default();
    let engine = Engine::builder()
        .store(store.clone())
        .timezone(Sao_Paulo)
        .build()
        .unwrap();
    (engine, store)
}

fn test_store_root() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_stores")
        .join(Uuid::new_v4().to_string())
}

fn march(day: u32) -> DateTime<Utc> {
    Sao_Paulo
        .with_ymd_and_hms(2025, 3, day, 12, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn fresh_engine_has_default_categories() {
    let (engine, _store) = engine_with_store();
    assert!(engine.ledger().is_empty());
    assert_eq!(engine.classify("mercado"), "alimentação");
    assert_eq!(engine.classify("qualquer coisa"), OTHER_CATEGORY);
    assert!(engine.owner_binding().is_none());
}

#[test]
fn expense_is_classified_and_saved() {
    let (mut engine, store) = engine_with_store();

    let entry = engine.record_expense(MoneyCents::new(5000), "mercado", Author::Owner, march(3));
    assert_eq!(entry.category, "alimentação");
    assert_eq!(entry.kind, EntryKind::Text);

    let entry = engine.record_expense(
        MoneyCents::new(1200),
        "  pet shop ",
        Author::Contact("5511".to_string()),
        march(3),
    );
    assert_eq!(entry.category, "pet shop");

    let saved = store.snapshot(Collection::Entries).unwrap();
    assert_eq!(saved.as_array().unwrap().len(), 2);
    assert_eq!(saved[0]["author"], "self");
    assert_eq!(saved[1]["author"], "5511");
}

#[test]
fn undo_restores_previous_ledger() {
    let (mut engine, store) = engine_with_store();
    engine.record_expense(MoneyCents::new(5000), "mercado", Author::Owner, march(3));
    let before = engine.ledger().clone();
    let saved_before = store.snapshot(Collection::Entries);

    engine.record_income(MoneyCents::new(100_000), "salário", Author::Owner, march(4));
    let removed = engine.undo_last().unwrap();

    assert_eq!(removed.kind, EntryKind::Income);
    assert_eq!(engine.ledger(), &before);
    assert_eq!(store.snapshot(Collection::Entries), saved_before);
}

#[test]
fn undo_and_amend_fail_on_empty_ledger() {
    let (mut engine, _store) = engine_with_store();
    assert_eq!(engine.undo_last().unwrap_err(), EngineError::EmptyLedger);
    assert_eq!(
        engine
            .amend_receipt(MoneyCents::new(100), "farmácia")
            .unwrap_err(),
        EngineError::NoReceiptPending
    );
}

#[test]
fn receipt_upload_then_amend() {
    let (mut engine, store) = engine_with_store();

    let pending = engine
        .record_receipt(b"image", "jpeg", Author::Owner, march(5))
        .unwrap();
    assert_eq!(pending.kind, EntryKind::ReceiptPending);
    assert_eq!(pending.value, MoneyCents::ZERO);
    let reference = pending.attachment.clone().unwrap();
    assert!(reference.starts_with("receipt_") && reference.ends_with(".jpeg"));
    assert_eq!(store.receipt(&reference), Some(b"image".to_vec()));

    let amended = engine
        .amend_receipt(MoneyCents::new(4590), "farmácia")
        .unwrap();
    assert_eq!(amended.kind, EntryKind::Receipt);
    assert_eq!(amended.category, "saúde");
    assert_eq!(amended.attachment, Some(reference));

    // Amended receipts are not pending anymore.
    assert_eq!(
        engine
            .amend_receipt(MoneyCents::new(1), "farmácia")
            .unwrap_err(),
        EngineError::NoReceiptPending
    );
}

#[test]
fn failed_writes_keep_memory_state_and_retry() {
    let (mut engine, store) = engine_with_store();
    store.fail_writes(true);

    engine.record_expense(MoneyCents::new(5000), "mercado", Author::Owner, march(3));
    assert_eq!(engine.ledger().len(), 1);
    assert!(engine.has_unsaved());
    assert_eq!(engine.unsaved().collect::<Vec<_>>(), vec![Collection::Entries]);
    assert!(store.snapshot(Collection::Entries).is_none());

    store.fail_writes(false);
    engine.set_budget("lazer", MoneyCents::new(10_000)).unwrap();
    assert!(!engine.has_unsaved());
    assert_eq!(
        store.snapshot(Collection::Entries).unwrap().as_array().unwrap().len(),
        1
    );
}

#[test]
fn keywords_and_contacts_persist_only_on_change() {
    let (mut engine, store) = engine_with_store();

    assert_eq!(engine.add_keyword("ração", "pets"), KeywordAdded::CategoryCreated);
    let saved = store.snapshot(Collection::Categories).unwrap();
    assert_eq!(saved.as_array().unwrap().last().unwrap()["name"], "pets");

    store.fail_writes(true);
    assert_eq!(engine.add_keyword("ração", "pets"), KeywordAdded::AlreadyPresent);
    assert!(!engine.has_unsaved());
    store.fail_writes(false);

    assert!(engine.allow_contact("5511"));
    assert!(!engine.allow_contact("5511"));
    assert_eq!(store.snapshot(Collection::AllowList), Some(json!(["5511"])));
    assert!(engine.remove_contact("5511"));
    assert_eq!(store.snapshot(Collection::AllowList), Some(json!([])));
}

#[test]
fn owner_binding_gates_owner_messages() {
    let (mut engine, store) = engine_with_store();
    let owner = |conversation| Sender {
        from_self: true,
        id: "owner",
        conversation,
    };

    assert_eq!(engine.admit(owner("chat-1")), Admission::BindOwner);
    engine.bind_owner("chat-1");
    assert_eq!(
        store.snapshot(Collection::OwnerBinding),
        Some(json!({ "chatId": "chat-1" }))
    );
    assert_eq!(engine.admit(owner("chat-1")), Admission::Pass);
    assert_eq!(engine.admit(owner("chat-2")), Admission::ForeignConversation);
}

#[test]
fn state_survives_restart_with_file_store() {
    let root = test_store_root();
    {
        let mut engine = Engine::builder()
            .store(FileStore::new(&root))
            .timezone(Sao_Paulo)
            .build()
            .unwrap();
        engine.record_expense(MoneyCents::new(5000), "mercado", Author::Owner, march(3));
        engine.set_budget("alimentação", MoneyCents::new(40_000)).unwrap();
        engine.add_keyword("padaria", "alimentação");
        engine.allow_contact("5511");
        engine.bind_owner("chat-1");
    }

    let engine = Engine::builder()
        .store(FileStore::new(&root))
        .timezone(Sao_Paulo)
        .build()
        .unwrap();
    assert_eq!(engine.ledger().len(), 1);
    assert_eq!(
        engine.budgets().get("alimentação"),
        Some(MoneyCents::new(40_000))
    );
    assert_eq!(engine.classify("pão na padaria"), "alimentação");
    assert!(engine.allow_list().contains("5511"));
    assert_eq!(engine.owner_binding().unwrap().conversation, "chat-1");

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn corrupt_collection_aborts_build() {
    let store = MemoryStore::default();
    store
        .save(Collection::Budgets, &json!({ "not": "a list" }))
        .unwrap();

    let result = Engine::builder().store(store).build();
    assert!(matches!(result, Err(EngineError::Store(_))));
}

#[test]
fn flush_rewrites_every_collection() {
    let (mut engine, store) = engine_with_store();
    engine.flush().unwrap();
    for collection in Collection::ALL {
        assert!(store.snapshot(collection).is_some(), "{collection} missing");
    }
    assert_eq!(store.snapshot(Collection::OwnerBinding), Some(json!(null)));
}

#[test]
fn totals_saturate_instead_of_overflowing() {
    let (mut engine, _store) = engine_with_store();
    let huge = MoneyCents::new(i64::MAX - 1);
    let now = march(20);

    engine.set_budget("alimentação", MoneyCents::new(10_000)).unwrap();
    for day in 1..=3 {
        engine.record_expense(huge, "mercado", Author::Owner, march(day));
    }
    engine.record_income(huge, "salário", Author::Owner, now);
    engine.record_income(huge, "bônus", Author::Owner, now);

    let ledger = engine.ledger();
    assert_eq!(ledger.total_expenses(), MoneyCents::new(i64::MAX));
    assert_eq!(ledger.by_category().get("alimentação"), MoneyCents::new(i64::MAX));
    assert_eq!(ledger.balance(), MoneyCents::ZERO);

    let alerts = engine.check_alerts(now);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].spent, MoneyCents::new(i64::MAX));
    assert!(!engine.insights(now).is_empty());
    assert_eq!(
        engine.period_totals(Period::Month, now).total(),
        MoneyCents::new(i64::MAX)
    );
}
