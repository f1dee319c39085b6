use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, Statement};
use uuid::Uuid;

use engine::{
    CategoryTotal, ContextOptions, EngineError, ExpenseService, Expenses, ExpensesContext,
    NewExpense, UNCATEGORIZED,
};
use migration::MigratorTrait;

async fn service_with_db() -> (Expenses, ExpensesContext) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let context = ExpensesContext::builder().database(db).build();
    (Expenses::new(context.clone()), context)
}

async fn connect_file_db(path: &std::path::Path, max_connections: u32) -> ExpensesContext {
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let options = ContextOptions::new(url).max_connections(max_connections);
    let context = ExpensesContext::connect(&options).await.unwrap();
    migration::Migrator::up(context.database(), None)
        .await
        .unwrap();
    context
}

fn test_db_path() -> std::path::PathBuf {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    root.join(format!("engine_{}.db", Uuid::new_v4()))
}

fn total(category: &str, total_minor: i64) -> CategoryTotal {
    CategoryTotal {
        category: category.to_string(),
        total_minor,
    }
}

async fn record_all<S: ExpenseService>(service: &S, items: &[(i64, Option<&str>)]) {
    for (amount_minor, category) in items {
        service
            .add(NewExpense::new(*amount_minor, *category))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn all_on_empty_store_is_empty() {
    let (service, _context) = service_with_db().await;

    assert!(service.all().await.unwrap().is_empty());
    assert!(service.chart_data().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_assigns_identity_and_is_listed_once() {
    let (service, _context) = service_with_db().await;
    let occurred_at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap();

    let stored = service
        .add(
            NewExpense::new(1250, Some(" Food "))
                .with_description("  groceries ")
                .with_occurred_at(occurred_at),
        )
        .await
        .unwrap();

    assert!(stored.id > 0);
    assert_eq!(stored.amount_minor, 1250);
    assert_eq!(stored.category, "Food");
    assert_eq!(stored.description.as_deref(), Some("groceries"));
    assert_eq!(stored.occurred_at, occurred_at);

    let all = service.all().await.unwrap();
    assert_eq!(all.iter().filter(|e| e.id == stored.id).count(), 1);
    assert_eq!(all, vec![stored]);
}

#[tokio::test]
async fn identities_are_distinct() {
    let (service, _context) = service_with_db().await;

    let first = service.add(NewExpense::new(1, Some("A"))).await.unwrap();
    let second = service.add(NewExpense::new(1, Some("A"))).await.unwrap();

    assert_ne!(first.id, second.id);
    let ids: Vec<i64> = service.all().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn chart_data_sums_amounts_per_category() {
    let (service, _context) = service_with_db().await;
    record_all(
        &service,
        &[(10, Some("Food")), (5, Some("Food")), (20, Some("Travel"))],
    )
    .await;

    let chart = service.chart_data().await.unwrap();
    assert_eq!(chart, vec![total("Food", 15), total("Travel", 20)]);
}

#[tokio::test]
async fn missing_category_is_grouped_as_uncategorized() {
    let (service, _context) = service_with_db().await;
    record_all(
        &service,
        &[
            (100, None),
            (200, Some("   ")),
            (300, Some("uncategorized")),
            (50, Some("Rent")),
        ],
    )
    .await;

    let all = service.all().await.unwrap();
    assert_eq!(all.iter().filter(|e| e.category == UNCATEGORIZED).count(), 3);

    let chart = service.chart_data().await.unwrap();
    assert_eq!(chart, vec![total("Rent", 50), total(UNCATEGORIZED, 600)]);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected_without_writing() {
    let (service, _context) = service_with_db().await;

    let err = service
        .add(NewExpense::new(0, Some("Food")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_minor must be > 0".to_string())
    );
    assert!(service.add(NewExpense::new(-1, Some("Food"))).await.is_err());

    assert!(service.all().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_all_persisted() {
    let path = test_db_path();
    let service = Expenses::new(connect_file_db(&path, 8).await);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..32_i64 {
        let service = service.clone();
        tasks.spawn(async move {
            let category = if i % 2 == 0 { "Food" } else { "Travel" };
            service.add(NewExpense::new(i + 1, Some(category))).await
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        ids.push(joined.unwrap().unwrap().id);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 32);

    let all = service.all().await.unwrap();
    assert_eq!(all.len(), 32);
    // Food holds the odd amounts 1..=31, Travel the even ones 2..=32.
    assert_eq!(
        service.chart_data().await.unwrap(),
        vec![total("Food", 256), total("Travel", 272)]
    );

    drop(service);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn storage_failure_inside_scope_rolls_back_everything() {
    let (service, context) = service_with_db().await;
    service.add(NewExpense::new(10, Some("Food"))).await.unwrap();

    let scope = context.scope().await.unwrap();
    scope
        .expenses()
        .add(NewExpense::new(500, Some("Travel")))
        .await
        .unwrap();
    // Bypasses the service checks; the table constraint rejects it.
    let err = scope
        .expenses()
        .add(NewExpense::new(-5, Some("Travel")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    scope.discard().await.unwrap();

    let chart = service.chart_data().await.unwrap();
    assert_eq!(chart, vec![total("Food", 10)]);
}

#[tokio::test]
async fn storage_failure_during_add_is_returned_and_store_unchanged() {
    let (service, context) = service_with_db().await;
    service.add(NewExpense::new(5, Some("A"))).await.unwrap();

    let backend = context.database().get_database_backend();
    context
        .database()
        .execute(Statement::from_string(
            backend,
            "CREATE TRIGGER reject_expenses BEFORE INSERT ON expenses \
             BEGIN SELECT RAISE(ABORT, 'expenses are read-only'); END;",
        ))
        .await
        .unwrap();

    let err = service
        .add(NewExpense::new(20, Some("B")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(service.chart_data().await.unwrap(), vec![total("A", 5)]);
    assert_eq!(service.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn scope_add_applies_storage_rules() {
    let (service, context) = service_with_db().await;

    let scope = context.scope().await.unwrap();
    let stored = scope
        .expenses()
        .add(NewExpense::new(15, Some("A")).with_description("   "))
        .await
        .unwrap();
    assert_eq!(stored.description, None);

    let err = scope
        .expenses()
        .add(NewExpense::new(0, Some("A")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    scope.save().await.unwrap();

    assert_eq!(service.all().await.unwrap(), vec![stored]);
}

#[tokio::test]
async fn scope_mutations_are_visible_inside_and_durable_after_save() {
    let (service, context) = service_with_db().await;

    let scope = context.scope().await.unwrap();
    let staged = scope
        .expenses()
        .add(NewExpense::new(42, None))
        .await
        .unwrap();
    assert_eq!(staged.category, UNCATEGORIZED);
    assert_eq!(scope.expenses().all().await.unwrap(), vec![staged.clone()]);
    assert_eq!(
        scope.expenses().totals_by_category().await.unwrap(),
        vec![total(UNCATEGORIZED, 42)]
    );
    scope.save().await.unwrap();

    assert_eq!(service.all().await.unwrap(), vec![staged]);
}

#[tokio::test]
async fn expenses_survive_reconnect_on_file_db() {
    let path = test_db_path();

    let first = Expenses::new(connect_file_db(&path, 1).await);
    let stored = first
        .add(NewExpense::new(999, Some("Books")).with_description("Rust book"))
        .await
        .unwrap();
    drop(first);

    let second = Expenses::new(connect_file_db(&path, 1).await);
    assert_eq!(second.all().await.unwrap(), vec![stored]);
    assert_eq!(second.chart_data().await.unwrap(), vec![total("Books", 999)]);

    drop(second);
    let _ = std::fs::remove_file(&path);
}
