use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountKind, CreateAccountCmd, CreateCategoryCmd, CreateTransactionCmd, Currency, Engine,
    EngineError, TransactionListFilter, TransferCmd, UpdateAccountCmd, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn stored_balance(db: &DatabaseConnection, account_id: Uuid) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT balance_minor FROM accounts WHERE id = ?;",
            vec![account_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "balance_minor").unwrap()
}

async fn transaction_count(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM transactions;",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn balance_follows_every_ledger_write() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let checking = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();

    let salary = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(checking.id, 250_000, "Salary", day(2025, 3, 1)),
        )
        .await
        .unwrap();
    let rent = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(checking.id, -120_000, "Rent", day(2025, 3, 2)),
        )
        .await
        .unwrap();
    assert_eq!(stored_balance(&db, checking.id).await, 130_000);

    engine
        .update_transaction(
            rent.id,
            user.id,
            UpdateTransactionCmd {
                amount_minor: Some(-100_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stored_balance(&db, checking.id).await, 150_000);

    engine.delete_transaction(salary.id, user.id).await.unwrap();
    assert_eq!(stored_balance(&db, checking.id).await, -100_000);

    let recomputed = engine
        .recompute_account_balance(checking.id, user.id)
        .await
        .unwrap();
    assert_eq!(recomputed.minor(), -100_000);
}

#[tokio::test]
async fn reconcile_all_repairs_drifted_balances() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Cash", AccountKind::Cash))
        .await
        .unwrap();
    engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(account.id, 4_200, "Found money", day(2025, 1, 5)),
        )
        .await
        .unwrap();

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE accounts SET balance_minor = ? WHERE id = ?;",
        vec![999i64.into(), account.id.into()],
    ))
    .await
    .unwrap();

    let balances = engine.reconcile_all(user.id).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].0, account.id);
    assert_eq!(balances[0].1.minor(), 4_200);
    assert_eq!(stored_balance(&db, account.id).await, 4_200);
}

#[tokio::test]
async fn moving_a_transaction_keeps_the_total() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let checking = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let savings = engine
        .create_account(user.id, CreateAccountCmd::new("Savings", AccountKind::Savings))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(checking.id, -3_500, "Groceries", day(2025, 2, 10)),
        )
        .await
        .unwrap();

    let moved = engine
        .update_transaction(
            tx.id,
            user.id,
            UpdateTransactionCmd {
                account_id: Some(savings.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.account_id, savings.id);
    assert_eq!(stored_balance(&db, checking.id).await, 0);
    assert_eq!(stored_balance(&db, savings.id).await, -3_500);
}

#[tokio::test]
async fn moving_to_another_currency_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let usd = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let eur = engine
        .create_account(
            user.id,
            CreateAccountCmd::new("Euro", AccountKind::Checking).currency(Currency::Eur),
        )
        .await
        .unwrap();
    let tx = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(usd.id, -900, "Coffee", day(2025, 2, 10)),
        )
        .await
        .unwrap();

    let err = engine
        .update_transaction(
            tx.id,
            user.id,
            UpdateTransactionCmd {
                account_id: Some(eur.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(stored_balance(&db, usd.id).await, -900);
    assert_eq!(stored_balance(&db, eur.id).await, 0);
}

#[tokio::test]
async fn transfer_writes_both_sides() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let checking = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let savings = engine
        .create_account(user.id, CreateAccountCmd::new("Savings", AccountKind::Savings))
        .await
        .unwrap();

    let result = engine
        .transfer(
            user.id,
            TransferCmd::new(checking.id, savings.id, 10_000, day(2025, 4, 1)),
        )
        .await
        .unwrap();
    assert_eq!(result.debit.amount_minor, -10_000);
    assert_eq!(result.credit.amount_minor, 10_000);
    assert_eq!(result.debit.transfer_id, Some(result.transfer_id));
    assert_eq!(result.credit.transfer_id, Some(result.transfer_id));
    assert_eq!(result.debit.description, "Transfer");
    assert_eq!(stored_balance(&db, checking.id).await, -10_000);
    assert_eq!(stored_balance(&db, savings.id).await, 10_000);

    // Changing the amount of one side would break the pair.
    let err = engine
        .update_transaction(
            result.credit.id,
            user.id,
            UpdateTransactionCmd {
                amount_minor: Some(5_000),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Deleting one side removes both.
    engine
        .delete_transaction(result.debit.id, user.id)
        .await
        .unwrap();
    assert_eq!(transaction_count(&db).await, 0);
    assert_eq!(stored_balance(&db, checking.id).await, 0);
    assert_eq!(stored_balance(&db, savings.id).await, 0);
}

#[tokio::test]
async fn transfer_to_the_same_account_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let checking = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();

    let err = engine
        .transfer(
            user.id,
            TransferCmd::new(checking.id, checking.id, 100, day(2025, 4, 1)),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(fields) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(fields[0].field, "to_account_id");
    assert_eq!(transaction_count(&db).await, 0);
}

#[tokio::test]
async fn foreign_account_is_not_found_and_nothing_is_written() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_user("alice@example.com", None).await.unwrap();
    let mallory = engine
        .create_user("mallory@example.com", None)
        .await
        .unwrap();
    let account = engine
        .create_account(alice.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            mallory.id,
            CreateTransactionCmd::new(account.id, -500, "Sneaky", day(2025, 1, 1)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("account not exists".to_string())
    );

    let err = engine.account(account.id, mallory.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("account not exists".to_string())
    );
    assert_eq!(transaction_count(&db).await, 0);
}

#[tokio::test]
async fn failed_write_leaves_no_trace() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_user("alice@example.com", None).await.unwrap();
    let bob = engine.create_user("bob@example.com", None).await.unwrap();
    let account = engine
        .create_account(alice.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let foreign_category = engine
        .create_category(bob.id, CreateCategoryCmd::new("Food"))
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            alice.id,
            CreateTransactionCmd::new(account.id, -1_500, "Lunch", day(2025, 1, 1))
                .category(foreign_category.id),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("category not exists".to_string())
    );
    assert_eq!(transaction_count(&db).await, 0);
    assert_eq!(stored_balance(&db, account.id).await, 0);
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Cash", AccountKind::Cash))
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(account.id, 0, "Nothing", day(2025, 1, 1)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::field("amount_minor", "must not be zero"));
}

#[tokio::test]
async fn account_names_are_unique_per_user() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice@example.com", None).await.unwrap();
    let bob = engine.create_user("bob@example.com", None).await.unwrap();
    engine
        .create_account(alice.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();

    let err = engine
        .create_account(alice.id, CreateAccountCmd::new("checking", AccountKind::Savings))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .create_account(bob.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
}

#[tokio::test]
async fn archived_accounts_are_hidden_by_default() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let old = engine
        .create_account(user.id, CreateAccountCmd::new("Old card", AccountKind::Checking))
        .await
        .unwrap();
    engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();

    engine
        .update_account(
            old.id,
            user.id,
            UpdateAccountCmd {
                archived: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let visible = engine.list_accounts(user.id, false).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name, "Checking");
    assert_eq!(engine.list_accounts(user.id, true).await.unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_an_account_drops_its_transfers() {
    let (engine, db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let checking = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let savings = engine
        .create_account(user.id, CreateAccountCmd::new("Savings", AccountKind::Savings))
        .await
        .unwrap();
    engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(savings.id, 7_000, "Interest", day(2025, 1, 31)),
        )
        .await
        .unwrap();
    engine
        .transfer(
            user.id,
            TransferCmd::new(checking.id, savings.id, 2_000, day(2025, 2, 1)),
        )
        .await
        .unwrap();

    engine.delete_account(checking.id, user.id).await.unwrap();

    assert_eq!(transaction_count(&db).await, 1);
    assert_eq!(stored_balance(&db, savings.id).await, 7_000);
}

#[tokio::test]
async fn transactions_page_by_date_then_id() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    for d in 1..=5 {
        engine
            .create_transaction(
                user.id,
                CreateTransactionCmd::new(account.id, -100 * i64::from(d), "Snack", day(2025, 5, d)),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (first, cursor) = engine
        .list_transactions_page(user.id, 2, None, &filter)
        .await
        .unwrap();
    assert_eq!(
        first.iter().map(|t| t.transaction_date).collect::<Vec<_>>(),
        vec![day(2025, 5, 5), day(2025, 5, 4)]
    );
    let cursor = cursor.unwrap();

    let (second, cursor) = engine
        .list_transactions_page(user.id, 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(
        second.iter().map(|t| t.transaction_date).collect::<Vec<_>>(),
        vec![day(2025, 5, 3), day(2025, 5, 2)]
    );

    let (last, cursor) = engine
        .list_transactions_page(user.id, 2, cursor.as_deref(), &filter)
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert!(cursor.is_none());

    let err = engine
        .list_transactions_page(user.id, 2, Some("not-a-cursor"), &filter)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn list_filter_bounds_are_inclusive() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    for d in [1, 10, 20] {
        engine
            .create_transaction(
                user.id,
                CreateTransactionCmd::new(account.id, -100, "Bus", day(2025, 6, d)),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter {
        from: Some(day(2025, 6, 10)),
        to: Some(day(2025, 6, 20)),
        ..Default::default()
    };
    let listed = engine.list_transactions(user.id, &filter).await.unwrap();
    assert_eq!(listed.len(), 2);

    let inverted = TransactionListFilter {
        from: Some(day(2025, 6, 20)),
        to: Some(day(2025, 6, 10)),
        ..Default::default()
    };
    let err = engine.list_transactions(user.id, &inverted).await.unwrap_err();
    let EngineError::Validation(fields) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(fields[0].field, "from");
}
