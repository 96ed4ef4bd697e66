use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountKind, CreateAccountCmd, CreateCategoryCmd, CreateRecurringPaymentCmd,
    CreateTransactionCmd, Engine, Frequency, RecurringSource, RecurringStatus, SuggestionKind,
    TransactionListFilter, UpdateRecurringPaymentCmd, recurring::normalize_merchant,
};
use migration::MigratorTrait;

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

#[tokio::test]
async fn linked_payment_advances_the_due_date() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let gym = engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd::new("Gym", 4_000, Frequency::Monthly, day(2025, 3, 1))
                .account(account.id),
        )
        .await
        .unwrap();
    assert_eq!(gym.source, RecurringSource::Manual);
    assert_eq!(gym.merchant_pattern, "gym");

    engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(account.id, -4_000, "GYM", day(2025, 3, 1))
                .recurring_payment(gym.id),
        )
        .await
        .unwrap();
    let advanced = engine.recurring_payment(gym.id, user.id).await.unwrap();
    assert_eq!(advanced.next_due_date, day(2025, 4, 1));
    assert_eq!(advanced.last_payment_date, Some(day(2025, 3, 1)));

    // A late-recorded older payment never moves the schedule backwards.
    engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(account.id, -4_000, "GYM", day(2025, 2, 1))
                .recurring_payment(gym.id),
        )
        .await
        .unwrap();
    let unchanged = engine.recurring_payment(gym.id, user.id).await.unwrap();
    assert_eq!(unchanged.next_due_date, day(2025, 4, 1));
    assert_eq!(unchanged.last_payment_date, Some(day(2025, 3, 1)));
}

#[tokio::test]
async fn detect_then_track_links_the_history() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    for date in [
        day(2025, 1, 15),
        day(2025, 2, 15),
        day(2025, 3, 15),
        day(2025, 4, 15),
    ] {
        engine
            .create_transaction(
                user.id,
                CreateTransactionCmd::new(account.id, -1_599, "NETFLIX.COM 8842", date),
            )
            .await
            .unwrap();
    }
    for (date, amount) in [(day(2025, 1, 3), -450), (day(2025, 3, 28), -380)] {
        engine
            .create_transaction(
                user.id,
                CreateTransactionCmd::new(account.id, amount, "Corner Cafe", date),
            )
            .await
            .unwrap();
    }

    let detected = engine
        .detect_recurring_payments(account.id, user.id, day(2025, 4, 20))
        .await
        .unwrap();
    assert_eq!(detected.len(), 1);
    let pattern = &detected[0];
    assert_eq!(pattern.merchant_pattern, normalize_merchant("NETFLIX.COM 8842"));
    assert_eq!(pattern.frequency, Frequency::Monthly);
    assert_eq!(pattern.typical_amount_minor, 1_599);
    assert_eq!(pattern.occurrences, 4);
    assert_eq!(pattern.next_due_date, day(2025, 5, 15));
    assert!(pattern.confidence > 0.5 && pattern.confidence <= 1.0);

    // Detection alone stores nothing.
    assert!(
        engine
            .list_recurring_payments(user.id, None)
            .await
            .unwrap()
            .is_empty()
    );

    let tracked = engine
        .track_detected_payments(account.id, user.id, day(2025, 4, 20))
        .await
        .unwrap();
    assert_eq!(tracked.len(), 1);
    let payment = &tracked[0];
    assert_eq!(payment.source, RecurringSource::Detected);
    assert_eq!(payment.status, RecurringStatus::Active);
    assert_eq!(payment.account_id, Some(account.id));
    assert_eq!(payment.last_payment_date, Some(day(2025, 4, 15)));

    let linked = engine
        .list_transactions(
            user.id,
            &TransactionListFilter {
                account_id: Some(account.id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.recurring_payment_id == Some(payment.id))
        .count();
    assert_eq!(linked, 4);

    // Already tracked patterns are not offered again.
    let again = engine
        .detect_recurring_payments(account.id, user.id, day(2025, 4, 20))
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn updated_merchant_pattern_covers_detected_history() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    for date in [day(2025, 1, 15), day(2025, 2, 15), day(2025, 3, 15)] {
        engine
            .create_transaction(
                user.id,
                CreateTransactionCmd::new(account.id, -1_599, "NETFLIX.COM 8842", date),
            )
            .await
            .unwrap();
    }
    let streaming = engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd::new("Streaming", 1_599, Frequency::Monthly, day(2025, 4, 15)),
        )
        .await
        .unwrap();
    assert_eq!(streaming.merchant_pattern, "streaming");

    let as_of = day(2025, 3, 20);
    let detected = engine
        .detect_recurring_payments(account.id, user.id, as_of)
        .await
        .unwrap();
    assert_eq!(detected.len(), 1);

    let updated = engine
        .update_recurring_payment(
            streaming.id,
            user.id,
            UpdateRecurringPaymentCmd {
                merchant_pattern: Some("NETFLIX.COM 8842".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.merchant_pattern, normalize_merchant("NETFLIX.COM 8842"));
    assert_eq!(updated.name, "Streaming");
    assert!(
        engine
            .detect_recurring_payments(account.id, user.id, as_of)
            .await
            .unwrap()
            .is_empty()
    );

    let reset = engine
        .update_recurring_payment(
            streaming.id,
            user.id,
            UpdateRecurringPaymentCmd {
                merchant_pattern: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reset.merchant_pattern, "streaming");
}

#[tokio::test]
async fn deleting_a_recurring_payment_keeps_transactions() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let account = engine
        .create_account(user.id, CreateAccountCmd::new("Checking", AccountKind::Checking))
        .await
        .unwrap();
    let rent = engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd::new("Rent", 90_000, Frequency::Monthly, day(2025, 1, 1)),
        )
        .await
        .unwrap();
    let tx = engine
        .create_transaction(
            user.id,
            CreateTransactionCmd::new(account.id, -90_000, "Rent", day(2025, 1, 1))
                .recurring_payment(rent.id),
        )
        .await
        .unwrap();

    engine
        .delete_recurring_payment(rent.id, user.id)
        .await
        .unwrap();

    let kept = engine
        .list_transactions(user.id, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, tx.id);
    assert_eq!(kept[0].recurring_payment_id, None);
}

#[tokio::test]
async fn budget_impact_groups_by_category() {
    let (engine, _db) = engine_with_db().await;
    let user = engine.create_user("alice@example.com", None).await.unwrap();
    let fun = engine
        .create_category(user.id, CreateCategoryCmd::new("Entertainment").budget_share(30.0))
        .await
        .unwrap();

    for (name, amount, due) in [
        ("Netflix", 1_599, day(2025, 5, 15)),
        ("Spotify", 999, day(2025, 5, 20)),
    ] {
        engine
            .create_recurring_payment(
                user.id,
                CreateRecurringPaymentCmd::new(name, amount, Frequency::Monthly, due)
                    .category(fun.id),
            )
            .await
            .unwrap();
    }
    engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd::new("Gym", 12_000, Frequency::Yearly, day(2025, 12, 1)),
        )
        .await
        .unwrap();
    let paused = engine
        .create_recurring_payment(
            user.id,
            CreateRecurringPaymentCmd::new("Magazine", 500, Frequency::Monthly, day(2025, 5, 3)),
        )
        .await
        .unwrap();
    engine
        .update_recurring_payment(
            paused.id,
            user.id,
            UpdateRecurringPaymentCmd {
                status: Some(RecurringStatus::Paused),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = engine
        .budget_impact(user.id, day(2025, 5, 1), 30)
        .await
        .unwrap();

    let impact = &report.impact;
    assert_eq!(impact.total_monthly_minor, 3_598);
    assert_eq!(impact.total_yearly_minor, 43_176);
    assert_eq!(impact.categories.len(), 2);
    assert_eq!(impact.categories[0].name, "Entertainment");
    assert_eq!(impact.categories[0].monthly_minor, 2_598);
    assert_eq!(impact.categories[0].payment_count, 2);
    assert_eq!(impact.categories[1].name, "Uncategorized");
    assert_eq!(impact.categories[1].monthly_minor, 1_000);

    assert_eq!(impact.suggestions.len(), 1);
    assert_eq!(impact.suggestions[0].kind, SuggestionKind::CategoryOverspend);
    assert_eq!(impact.suggestions[0].category_id, Some(fun.id));

    let projection = &report.projection;
    assert_eq!(projection.to, day(2025, 5, 31));
    assert_eq!(
        projection
            .payments
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Netflix", "Spotify"]
    );
    assert_eq!(projection.total_minor, 2_598);
}
