//! Lending ledger tests against PostgreSQL.
//!
//! Uses `DATABASE_URL` (or the default config URL) and applies the embedded
//! migrations. Each test seeds its own users and books.

use std::env;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use libris_server::{
    config::AppConfig,
    models::book::CreateBook,
    repository::{LedgerStore, LedgerTx, PgLedgerStore, Repository},
    services::LendingLedger,
    AppError, LedgerError,
};

static SEQ: AtomicU32 = AtomicU32::new(0);

struct TestDb {
    pool: Pool<Postgres>,
    repository: Repository,
    ledger: LendingLedger,
}

async fn setup() -> TestDb {
    let url = env::var("DATABASE_URL").unwrap_or_else(|_| AppConfig::default().database.url);
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let repository = Repository::new(pool.clone());
    let ledger = LendingLedger::new(Arc::new(repository.ledger_store()));

    TestDb {
        pool,
        repository,
        ledger,
    }
}

async fn seed_user(db: &TestDb) -> i32 {
    let n = SEQ.fetch_add(1, Ordering::SeqCst) % 100;
    let stamp = Utc::now().timestamp_micros() % 1_000_000_000_000;

    sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, mobile_number, password)
        VALUES ($1, $2, $3, 'hash')
        RETURNING id
        "#,
    )
    .bind(format!("Reader {}", n))
    .bind(format!("reader{}_{}@example.org", stamp, n))
    .bind(format!("{:012}{:02}", stamp, n))
    .fetch_one(&db.pool)
    .await
    .expect("Failed to seed user")
}

async fn seed_book(db: &TestDb, copies: i32) -> i32 {
    db.repository
        .books
        .create(&CreateBook {
            title: "Kindred".to_string(),
            author: "Octavia E. Butler".to_string(),
            category: "Fiction".to_string(),
            available_copies: copies,
        })
        .await
        .expect("Failed to seed book")
        .id
}

async fn copies(db: &TestDb, book_id: i32) -> i32 {
    db.repository
        .books
        .get_by_id(book_id)
        .await
        .expect("Book missing")
        .available_copies
}

async fn open_transactions(db: &TestDb, book_id: i32) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM transactions WHERE book_id = $1 AND return_date IS NULL",
    )
    .bind(book_id)
    .fetch_one(&db.pool)
    .await
    .expect("Failed to count transactions")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Run with: cargo test --test pg_ledger -- --ignored
async fn test_concurrent_borrows_of_last_copy() {
    let db = setup().await;
    let first_user = seed_user(&db).await;
    let second_user = seed_user(&db).await;
    let book_id = seed_book(&db, 1).await;

    let first = tokio::spawn({
        let ledger = db.ledger.clone();
        async move { ledger.borrow(first_user, book_id).await }
    });
    let second = tokio::spawn({
        let ledger = db.ledger.clone();
        async move { ledger.borrow(second_user, book_id).await }
    });

    let results = [
        first.await.expect("task panicked"),
        second.await.expect("task panicked"),
    ];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::NoCopiesAvailable)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(sold_out, 1);
    assert_eq!(copies(&db, book_id).await, 0);
    assert_eq!(open_transactions(&db, book_id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_many_readers_never_oversell() {
    let db = setup().await;
    let book_id = seed_book(&db, 3).await;
    let mut users = Vec::new();
    for _ in 0..10 {
        users.push(seed_user(&db).await);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user_id| {
            let ledger = db.ledger.clone();
            tokio::spawn(async move { ledger.borrow(user_id, book_id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(LedgerError::NoCopiesAvailable) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(copies(&db, book_id).await, 0);
    assert_eq!(open_transactions(&db, book_id).await, 3);
}

#[tokio::test]
#[ignore]
async fn test_double_borrow_and_double_return() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let other_user = seed_user(&db).await;
    let book_id = seed_book(&db, 2).await;

    let transaction = db.ledger.borrow(user_id, book_id).await.expect("borrow");
    assert_eq!(copies(&db, book_id).await, 1);

    let err = db.ledger.borrow(user_id, book_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyBorrowed));
    assert_eq!(copies(&db, book_id).await, 1);

    let err = db
        .ledger
        .return_book(transaction.id, other_user, false)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));

    let returned = db
        .ledger
        .return_book(transaction.id, user_id, false)
        .await
        .expect("return");
    assert!(returned.return_date.is_some());
    assert_eq!(copies(&db, book_id).await, 2);

    let err = db
        .ledger
        .return_book(transaction.id, user_id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyReturned));
    assert_eq!(copies(&db, book_id).await, 2);

    // Returned copies can be borrowed again
    db.ledger.borrow(user_id, book_id).await.expect("re-borrow");
    assert_eq!(open_transactions(&db, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_uncommitted_move_rolls_back() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let book_id = seed_book(&db, 1).await;
    let entry = db
        .ledger
        .add_to_wishlist(user_id, book_id)
        .await
        .expect("add to wishlist");

    // Run every write of a move, then drop the unit of work
    {
        let store = PgLedgerStore::new(db.pool.clone());
        let mut tx: Box<dyn LedgerTx> = store.begin().await.expect("begin");
        assert!(tx.take_copy(book_id).await.expect("take copy"));
        tx.insert_transaction(user_id, book_id, Utc::now())
            .await
            .expect("insert transaction");
        tx.delete_wishlist_entry(entry.id).await.expect("delete entry");
    }

    assert_eq!(copies(&db, book_id).await, 1);
    assert_eq!(open_transactions(&db, book_id).await, 0);
    assert_eq!(
        db.repository.wishlists.count_for_user(user_id).await.expect("count"),
        1
    );

    // The committed move applies all three writes
    db.ledger
        .move_wishlist_to_borrow(entry.id, user_id)
        .await
        .expect("move");
    assert_eq!(copies(&db, book_id).await, 0);
    assert_eq!(open_transactions(&db, book_id).await, 1);
    assert_eq!(
        db.repository.wishlists.count_for_user(user_id).await.expect("count"),
        0
    );
}

#[tokio::test]
#[ignore]
async fn test_move_without_copies_keeps_entry() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let book_id = seed_book(&db, 0).await;
    let entry = db
        .ledger
        .add_to_wishlist(user_id, book_id)
        .await
        .expect("add to wishlist");

    let err = db
        .ledger
        .move_wishlist_to_borrow(entry.id, user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoCopiesAvailable));
    assert_eq!(
        db.repository.wishlists.count_for_user(user_id).await.expect("count"),
        1
    );
    assert_eq!(open_transactions(&db, book_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_unknown_user_maps_to_not_found() {
    let db = setup().await;
    let book_id = seed_book(&db, 1).await;

    let err = db.ledger.borrow(i32::MAX, book_id).await.unwrap_err();
    match err {
        LedgerError::NotFound(message) => {
            assert_eq!(message, "User or book not found");
            assert!(!message.contains("fkey"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // The copy taken before the failed insert is rolled back
    assert_eq!(copies(&db, book_id).await, 1);

    let err = db.ledger.add_to_wishlist(i32::MAX, book_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_unique_indexes_map_to_ledger_errors() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let book_id = seed_book(&db, 5).await;
    let store = PgLedgerStore::new(db.pool.clone());

    let mut tx: Box<dyn LedgerTx> = store.begin().await.expect("begin");
    tx.insert_transaction(user_id, book_id, Utc::now())
        .await
        .expect("first insert");
    let err = tx
        .insert_transaction(user_id, book_id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyBorrowed));
    drop(tx);

    let mut tx: Box<dyn LedgerTx> = store.begin().await.expect("begin");
    tx.insert_wishlist_entry(user_id, book_id, Utc::now())
        .await
        .expect("first insert");
    let err = tx
        .insert_wishlist_entry(user_id, book_id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyInWishlist));
}

#[tokio::test]
#[ignore]
async fn test_delete_with_history_is_conflict() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let book_id = seed_book(&db, 1).await;
    db.ledger.borrow(user_id, book_id).await.expect("borrow");

    // Skips the history check, as a borrow committed after it would
    let err = db.repository.books.delete(book_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert_eq!(copies(&db, book_id).await, 0);

    let err = db.repository.users.delete(user_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert!(db.repository.users.get_by_id(user_id).await.is_ok());
}

#[tokio::test]
#[ignore]
async fn test_delete_without_history_succeeds() {
    let db = setup().await;
    let user_id = seed_user(&db).await;
    let book_id = seed_book(&db, 1).await;
    db.ledger
        .add_to_wishlist(user_id, book_id)
        .await
        .expect("add to wishlist");

    // Wishlist entries cascade
    db.repository.books.delete(book_id).await.expect("delete book");
    assert!(matches!(
        db.repository.books.get_by_id(book_id).await,
        Err(AppError::NotFound(_))
    ));

    db.repository.users.delete(user_id).await.expect("delete user");
}
