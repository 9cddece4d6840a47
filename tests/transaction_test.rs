mod common;

use common::{brand, daily, day, TestDatabase};
use market_data_store::database::repositories::*;
use market_data_store::database::DatabaseError;
use rust_decimal_macros::dec;

#[test]
fn test_do_in_tx_commits_on_success() {
    let Some(db) = TestDatabase::connect() else {
        return;
    };
    let repo = StockBrandRepositoryImpl::new();

    let written = db
        .database
        .do_in_tx(|tx| {
            assert!(tx.in_transaction());
            assert!(tx.transaction().is_some());
            repo.upsert_stock_brands(tx, &[brand("b1", "1001", "111")])
        })
        .unwrap();
    assert_eq!(written, 1);

    let mut ctx = db.context();
    assert!(repo.find_by_symbol(&mut ctx, "1001").unwrap().is_some());
}

#[test]
fn test_do_in_tx_rolls_back_every_write_on_error() {
    let Some(db) = TestDatabase::connect() else {
        return;
    };
    let brands = StockBrandRepositoryImpl::new();
    let prices = DailyPriceRepositoryImpl::new();

    let result: Result<(), DatabaseError> = db.database.do_in_tx(|tx| {
        brands.upsert_stock_brands(tx, &[brand("b1", "1001", "111")])?;
        prices.create_or_update(tx, &[daily("1001", "b1", day(2023, 1, 4), dec!(100))])?;

        // Writes are visible inside the transaction
        assert!(brands.find_by_symbol(tx, "1001")?.is_some());

        Err(DatabaseError::InvalidInput("abort".to_string()))
    });
    assert!(result.unwrap_err().is_invalid_input());

    let mut ctx = db.context();
    assert!(brands.find_all(&mut ctx).unwrap().is_empty());
    assert!(prices
        .get_latest_price_by_symbol(&mut ctx, "1001")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_do_in_tx_rolls_back_on_query_failure() {
    let Some(db) = TestDatabase::connect() else {
        return;
    };
    let brands = StockBrandRepositoryImpl::new();

    let result: Result<(), DatabaseError> = db.database.do_in_tx(|tx| {
        brands.upsert_stock_brands(tx, &[brand("b1", "1001", "111")])?;
        // A second active brand with the same symbol violates the unique index
        brands.upsert_stock_brands(tx, &[brand("b2", "1001", "111")])?;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(DatabaseError::Query {
            operation: "upsert stock brands",
            ..
        })
    ));

    let mut ctx = db.context();
    assert!(brands.find_all(&mut ctx).unwrap().is_empty());
}

#[test]
fn test_nested_do_in_tx_is_rejected() {
    let Some(db) = TestDatabase::connect() else {
        return;
    };

    let result: Result<(), DatabaseError> = db.database.do_in_tx(|tx| {
        tx.do_in_tx(|_inner| Ok::<_, DatabaseError>(()))
    });

    assert!(matches!(result, Err(DatabaseError::NestedTransaction)));
}

#[test]
fn test_calls_outside_do_in_tx_are_not_transactional() {
    let Some(db) = TestDatabase::connect() else {
        return;
    };
    let mut ctx = db.context();
    assert!(!ctx.in_transaction());

    let repo = StockBrandRepositoryImpl::new();
    repo.upsert_stock_brands(&mut ctx, &[brand("b1", "1001", "111")])
        .unwrap();
    assert!(repo
        .upsert_stock_brands(&mut ctx, &[brand("b2", "1001", "111")])
        .is_err());

    // The first write stands on its own
    assert_eq!(repo.find_all(&mut ctx).unwrap().len(), 1);
}
