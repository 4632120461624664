mod support;

use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use common_auth::Role;
use serde_json::json;
use support::{app_for, insert_customer, insert_product, json_body, send, token_for, TestDatabase};

async fn stock_of(pool: &sqlx::PgPool, product_id: i64) -> Result<i32> {
    Ok(sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?)
}

async fn sale_count(pool: &sqlx::PgPool) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales").fetch_one(pool).await?)
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn sale_captures_total_and_decrements_stock() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", Some("North")).await?;
    let product = insert_product(&pool, "Widget", Some("Tools"), "10.00", 5).await?;

    let response = send(
        &app,
        "POST",
        "/api/sales",
        Some(&token),
        Some(json!({"customer_id": customer, "product_id": product, "quantity": 3})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let sale = json_body(response).await;
    assert_eq!(sale["total"].as_f64(), Some(30.0));
    assert_eq!(sale["quantity"], 3);
    assert_eq!(stock_of(&pool, product).await?, 2);

    // Later price changes leave the recorded total alone.
    sqlx::query("UPDATE products SET price = 99.99 WHERE id = $1")
        .bind(product)
        .execute(&pool)
        .await?;
    let response = send(&app, "GET", &format!("/api/sales/{}", sale["id"]), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["total"].as_f64(), Some(30.0));
    assert_eq!(view["customer"], "Acme");
    assert_eq!(view["product"], "Widget");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn rejected_sales_leave_no_trace() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", None).await?;
    let product = insert_product(&pool, "Widget", None, "4.25", 2).await?;

    let cases = [
        (json!({"customer_id": customer, "product_id": product, "quantity": 3}), "insufficient_stock"),
        (json!({"customer_id": customer + 100, "product_id": product, "quantity": 1}), "invalid_customer"),
        (json!({"customer_id": customer, "product_id": product + 100, "quantity": 1}), "invalid_product"),
    ];
    for (body, code) in cases {
        let response = send(&app, "POST", "/api/sales", Some(&token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{code}");
        assert_eq!(json_body(response).await["code"], code);
    }

    assert_eq!(stock_of(&pool, product).await?, 2);
    assert_eq!(sale_count(&pool).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn concurrent_sales_cannot_oversell() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", None).await?;
    let product = insert_product(&pool, "Widget", None, "1.00", 1).await?;

    let body = json!({"customer_id": customer, "product_id": product, "quantity": 1});
    let (first, second) = tokio::join!(
        send(&app, "POST", "/api/sales", Some(&token), Some(body.clone())),
        send(&app, "POST", "/api/sales", Some(&token), Some(body.clone())),
    );
    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [201, 400]);

    assert_eq!(stock_of(&pool, product).await?, 0);
    assert_eq!(sale_count(&pool).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn referenced_rows_cannot_be_deleted() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", None).await?;
    let product = insert_product(&pool, "Widget", None, "2.00", 10).await?;
    let response = send(
        &app,
        "POST",
        "/api/sales",
        Some(&token),
        Some(json!({"customer_id": customer, "product_id": product, "quantity": 4})),
    )
    .await;
    let sale_id = json_body(response).await["id"].as_i64().expect("sale id");

    let response = send(&app, "DELETE", &format!("/api/customers/{customer}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "customer_in_use");

    let response = send(&app, "DELETE", &format!("/api/products/{product}"), Some(&token), None).await;
    assert_eq!(json_body(response).await["code"], "product_in_use");

    let response = send(&app, "DELETE", &format!("/api/sales/{sale_id}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "Sale deleted");
    // Deleting a sale does not restock.
    assert_eq!(stock_of(&pool, product).await?, 6);

    let response = send(&app, "DELETE", &format!("/api/sales/{sale_id}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/api/customers/{customer}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn customer_cannot_vanish_under_a_pending_sale() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", None).await?;
    let product = insert_product(&pool, "Widget", None, "3.00", 5).await?;

    // Park the sale on the product lock, after it has passed the customer check.
    let mut holder = pool.begin().await?;
    sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(product)
        .execute(&mut *holder)
        .await?;

    let sale = tokio::spawn({
        let (app, token) = (app.clone(), token.clone());
        async move {
            let body = json!({"customer_id": customer, "product_id": product, "quantity": 2});
            send(&app, "POST", "/api/sales", Some(&token), Some(body)).await
        }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    let delete = tokio::spawn({
        let (app, token) = (app.clone(), token.clone());
        async move { send(&app, "DELETE", &format!("/api/customers/{customer}"), Some(&token), None).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!delete.is_finished(), "customer delete must wait for the pending sale");

    holder.commit().await?;

    let sale = sale.await?;
    assert_eq!(sale.status(), StatusCode::CREATED);
    let delete = delete.await?;
    assert_eq!(delete.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(delete).await["code"], "customer_in_use");

    assert_eq!(stock_of(&pool, product).await?, 3);
    assert_eq!(sale_count(&pool).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires SALES_TEST_DATABASE_URL)")]
async fn widest_prices_and_quantities_fit_the_sale_total() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let pool = db.pool_clone();
    let (app, _) = app_for(pool.clone())?;
    let token = token_for(1, Role::Employee, 300);

    let customer = insert_customer(&pool, "Acme", None).await?;
    let product = insert_product(&pool, "Press", None, "9999999.99", 2_000_000).await?;

    let response = send(
        &app,
        "POST",
        "/api/sales",
        Some(&token),
        Some(json!({"customer_id": customer, "product_id": product, "quantity": 2_000_000})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let total = sqlx::query_scalar::<_, String>("SELECT total::TEXT FROM sales")
        .fetch_one(&pool)
        .await?;
    assert_eq!(total, "19999999980000000.00");
    assert_eq!(stock_of(&pool, product).await?, 0);

    let response = send(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(json!({"name": "Vault", "price": "100000000000", "stock": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "invalid_price");
    Ok(())
}
