//! End-to-end listing against a real PostgreSQL.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p namelist-server -- --ignored
//!
//! Each test creates its own schema, points the descriptor at it through the
//! schema override, and drops it afterwards.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use sqlx::postgres::PgPool;
use tower::ServiceExt;

use namelist_server::{
    build_router, resolve, CustomerRepo, ListingError, Overrides, PoolSettings, RequestContext,
    StorePool, PAGE_SIZE,
};

struct Fixture {
    admin: PgPool,
    schema: String,
    pool: StorePool,
}

impl Fixture {
    async fn new(names: &[Option<String>]) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let schema = format!("namelist_test_{}_{}", std::process::id(), nanos);

        let admin = PgPool::connect(&url).await.expect("admin connect failed");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .unwrap();
        sqlx::query(&format!("CREATE TABLE {}.customer (c_name TEXT)", schema))
            .execute(&admin)
            .await
            .unwrap();
        for name in names {
            sqlx::query(&format!("INSERT INTO {}.customer (c_name) VALUES ($1)", schema))
                .bind(name.as_deref())
                .execute(&admin)
                .await
                .unwrap();
        }

        let descriptor = resolve(
            Some(&url),
            &Overrides {
                schema: Some(schema.clone()),
                ..Overrides::default()
            },
        )
        .expect("descriptor");
        let pool = StorePool::open(&descriptor, PoolSettings::default())
            .await
            .expect("pool");

        Self {
            admin,
            schema,
            pool,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .unwrap();
    }
}

/// Twenty distinct names, inserted out of order.
fn twenty_names() -> Vec<Option<String>> {
    (0..20)
        .rev()
        .map(|i| Some(format!("Customer#{:09}", i * 7 % 20)))
        .collect()
}

#[tokio::test]
#[ignore = "requires database"]
async fn first_page_is_sorted_and_total_counts_everything() {
    let fixture = Fixture::new(&twenty_names()).await;

    let page = CustomerRepo::new(&fixture.pool)
        .page(RequestContext::new())
        .await
        .expect("listing failed");

    assert_eq!(page.records.len(), PAGE_SIZE as usize);
    assert_eq!(page.total, 20);
    let names: Vec<_> = page.records.iter().map(|r| r.name.clone()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert_eq!(names[0], "Customer#000000000");
    assert_eq!(names[14], "Customer#000000014");

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn index_page_renders_fifteen_of_twenty() {
    let fixture = Fixture::new(&twenty_names()).await;
    let app = build_router(fixture.pool.clone());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Showing 15 of 20 (page size 15)"));
    assert!(html.contains("<tr><td>1</td><td>Customer#000000000</td></tr>"));
    assert!(html.contains("<tr><td>15</td><td>Customer#000000014</td></tr>"));
    assert!(!html.contains("Customer#000000015"));
    assert!(!html.contains("class=\"error\""));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn short_store_lists_everything() {
    let names = vec![Some("Zed".to_string()), Some("Amy".to_string())];
    let fixture = Fixture::new(&names).await;

    let page = CustomerRepo::new(&fixture.pool)
        .page(RequestContext::new())
        .await
        .unwrap();
    let listed: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(listed, ["Amy", "Zed"]);
    assert_eq!(page.total, 2);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn null_name_is_a_scan_error_with_no_partial_data() {
    let names = vec![Some("Amy".to_string()), None];
    let fixture = Fixture::new(&names).await;

    let err = CustomerRepo::new(&fixture.pool)
        .page(RequestContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ListingError::Scan(_)));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_relation_is_a_query_error() {
    let fixture = Fixture::new(&[]).await;
    sqlx::query(&format!("DROP TABLE {}.customer", fixture.schema))
        .execute(&fixture.admin)
        .await
        .unwrap();

    let err = CustomerRepo::new(&fixture.pool)
        .page(RequestContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ListingError::Query { .. }));
    assert!(!err.is_deadline_exceeded());

    fixture.teardown().await;
}
