//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tally_core::db::Database;
use tally_core::models::NewCategoryRule;
use tower::ServiceExt;

const SCHEMA1_CSV: &str = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
01/15/2024,01/16/2024,STARBUCKS #123,Food & Drink,Sale,-4.50,\n\
01/16/2024,01/17/2024,NETFLIX.COM,Entertainment,Sale,-15.99,\n\
,01/18/2024,PENDING,Shopping,Sale,-1.00,\n";

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    let app = create_router(db.clone(), ServerConfig::default());
    (app, db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(field: &str, filename: &str, content: &str) -> Request<Body> {
    let boundary = "tally-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/api/upload-csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn upload_schema1(app: &Router) {
    let response = app
        .clone()
        .oneshot(upload_request("file", "statement.csv", SCHEMA1_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let (app, _db) = setup_test_app();

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

// ========== Upload ==========

#[tokio::test]
async fn test_upload_csv() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(upload_request("file", "statement.csv", SCHEMA1_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["format_detected"], "format1");
    assert_eq!(json["total_rows"], 3);
    assert_eq!(json["saved_transactions"], 2);
    assert_eq!(json["skipped_undated"], 1);
    assert!(json["failed_rows"].as_array().unwrap().is_empty());
    assert_eq!(json["message"], "Successfully imported 2 transactions");

    assert_eq!(db.count_transactions().unwrap(), 2);
}

#[tokio::test]
async fn test_upload_schema2_reports_failed_rows() {
    let (app, _db) = setup_test_app();
    let csv = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
DEBIT,02/01/2024,UBER TRIP,-23.10,DEBIT_CARD,1976.90,\n\
DEBIT,02/02/2024,BROKEN,abc,DEBIT_CARD,,\n";

    let response = app
        .oneshot(upload_request("file", "Chase.CSV", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["format_detected"], "format2");
    assert_eq!(json["saved_transactions"], 1);
    let failed = json["failed_rows"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["row"], 2);
}

#[tokio::test]
async fn test_upload_rejects_non_csv() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(upload_request("file", "statement.txt", SCHEMA1_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Only CSV files are allowed");
    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(upload_request("attachment", "statement.csv", SCHEMA1_CSV))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_upload_empty_csv() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(upload_request(
            "file",
            "empty.csv",
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "CSV file is empty");
}

// ========== Transactions ==========

#[tokio::test]
async fn test_list_transactions() {
    let (app, _db) = setup_test_app();
    upload_schema1(&app).await;

    let response = app
        .oneshot(get("/api/transactions?per_page=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["pagination"]["total"], 2);
    assert_eq!(json["pagination"]["pages"], 2);
    assert_eq!(json["pagination"]["per_page"], 1);

    let txs = json["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 1);
    // Newest first
    assert_eq!(txs[0]["description"], "NETFLIX.COM");
    assert_eq!(txs[0]["transaction_date"], "2024-01-16");
    assert_eq!(txs[0]["category"], "Uncategorized");
    assert_eq!(txs[0]["csv_format"], "format1");
    assert_eq!(txs[0]["bank_category"], "Entertainment");
    assert_eq!(txs[0]["amount"].as_f64(), Some(-15.99));
}

#[tokio::test]
async fn test_list_transactions_filters() {
    let (app, _db) = setup_test_app();
    upload_schema1(&app).await;

    let response = app
        .clone()
        .oneshot(get("/api/transactions?category=eating"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["transactions"][0]["description"], "STARBUCKS #123");

    let response = app
        .oneshot(get(
            "/api/transactions?start_date=2024-01-16&end_date=2024-01-31",
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["transactions"][0]["description"], "NETFLIX.COM");
}

#[tokio::test]
async fn test_list_transactions_invalid_date() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(get("/api/transactions?start_date=01/15/2024"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_manual_category() {
    let (app, db) = setup_test_app();
    upload_schema1(&app).await;
    let id = db.all_transactions().unwrap()[0].id;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/transactions/{}/manual-category", id),
            serde_json::json!({ "category": "Coffee" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Coffee");
    assert_eq!(json["manual_category"], "Coffee");
    assert_eq!(json["auto_category"], "Eating Out");

    // null clears the override
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/transactions/{}/manual-category", id),
            serde_json::json!({ "category": null }),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Eating Out");
    assert!(json["manual_category"].is_null());
}

#[tokio::test]
async fn test_set_manual_category_not_found() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/transactions/999/manual-category",
            serde_json::json!({ "category": "Coffee" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Category Rules ==========

#[tokio::test]
async fn test_list_rules_in_order() {
    let (app, _db) = setup_test_app();

    let response = app.oneshot(get("/api/category-rules")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let rules = json.as_array().unwrap();
    assert_eq!(rules.len(), 6);
    assert_eq!(rules[0]["category_name"], "Groceries");
    assert_eq!(rules[5]["category_name"], "Transportation");
    assert_eq!(rules[0]["is_active"], true);
    assert!(rules[0]["regex_pattern"].as_str().unwrap().contains("kroger"));
}

#[tokio::test]
async fn test_create_rule_recategorizes() {
    let (app, db) = setup_test_app();
    upload_schema1(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/category-rules",
            serde_json::json!({ "category_name": "Streaming", "regex_pattern": "netflix" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["category_name"], "Streaming");
    assert_eq!(json["regex_pattern"], "netflix");
    assert_eq!(json["is_active"], true);
    assert_eq!(json["position"], 6);
    assert_eq!(json["updated_transactions"], 1);

    let netflix = db
        .all_transactions()
        .unwrap()
        .into_iter()
        .find(|t| t.description == "NETFLIX.COM")
        .unwrap();
    assert_eq!(netflix.auto_category.as_deref(), Some("Streaming"));
}

#[tokio::test]
async fn test_create_rule_invalid_regex() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/category-rules",
            serde_json::json!({ "category_name": "Broken", "regex_pattern": "(unclosed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid regex pattern"));
    assert_eq!(db.list_rules(true).unwrap().len(), 6);
}

#[tokio::test]
async fn test_create_rule_missing_fields() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/category-rules",
            serde_json::json!({ "category_name": "Only a name" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(
        json["error"],
        "Category name and regex pattern are required"
    );
}

#[tokio::test]
async fn test_update_rule() {
    let (app, db) = setup_test_app();
    let rule = db
        .create_rule(&NewCategoryRule::new("Streaming", "hulu"))
        .unwrap();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/category-rules/{}", rule.id),
            serde_json::json!({ "regex_pattern": "hulu|netflix", "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["category_name"], "Streaming");
    assert_eq!(json["regex_pattern"], "hulu|netflix");
    assert_eq!(json["is_active"], false);
    assert_eq!(json["updated_transactions"], 0);
}

#[tokio::test]
async fn test_update_rule_errors() {
    let (app, db) = setup_test_app();
    let rule = db.list_active_rules().unwrap()[0].clone();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/category-rules/999",
            serde_json::json!({ "category_name": "Nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/category-rules/{}", rule.id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/category-rules/{}", rule.id),
            serde_json::json!({ "regex_pattern": "[" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_rule_is_soft() {
    let (app, db) = setup_test_app();
    upload_schema1(&app).await;
    let eating_out = db
        .list_active_rules()
        .unwrap()
        .into_iter()
        .find(|r| r.category_name == "Eating Out")
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/category-rules/{}", eating_out.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Category rule deleted successfully");
    // STARBUCKS falls back to Uncategorized
    assert_eq!(json["updated_transactions"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/category-rules"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 5);

    let response = app
        .oneshot(get("/api/category-rules?include_inactive=true"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_delete_unknown_rule() {
    let (app, _db) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/category-rules/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Maintenance ==========

#[tokio::test]
async fn test_recategorize_all() {
    let (app, db) = setup_test_app();
    upload_schema1(&app).await;

    // A rule inserted behind the API's back only takes effect on recategorize
    let mut rule = NewCategoryRule::new("Streaming", "netflix");
    rule.position = Some(-1);
    db.create_rule(&rule).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recategorize-all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["updated_count"], 1);
    assert_eq!(json["message"], "Successfully re-categorized 1 transactions");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recategorize-all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["updated_count"], 0);
}

#[tokio::test]
async fn test_clear_database() {
    let (app, db) = setup_test_app();
    upload_schema1(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/clear-database")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["cleared_count"], 2);
    assert_eq!(db.count_transactions().unwrap(), 0);
    assert_eq!(db.list_active_rules().unwrap().len(), 6);
}

#[tokio::test]
async fn test_stats() {
    let (app, _db) = setup_test_app();
    upload_schema1(&app).await;

    let response = app.oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_transactions"], 2);
    assert_eq!(json["date_range"]["earliest"], "2024-01-15");
    assert_eq!(json["date_range"]["latest"], "2024-01-16");

    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    let eating_out = categories
        .iter()
        .find(|c| c["category"] == "Eating Out")
        .unwrap();
    assert_eq!(eating_out["count"], 1);
    assert_eq!(eating_out["total_amount"].as_f64(), Some(-4.5));
}

// ========== Static files ==========

#[tokio::test]
async fn test_static_dir_spa_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>tally</html>").unwrap();

    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let app = create_router(db, config);

    let response = app.oneshot(get("/rules/editor")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>tally</html>");
}
