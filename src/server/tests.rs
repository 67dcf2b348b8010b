use super::*;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

const USERS_POSTS: &str =
    "Table users { id int [pk] name varchar } Table posts { id int user_id int [ref: > users.id] }";

macro_rules! init_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(SchemaNormalizer::new()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_parse_table_dbml_route() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/parse_table_dbml")
        .set_json(json!(USERS_POSTS))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["posts"]["refs"], json!(["users"]));
    assert_eq!(body["posts"]["columns"]["user_id"]["refs"][0]["ref_description"], "many_to_one");
    assert_eq!(body["users"]["refs"], json!([]));
}

#[actix_web::test]
async fn test_parse_table_dbml_without_refs() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/parse_table_dbml?include_refs=false")
        .set_json(json!(USERS_POSTS))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["posts"]["columns"]["user_id"]["refs"], json!([]));
}

#[actix_web::test]
async fn test_parse_table_dbml_passthrough_object() {
    let app = init_app!();
    let definition = json!({
        "accounts": {
            "description": null,
            "columns": {
                "id": {"name": "id", "type": "int", "note": null, "primary_key": true, "refs": []}
            },
            "refs": []
        }
    });

    let req = test::TestRequest::post()
        .uri("/parse_table_dbml")
        .set_json(&definition)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, definition);
}

#[actix_web::test]
async fn test_parse_table_dbml_invalid_json_text_is_null() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/parse_table_dbml")
        .set_json(json!("{ not json"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body.is_null());
}

#[actix_web::test]
async fn test_parse_table_dbml_malformed_is_bad_request() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/parse_table_dbml")
        .set_json(json!("Table users {"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Parse error"));
}

#[actix_web::test]
async fn test_dbml_to_table_def_route() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/dbml_to_table_def")
        .set_json(json!({
            "source_dbml": "Table users { id int }",
            "target_dbml": "Table orders { user_id int [ref: > users.id] }"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "success");
    assert!(body["parsed_source"]["users"].is_object());
    assert_eq!(body["parsed_target"]["orders"]["refs"], json!(["users"]));
    assert!(body["parsed_target"].get("users").is_none());
}

#[actix_web::test]
async fn test_dbml_to_table_def_error_is_ok_response() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/dbml_to_table_def")
        .set_json(json!({"source_dbml": "Table users {", "target_dbml": null}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["parsed_source"]["error"]
        .as_str()
        .unwrap()
        .contains("Unable to parse DBML file due to"));
    assert!(body["parsed_target"].is_null());
}

#[actix_web::test]
async fn test_dbml_to_table_def_rejects_non_schema_source() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/dbml_to_table_def")
        .set_json(json!({"source_dbml": 42}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("Schema error"));
}

#[actix_web::test]
async fn test_tabledef_to_dbml_route() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/tabledef_to_dbml")
        .set_json(json!({
            "users": {"columns": {"id": {"name": "id", "type": "integer"}}, "description": "People"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .starts_with("text/plain"));

    let body = test::read_body(resp).await;
    assert_eq!(std::str::from_utf8(&body).unwrap(), "Table users{\n    id int\n    Note: 'People'\n}");
}

#[actix_web::test]
async fn test_health_and_stats_routes() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get().uri("/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["total_operations"].is_u64());
    assert!(body["started_at"].is_string());
}
