// HTTP route handlers for schema conversion
use crate::error::TabledefError;
use crate::monitoring::get_monitoring_system;
use crate::schema_normalizer::{ConversionResult, SchemaInput, SchemaNormalizer};
use crate::types::TableDefinition;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

fn default_include_refs() -> bool {
    true
}

/// Query options for `POST /parse_table_dbml`
#[derive(Debug, Deserialize)]
pub struct ParseOptions {
    #[serde(default = "default_include_refs")]
    pub include_refs: bool,
}

/// Body of `POST /dbml_to_table_def`
#[derive(Debug, Deserialize)]
pub struct ConversionRequest {
    pub source_dbml: Value,
    #[serde(default)]
    pub target_dbml: Option<Value>,
    #[serde(default = "default_include_refs")]
    pub include_refs: bool,
}

/// Registers every route on an app or scope
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/parse_table_dbml", web::post().to(parse_table_dbml))
        .route("/dbml_to_table_def", web::post().to(dbml_to_table_def))
        .route("/tabledef_to_dbml", web::post().to(tabledef_to_dbml))
        .route("/stats", web::get().to(stats))
        .route("/health", web::get().to(health));
}

/// Parses DBML text, JSON text or a table definition object
pub async fn parse_table_dbml(
    normalizer: web::Data<SchemaNormalizer>,
    options: web::Query<ParseOptions>,
    body: web::Json<Value>,
) -> Result<HttpResponse, TabledefError> {
    let tracker = get_monitoring_system().start_operation("parse_table_dbml");

    let result = SchemaInput::try_from(body.into_inner())
        .and_then(|input| normalizer.parse_table_dbml(&input, options.include_refs));
    match result {
        Ok(definition) => {
            tracker.complete_success(definition.as_ref().map_or(0, TableDefinition::len));
            Ok(HttpResponse::Ok().json(definition))
        }
        Err(e) => {
            tracker.complete_failure(&e.to_string());
            Err(e)
        }
    }
}

/// Converts source and optional target schemas; failures are reported in the body
pub async fn dbml_to_table_def(
    normalizer: web::Data<SchemaNormalizer>,
    body: web::Json<ConversionRequest>,
) -> HttpResponse {
    let tracker = get_monitoring_system().start_operation("dbml_to_table_def");
    let request = body.into_inner();
    debug!(
        has_target = request.target_dbml.is_some(),
        include_refs = request.include_refs,
        "Received conversion request"
    );

    let inputs = SchemaInput::try_from(request.source_dbml).and_then(|source| {
        let target = request.target_dbml.map(SchemaInput::try_from).transpose()?;
        Ok((source, target))
    });

    let result = match inputs {
        Ok((source, target)) => {
            normalizer.dbml_to_table_def(&source, target.as_ref(), request.include_refs)
        }
        Err(e) => {
            warn!(error = %e, "Rejected conversion input");
            ConversionResult::from_error(&e)
        }
    };

    match result.error_message() {
        Some(message) => tracker.complete_failure(message),
        None => tracker.complete_success(result.table_count()),
    }
    HttpResponse::Ok().json(result)
}

/// Renders a table definition as DBML text
pub async fn tabledef_to_dbml(
    normalizer: web::Data<SchemaNormalizer>,
    body: web::Json<TableDefinition>,
) -> HttpResponse {
    let tracker = get_monitoring_system().start_operation("tabledef_to_dbml");
    let definition = body.into_inner();

    let rendered = normalizer.tabledef_to_dbml(&definition);
    tracker.complete_success(definition.len());
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(rendered)
}

pub async fn stats() -> HttpResponse {
    HttpResponse::Ok().json(get_monitoring_system().get_system_stats())
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
