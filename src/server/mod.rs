//! HTTP interface for the schema normalizer.
//!
//! Exposes parsing, conversion and rendering over JSON endpoints:
//!
//! * `POST /parse_table_dbml` - DBML text, JSON text or a table definition to a table definition
//! * `POST /dbml_to_table_def` - source and optional target schema to a conversion result
//! * `POST /tabledef_to_dbml` - table definition to DBML text
//! * `GET /stats` and `GET /health`

pub mod routes;

#[cfg(test)]
mod tests;

use crate::config::ServerConfig;
use crate::error::TabledefResult;
use crate::schema_normalizer::SchemaNormalizer;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing::info;

pub use routes::{configure_routes, ConversionRequest, ParseOptions};

/// HTTP server wrapping a shared [`SchemaNormalizer`]
pub struct TabledefServer {
    config: ServerConfig,
    normalizer: web::Data<SchemaNormalizer>,
}

impl TabledefServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            normalizer: web::Data::new(SchemaNormalizer::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds to the configured address and serves until shutdown
    pub async fn run(&self) -> TabledefResult<()> {
        let bind_address = self.config.bind_address();
        let enable_cors = self.config.enable_cors;
        let normalizer = self.normalizer.clone();

        info!(address = %bind_address, cors = enable_cors, "Starting HTTP server");

        HttpServer::new(move || {
            // Default CORS rejects every cross-origin request
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(normalizer.clone())
                .configure(configure_routes)
        })
        .bind(&bind_address)?
        .run()
        .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
