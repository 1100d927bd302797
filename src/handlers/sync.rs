// Sync job handler: runs one reconciliation pass on request
use crate::auth::ServiceAccountTokenProvider;
use crate::directory::GoogleDirectoryClient;
use crate::error::SyncError;
use crate::settings::RostersyncSettings;
use crate::source::RestUserSource;
use crate::sync::{SyncConfig, SyncCoordinator, SyncRequest, TokioPacer};
use crate::utils::responses;
use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use log::{error, info};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SyncRunQuery {
    pub offset: Option<u64>,
}

/// Run one roster reconciliation pass
///
/// Gated behind the administrative bearer token: the job performs bulk
/// external-facing writes and must not be callable anonymously.
///
/// # Errors
/// Never fails at the actix level; configuration and token-exchange
/// failures map to 500 responses carrying the error envelope.
pub async fn run_sync(
    req: HttpRequest,
    query: web::Query<SyncRunQuery>,
    settings: web::Data<RostersyncSettings>,
) -> Result<HttpResponse> {
    if !is_authorized(&req, &settings.admin.api_token) {
        return Ok(responses::unauthorized());
    }

    let offset = query.offset.unwrap_or(0);
    info!("Roster sync requested from offset {offset}");

    let tokens = match ServiceAccountTokenProvider::from_settings(&settings.google) {
        Ok(provider) => provider,
        Err(e) => return Ok(reject(&e)),
    };
    let directory = match GoogleDirectoryClient::from_settings(&settings.google) {
        Ok(client) => client,
        Err(e) => return Ok(reject(&e)),
    };
    let source = match RestUserSource::from_settings(&settings.source) {
        Ok(source) => source,
        Err(e) => return Ok(reject(&e)),
    };
    let pacer = TokioPacer;

    let coordinator = SyncCoordinator::new(
        SyncConfig::from_settings(&settings),
        &tokens,
        &directory,
        &source,
        &pacer,
    );

    match coordinator.run(SyncRequest { offset }).await {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(reject(&e)),
    }
}

fn reject(err: &SyncError) -> HttpResponse {
    error!("Roster sync aborted: {err}");
    let code = match err {
        SyncError::Configuration(_) => "configuration_error",
        SyncError::TokenExchange { .. } => "token_exchange_error",
    };
    responses::error_json(code, &err.to_string())
}

/// Check the administrative bearer token; an empty configured token keeps
/// the endpoint disabled
fn is_authorized(req: &HttpRequest, api_token: &str) -> bool {
    if api_token.is_empty() {
        return false;
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == api_token)
}
