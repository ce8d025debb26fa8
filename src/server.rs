use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    cache::InstrumentCache,
    config::Config,
    error::ApiError,
    portfolio::Portfolio,
    position::Position,
    upstream::{
        chat::{ChatMessage, ChatReply, OpenAi},
        crypto::CoinGecko,
        trading212::Trading212,
        Brokerage,
    },
};

const DEFAULT_VS_CURRENCY: &str = "gbp";

pub struct AppState {
    pub config: Config,
    pub portfolio: Portfolio<Trading212>,
    pub crypto: CoinGecko,
    pub chat: OpenAi,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder().build()?;

        let brokerage = Trading212::new(client.clone(), &config.brokerage_url);
        let portfolio = Portfolio::new(brokerage, InstrumentCache::new(config.instrument_ttl()));
        let crypto = CoinGecko::new(
            client.clone(),
            &config.crypto_url,
            config.crypto_api_key.clone(),
        );
        let chat = OpenAi::new(
            client,
            &config.chat_url,
            &config.chat_model,
            config.chat_system_prompt.clone(),
        );

        Ok(Self {
            config,
            portfolio,
            crypto,
            chat,
        })
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/portfolio", get(portfolio_handler))
        .route("/api/cash", get(cash_handler))
        .route("/api/instruments", get(instruments_handler))
        .route("/api/crypto", get(crypto_handler))
        .route("/api/chat", post(chat_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start(address: String, state: SharedState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn portfolio_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let auth = state.config.brokerage_credential()?;
    let positions = state.portfolio.list_normalized_portfolio(auth).await?;
    Ok(Json(positions))
}

async fn cash_handler(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let auth = state.config.brokerage_credential()?;
    let cash = state.portfolio.brokerage().cash(auth).await?;
    Ok(Json(cash))
}

async fn instruments_handler(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let auth = state.config.brokerage_credential()?;
    let snapshot = state.portfolio.instrument_snapshot(auth).await?;
    let age = state.portfolio.instrument_cache().age_of(&snapshot);

    Ok(Json(json!({
        "keys": snapshot.instruments.len(),
        "fetchedAt": snapshot.fetched_at.to_rfc3339(),
        "ageSeconds": age.num_seconds(),
    })))
}

#[derive(Deserialize, Debug)]
struct CryptoQuery {
    ids: Option<String>,
    vs: Option<String>,
}

/// `a, b,,c` -> `[a, b, c]`
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn crypto_handler(
    State(state): State<SharedState>,
    Query(query): Query<CryptoQuery>,
) -> Result<Json<Value>, ApiError> {
    let ids = split_list(query.ids.as_deref());
    let mut vs_currencies = split_list(query.vs.as_deref());
    if vs_currencies.is_empty() {
        vs_currencies.push(DEFAULT_VS_CURRENCY.to_string());
    }

    let prices = state.crypto.prices(&ids, &vs_currencies).await?;
    Ok(Json(prices))
}

#[derive(Deserialize, Debug)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let api_key = state.config.chat_credential()?;
    let reply = state.chat.complete(api_key, request.messages).await?;
    Ok(Json(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("Bitcoin, ethereum,,")),
            vec![String::from("bitcoin"), String::from("ethereum")]
        );
        assert!(split_list(None).is_empty());
    }
}
