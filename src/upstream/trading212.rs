use reqwest::{header::AUTHORIZATION, Client};
use serde_json::Value;
use tracing::info;

use crate::{
    error::ApiError,
    instrument::Instrument,
    position::RawPosition,
    upstream::{send_json, Brokerage},
};

const SERVICE: &str = "brokerage";

#[derive(Debug, Clone)]
pub struct Trading212 {
    client: Client,
    endpoint: String,
}

impl Trading212 {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T>(&self, path: &str, auth: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);
        info!("{}", url);

        let request = self.client.get(url).header(AUTHORIZATION, auth);
        send_json(SERVICE, request).await
    }
}

impl Brokerage for Trading212 {
    async fn instruments(&self, auth: &str) -> Result<Vec<Instrument>, ApiError> {
        self.get("/equity/metadata/instruments", auth).await
    }

    async fn positions(&self, auth: &str) -> Result<Vec<RawPosition>, ApiError> {
        self.get("/equity/portfolio", auth).await
    }

    async fn cash(&self, auth: &str) -> Result<Value, ApiError> {
        self.get("/equity/account/cash", auth).await
    }
}
