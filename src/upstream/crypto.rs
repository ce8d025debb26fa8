use reqwest::{Client, Url};
use serde_json::Value;
use tracing::info;

use crate::{error::ApiError, upstream::send_json};

const SERVICE: &str = "crypto prices";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko simple price feed.
#[derive(Debug, Clone)]
pub struct CoinGecko {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CoinGecko {
    pub fn new(client: Client, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Spot prices for coin `ids` in each of `vs_currencies`, returned as the feed sent them.
    pub async fn prices(
        &self,
        ids: &[String],
        vs_currencies: &[String],
    ) -> Result<Value, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::BadRequest(String::from("no coin ids requested")));
        }

        let params = [
            ("ids", ids.join(",")),
            ("vs_currencies", vs_currencies.join(",")),
        ];
        let url = Url::parse_with_params(
            format!("{}/simple/price", self.endpoint).as_str(),
            params,
        )
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

        info!("{}", url);

        let mut request = self.client.get(url);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }
        send_json(SERVICE, request).await
    }
}
