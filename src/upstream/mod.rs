use std::future::Future;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::{error::ApiError, instrument::Instrument, position::RawPosition};

pub mod chat;
pub mod crypto;
pub mod trading212;

/// Brokerage REST API. `auth` is the static credential forwarded on every call.
pub trait Brokerage {
    fn instruments(
        &self,
        auth: &str,
    ) -> impl Future<Output = Result<Vec<Instrument>, ApiError>> + Send;

    fn positions(
        &self,
        auth: &str,
    ) -> impl Future<Output = Result<Vec<RawPosition>, ApiError>> + Send;

    fn cash(&self, auth: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// Sends the request and decodes a 2xx JSON body, anything else becomes an [`ApiError`].
pub(crate) async fn send_json<T>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let res = request
        .send()
        .await
        .map_err(|source| ApiError::Network { service, source })?;
    let body = read_body(service, res).await?;

    serde_json::de::from_str(body.as_str()).map_err(|err| {
        error!("Failed to decode {} response : {}", service, err);
        ApiError::InvalidResponse {
            service,
            reason: err.to_string(),
        }
    })
}

async fn read_body(service: &'static str, res: Response) -> Result<String, ApiError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ApiError::Network { service, source })?;

    if !status.is_success() {
        error!("{} answered {} : {}", service, status, body);
        return Err(ApiError::Upstream {
            service,
            status,
            body,
        });
    }

    debug!("{} response : {} bytes", service, body.len());
    Ok(body)
}
