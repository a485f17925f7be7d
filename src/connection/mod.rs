// This file is part of the terraform-provider-tencentcloud project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

mod error;
mod http;
#[cfg(test)]
mod mock;
mod sign;

pub use error::SdkError;
pub use http::HttpConnection;
#[cfg(test)]
pub use mock::MockConnection;
pub use sign::Credential;

/// Cloud product addressed by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    pub endpoint: Endpoint,
    pub action: &'a str,
    pub region: &'a str,
    /// JSON encoded request body
    pub payload: String,
}

/// Transport of signed API calls.
///
/// Returns the content of the `Response` object once the service error, if
/// any, has been extracted from it.
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug + 'static {
    async fn call(&self, request: &ApiRequest<'_>) -> Result<Value, SdkError>;
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceError {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    error: ServiceError,
    #[serde(default)]
    request_id: String,
}

/// Extract the `Response` object of a raw body, turning embedded errors into [`SdkError::Api`]
pub fn unwrap_envelope(action: &str, body: &str) -> Result<Value, SdkError> {
    let Envelope { response } = serde_json::from_str(body).map_err(|source| SdkError::Decode {
        action: action.to_owned(),
        source,
    })?;

    if response.get("Error").is_some() {
        let ErrorResponse { error, request_id } =
            serde_json::from_value(response).map_err(|source| SdkError::Decode {
                action: action.to_owned(),
                source,
            })?;
        return Err(SdkError::Api {
            code: error.code,
            message: error.message,
            request_id,
        });
    }
    Ok(response)
}

/// Field decoder for the response members documented as possibly `null`
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
