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

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::RateLimiter;
use crate::connection::{ApiRequest, Connection, Endpoint, SdkError};

/// Base durations of the retry and wait loops, scaled by each operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Duration,
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(3 * 60),
            write: Duration::from_secs(5 * 60),
        }
    }
}

/// Region scoped API client shared by every resource of a provider instance
#[derive(Debug, Clone)]
pub struct TencentCloudClient {
    connection: Arc<dyn Connection>,
    region: String,
    limiter: Arc<RateLimiter>,
    timeouts: Timeouts,
}

impl TencentCloudClient {
    pub fn new(connection: Arc<dyn Connection>, region: impl Into<String>) -> Self {
        Self {
            connection,
            region: region.into(),
            limiter: Default::default(),
            timeouts: Default::default(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Call one action and decode its `Response` object
    pub async fn call<Req, Resp>(
        &self,
        endpoint: Endpoint,
        action: &str,
        request: &Req,
    ) -> Result<Resp, SdkError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.limiter
            .check(&format!("{}.{action}", endpoint.service))
            .await;

        let payload = serde_json::to_string(request).map_err(|source| SdkError::Encode {
            action: action.to_owned(),
            source,
        })?;
        let api_request = ApiRequest {
            endpoint,
            action,
            region: &self.region,
            payload,
        };

        let result = self.connection.call(&api_request).await.and_then(|response| {
            tracing::debug!(
                action,
                request = %api_request.payload,
                response = %response,
                "api call succeeded"
            );
            serde_json::from_value(response).map_err(|source| SdkError::Decode {
                action: action.to_owned(),
                source,
            })
        });
        if let Err(err) = &result {
            tracing::error!(
                action,
                request = %api_request.payload,
                reason = %err,
                "api call failed"
            );
        }
        result
    }
}

/// Client published by `configure`, read by every resource operation
#[derive(Debug, Clone, Default)]
pub struct ProviderMeta {
    client: Arc<RwLock<Option<TencentCloudClient>>>,
}

impl ProviderMeta {
    pub fn set(&self, client: TencentCloudClient) -> anyhow::Result<()> {
        let mut guard = self
            .client
            .write()
            .map_err(|_| anyhow!("provider state is poisoned"))?;
        *guard = Some(client);
        Ok(())
    }

    pub fn client(&self) -> anyhow::Result<TencentCloudClient> {
        self.client
            .read()
            .map_err(|_| anyhow!("provider state is poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("Provider is not configured"))
    }
}

#[cfg(test)]
pub(crate) fn mock_client() -> (TencentCloudClient, Arc<crate::connection::MockConnection>) {
    let mock = Arc::new(crate::connection::MockConnection::new());
    let client = TencentCloudClient::new(mock.clone(), "ap-guangzhou");
    (client, mock)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    const REDIS: Endpoint = Endpoint {
        service: "redis",
        version: "2018-04-12",
    };

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Request<'a> {
        instance_id: &'a str,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Response {
        task_id: i64,
    }

    #[tokio::test]
    async fn call_encodes_request_and_decodes_response() {
        let (client, mock) = mock_client();
        mock.respond("ClearInstance", json!({ "TaskId": 12 }));

        let response: Response = client
            .call(REDIS, "ClearInstance", &Request { instance_id: "crs-1" })
            .await
            .unwrap();

        assert_eq!(response.task_id, 12);
        assert_eq!(
            mock.payloads("ClearInstance"),
            vec![json!({ "InstanceId": "crs-1" })]
        );
    }

    #[tokio::test]
    async fn undecodable_response_is_reported() {
        let (client, mock) = mock_client();
        mock.respond("ClearInstance", json!({ "TaskId": "twelve" }));

        let err = client
            .call::<_, Response>(REDIS, "ClearInstance", &Request { instance_id: "crs-1" })
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Decode { .. }));
    }

    #[test]
    fn meta_requires_configuration() {
        let meta = ProviderMeta::default();
        let err = meta.client().unwrap_err();
        assert_eq!(err.to_string(), "Provider is not configured");

        let (client, _) = mock_client();
        meta.set(client).unwrap();
        assert_eq!(meta.client().unwrap().region(), "ap-guangzhou");
    }
}
