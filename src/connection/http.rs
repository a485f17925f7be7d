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

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use serde_json::Value;
use time::OffsetDateTime;

use super::sign::{self, Credential};
use super::{unwrap_envelope, ApiRequest, Connection, SdkError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Signed JSON over HTTP(S) to `<service>.<domain>`
#[derive(Debug, Clone)]
pub struct HttpConnection {
    client: reqwest::Client,
    credential: Credential,
    scheme: String,
    domain: String,
    base_url: Option<String>,
}

impl HttpConnection {
    pub fn new(credential: Credential, protocol: &str, domain: &str) -> Result<Self, SdkError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            credential,
            scheme: protocol.to_ascii_lowercase(),
            domain: domain.to_owned(),
            base_url: None,
        })
    }

    /// Send every request to `base_url` instead of the per-service host
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn host(&self, service: &str) -> String {
        format!("{service}.{}", self.domain)
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn call(&self, request: &ApiRequest<'_>) -> Result<Value, SdkError> {
        let host = self.host(request.endpoint.service);
        let url = match &self.base_url {
            Some(base_url) => base_url.clone(),
            None => format!("{}://{host}/", self.scheme),
        };
        let timestamp = OffsetDateTime::now_utc();
        let authorization = sign::authorization(
            &self.credential,
            request.endpoint.service,
            &host,
            &request.payload,
            timestamp,
        );

        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header(HOST, &host)
            .header(AUTHORIZATION, authorization)
            .header("X-TC-Action", request.action)
            .header("X-TC-Version", request.endpoint.version)
            .header("X-TC-Timestamp", timestamp.unix_timestamp().to_string())
            .header("X-TC-Language", "en-US");
        if !request.region.is_empty() {
            builder = builder.header("X-TC-Region", request.region);
        }
        if let Some(token) = self.credential.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.header("X-TC-Token", token);
        }

        let response = builder.body(request.payload.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match unwrap_envelope(request.action, &body) {
            Err(SdkError::Decode { .. }) if !status.is_success() => Err(SdkError::HttpStatus {
                status: status.as_u16(),
                body,
            }),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;
    use crate::connection::Endpoint;

    const CVM: Endpoint = Endpoint {
        service: "cvm",
        version: "2017-03-12",
    };

    fn connection(url: &str) -> HttpConnection {
        let credential = Credential {
            secret_id: "AKIDTEST".into(),
            secret_key: "key".into(),
            token: Some("tok".into()),
        };
        HttpConnection::new(credential, "HTTPS", "tencentcloudapi.com")
            .unwrap()
            .with_base_url(url)
    }

    fn request(payload: &str) -> ApiRequest<'_> {
        ApiRequest {
            endpoint: CVM,
            action: "DescribeZones",
            region: "ap-guangzhou",
            payload: payload.to_owned(),
        }
    }

    #[tokio::test]
    async fn sends_signed_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeZones")
            .match_header("x-tc-version", "2017-03-12")
            .match_header("x-tc-region", "ap-guangzhou")
            .match_header("x-tc-token", "tok")
            .match_header("host", "cvm.tencentcloudapi.com")
            .match_header(
                "authorization",
                Matcher::Regex(r"^TC3-HMAC-SHA256 Credential=AKIDTEST/\d{4}-\d{2}-\d{2}/cvm/tc3_request, SignedHeaders=content-type;host, Signature=[0-9a-f]{64}$".into()),
            )
            .match_body("{}")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Response":{"TotalCount":1,"ZoneSet":[],"RequestId":"r"}}"#)
            .create_async()
            .await;

        let response = connection(&server.url()).call(&request("{}")).await.unwrap();

        assert_eq!(response["TotalCount"], 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_error_inside_success_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"Response":{"Error":{"Code":"InvalidParameter","Message":"nope"},"RequestId":"r-9"}}"#)
            .create_async()
            .await;

        let err = connection(&server.url()).call(&request("{}")).await.unwrap_err();

        assert_eq!(err.code(), "InvalidParameter");
    }

    #[tokio::test]
    async fn gateway_error_without_envelope() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let err = connection(&server.url()).call(&request("{}")).await.unwrap_err();

        match err {
            SdkError::HttpStatus { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("bad gateway"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
