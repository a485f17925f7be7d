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

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::TencentCloudClient;
use crate::connection::{Endpoint, SdkError};
use crate::services::Acknowledged;

pub const GAAP: Endpoint = Endpoint {
    service: "gaap",
    version: "2018-05-29",
};

/// Listener lookups and rule lookups fail this way once the listener is gone
pub fn is_listener_missing(err: &SdkError) -> bool {
    match err {
        SdkError::Api { code, message, .. } => {
            code.starts_with("ResourceNotFound")
                || (code == "InvalidParameter" && message.contains("ListenerId"))
        }
        _ => false,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeListenersRequest<'a> {
    listener_id: &'a str,
    limit: u64,
    offset: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeListenersResponse<L> {
    listener_set: Option<Vec<L>>,
}

impl<L> Default for DescribeListenersResponse<L> {
    fn default() -> Self {
        Self { listener_set: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HttpListener {
    pub listener_id: String,
    pub listener_name: String,
    pub port: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HttpsListener {
    pub listener_id: String,
    pub listener_name: String,
    pub port: u64,
    /// Protocol between GAAP and the origin servers, `HTTP` or `HTTPS`
    pub forward_protocol: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDomainRequest {
    pub listener_id: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_client_certificate_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyCertificateRequest {
    pub listener_id: String,
    pub domain: String,
    pub certificate_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_client_certificate_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetAuthenticationRequest {
    pub listener_id: String,
    pub domain: String,
    pub basic_auth: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_conf_id: Option<String>,
    pub real_server_auth: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_server_certificate_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_real_server_certificate_ids: Option<Vec<String>>,
    pub gaap_auth: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaap_certificate_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteDomainRequest<'a> {
    listener_id: &'a str,
    domain: &'a str,
    force: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRulesRequest<'a> {
    listener_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeRulesResponse {
    domain_rule_set: Option<Vec<DomainRuleSet>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CertificateAliasInfo {
    pub certificate_id: String,
    pub certificate_alias: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DomainRuleSet {
    pub domain: Option<String>,
    pub certificate_id: Option<String>,
    pub poly_client_certificate_alias_info: Option<Vec<CertificateAliasInfo>>,
    pub basic_auth: Option<i64>,
    pub basic_auth_conf_id: Option<String>,
    pub real_server_auth: Option<i64>,
    pub poly_real_server_certificate_alias_info: Option<Vec<CertificateAliasInfo>>,
    pub real_server_certificate_domain: Option<String>,
    pub gaap_auth: Option<i64>,
    pub gaap_certificate_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct GaapService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> GaapService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    async fn describe_listeners<L: DeserializeOwned>(
        &self,
        action: &str,
        listener_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<L>, SdkError> {
        let response: DescribeListenersResponse<L> = self
            .client
            .call(
                GAAP,
                action,
                &DescribeListenersRequest {
                    listener_id,
                    limit,
                    offset,
                },
            )
            .await?;
        Ok(response.listener_set.unwrap_or_default())
    }

    pub async fn describe_http_listeners(
        &self,
        listener_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<HttpListener>, SdkError> {
        self.describe_listeners("DescribeHTTPListeners", listener_id, limit, offset)
            .await
    }

    pub async fn describe_https_listeners(
        &self,
        listener_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<HttpsListener>, SdkError> {
        self.describe_listeners("DescribeHTTPSListeners", listener_id, limit, offset)
            .await
    }

    pub async fn create_domain(&self, request: &CreateDomainRequest) -> Result<(), SdkError> {
        let _: Acknowledged = self.client.call(GAAP, "CreateDomain", request).await?;
        Ok(())
    }

    pub async fn set_authentication(&self, request: &SetAuthenticationRequest) -> Result<(), SdkError> {
        let _: Acknowledged = self.client.call(GAAP, "SetAuthentication", request).await?;
        Ok(())
    }

    pub async fn modify_certificate(&self, request: &ModifyCertificateRequest) -> Result<(), SdkError> {
        let _: Acknowledged = self.client.call(GAAP, "ModifyCertificate", request).await?;
        Ok(())
    }

    pub async fn describe_rules(&self, listener_id: &str) -> Result<Vec<DomainRuleSet>, SdkError> {
        let response: DescribeRulesResponse = self
            .client
            .call(GAAP, "DescribeRules", &DescribeRulesRequest { listener_id })
            .await?;
        Ok(response.domain_rule_set.unwrap_or_default())
    }

    /// Delete a domain of a layer-7 listener, refusing when rules still use it
    pub async fn delete_domain(&self, listener_id: &str, domain: &str) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                GAAP,
                "DeleteDomain",
                &DeleteDomainRequest {
                    listener_id,
                    domain,
                    force: 0,
                },
            )
            .await?;
        Ok(())
    }
}
