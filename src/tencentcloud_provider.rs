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

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::DynamicDataSource;
use tf_provider::DynamicResource;
use tf_provider::schema::AttributeConstraint::Optional;
use tf_provider::value::ValueString;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{map, AttributePath, Diagnostics, Provider};

use crate::client::{ProviderMeta, TencentCloudClient};
use crate::connection::{Credential, HttpConnection};
use crate::data_source::TencentDataSource;
use crate::resource::TencentResource;
use crate::services::cynosdb::CynosdbClusters;
use crate::services::dcdb::{DcdbInstanceConfig, DcdbSecurityGroupAttachment};
use crate::services::gaap::GaapHttpDomain;
use crate::services::redis::{RedisBackupConfig, RedisInstance, RedisInstances, RedisSecurityGroup};
use crate::services::ssl::SslDescribeCertificate;
use crate::services::waf::WafCustomWhiteRule;
use crate::utils::{get_str, schema, sensitive, string};

pub const DEFAULT_REGION: &str = "ap-guangzhou";
pub const DEFAULT_PROTOCOL: &str = "HTTPS";
pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";

const SECRET_ID_ENV: &str = "TENCENTCLOUD_SECRET_ID";
const SECRET_KEY_ENV: &str = "TENCENTCLOUD_SECRET_KEY";
const SECURITY_TOKEN_ENV: &str = "TENCENTCLOUD_SECURITY_TOKEN";
const REGION_ENV: &str = "TENCENTCLOUD_REGION";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub secret_id: ValueString<'a>,
    pub secret_key: ValueString<'a>,
    pub security_token: ValueString<'a>,
    pub region: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub domain: ValueString<'a>,
}

/// Provider block with every fallback applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credential: Credential,
    pub region: String,
    pub protocol: String,
    pub domain: String,
}

impl ProviderConfig<'_> {
    /// Merge the block with the `TENCENTCLOUD_*` variables returned by `env`
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
        let pick = |value: &ValueString<'_>, var: &str| {
            get_str(value)
                .map(str::to_owned)
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let (Some(secret_id), Some(secret_key)) = (
            pick(&self.secret_id, SECRET_ID_ENV),
            pick(&self.secret_key, SECRET_KEY_ENV),
        ) else {
            bail!("secret_id and secret_key must be set, in the provider block or through {SECRET_ID_ENV} and {SECRET_KEY_ENV}");
        };

        Ok(ResolvedConfig {
            credential: Credential {
                secret_id,
                secret_key,
                token: pick(&self.security_token, SECURITY_TOKEN_ENV),
            },
            region: pick(&self.region, REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            protocol: get_str(&self.protocol).unwrap_or(DEFAULT_PROTOCOL).to_owned(),
            domain: get_str(&self.domain).unwrap_or(DEFAULT_DOMAIN).to_owned(),
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct TencentCloudProvider {
    meta: ProviderMeta,
}

#[async_trait]
impl Provider for TencentCloudProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(schema(
            "Tencent Cloud provider",
            map! {
                "secret_id" => string(Optional, "Secret id of the API key, defaults to `TENCENTCLOUD_SECRET_ID`."),
                "secret_key" => sensitive(string(Optional, "Secret key of the API key, defaults to `TENCENTCLOUD_SECRET_KEY`.")),
                "security_token" => sensitive(string(Optional, "Temporary session token, defaults to `TENCENTCLOUD_SECURITY_TOKEN`.")),
                "region" => string(Optional, "Region of the resources, defaults to `TENCENTCLOUD_REGION` then `ap-guangzhou`."),
                "protocol" => string(Optional, "Protocol of the API endpoints: `HTTPS` (default) or `HTTP`."),
                "domain" => string(Optional, "Root domain of the API endpoints, defaults to `tencentcloudapi.com`."),
            },
            map! {},
        ))
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        if let Some(protocol) = get_str(&config.protocol) {
            if protocol != "HTTP" && protocol != "HTTPS" {
                diags.error(
                    "Invalid protocol",
                    format!("protocol must be `HTTP` or `HTTPS`, got `{protocol}`"),
                    AttributePath::new("protocol"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let result = config
            .resolve(|var| std::env::var(var).ok())
            .and_then(|resolved| {
                let connection =
                    HttpConnection::new(resolved.credential, &resolved.protocol, &resolved.domain)?;
                tracing::info!(
                    %terraform_version,
                    region = %resolved.region,
                    domain = %resolved.domain,
                    "provider configured"
                );
                self.meta
                    .set(TencentCloudClient::new(Arc::new(connection), resolved.region))
            });

        match result {
            Ok(()) => Some(()),
            Err(err) => {
                diags.root_error("Invalid provider configuration", format!("{err:#}"));
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let meta = &self.meta;
        Some(map! {
            "redis_instance" => TencentResource::new(RedisInstance, meta.clone()),
            "redis_security_group" => TencentResource::new(RedisSecurityGroup, meta.clone()),
            "redis_backup_config" => TencentResource::new(RedisBackupConfig, meta.clone()),
            "gaap_http_domain" => TencentResource::new(GaapHttpDomain, meta.clone()),
            "waf_custom_white_rule" => TencentResource::new(WafCustomWhiteRule, meta.clone()),
            "dcdb_security_group_attachment" => TencentResource::new(DcdbSecurityGroupAttachment, meta.clone()),
            "dcdb_instance_config" => TencentResource::new(DcdbInstanceConfig, meta.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let meta = &self.meta;
        Some(map! {
            "redis_instances" => TencentDataSource::new(RedisInstances, meta.clone()),
            "cynosdb_clusters" => TencentDataSource::new(CynosdbClusters, meta.clone()),
            "ssl_describe_certificate" => TencentDataSource::new(SslDescribeCertificate, meta.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::str_value;

    fn env<'e>(vars: &'e [(&'e str, &'e str)]) -> impl Fn(&str) -> Option<String> + 'e {
        move |name| {
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn block_values_win_over_environment() {
        let config = ProviderConfig {
            secret_id: str_value("AKID-block"),
            secret_key: str_value("key-block"),
            region: str_value("ap-shanghai"),
            ..Default::default()
        };

        let resolved = config
            .resolve(env(&[
                (SECRET_ID_ENV, "AKID-env"),
                (REGION_ENV, "ap-beijing"),
            ]))
            .unwrap();

        assert_eq!(resolved.credential.secret_id, "AKID-block");
        assert_eq!(resolved.region, "ap-shanghai");
        assert_eq!(resolved.protocol, DEFAULT_PROTOCOL);
        assert_eq!(resolved.domain, DEFAULT_DOMAIN);
        assert!(resolved.credential.token.is_none());
    }

    #[test]
    fn environment_fills_missing_values() {
        let resolved = ProviderConfig::default()
            .resolve(env(&[
                (SECRET_ID_ENV, "AKID-env"),
                (SECRET_KEY_ENV, "key-env"),
                (SECURITY_TOKEN_ENV, "token"),
            ]))
            .unwrap();

        assert_eq!(resolved.credential.secret_id, "AKID-env");
        assert_eq!(resolved.credential.secret_key, "key-env");
        assert_eq!(resolved.credential.token.as_deref(), Some("token"));
        assert_eq!(resolved.region, DEFAULT_REGION);
    }

    #[test]
    fn missing_key_pair_is_rejected() {
        let err = ProviderConfig::default()
            .resolve(env(&[(SECRET_ID_ENV, "AKID-env"), (SECRET_KEY_ENV, "")]))
            .unwrap_err();

        assert!(err.to_string().contains("secret_key"));
    }

    #[tokio::test]
    async fn unknown_protocol_fails_validation() {
        let config = ProviderConfig {
            protocol: str_value("FTP"),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();

        let result = TencentCloudProvider::default().validate(&mut diags, config).await;

        assert!(result.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn every_binding_is_registered() {
        let provider = TencentCloudProvider::default();
        let mut diags = Diagnostics::default();

        let mut resources: Vec<_> = provider.get_resources(&mut diags).unwrap().into_keys().collect();
        resources.sort();
        assert_eq!(
            resources,
            vec![
                "dcdb_instance_config",
                "dcdb_security_group_attachment",
                "gaap_http_domain",
                "redis_backup_config",
                "redis_instance",
                "redis_security_group",
                "waf_custom_white_rule",
            ]
        );
        assert_eq!(provider.get_data_sources(&mut diags).unwrap().len(), 3);
    }
}
