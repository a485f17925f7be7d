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

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::AttributeConstraint::{Computed, OptionalComputed, Required};
use tf_provider::value::{Value, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use super::service::REDIS;
use crate::client::TencentCloudClient;
use crate::common::{build_id, invalid_argument, parse_id, retry, retry_error, FILED_SP};
use crate::resource::ResourceBinding;
use crate::services::DbSecurityGroupService;
use crate::utils::{changed_fields, get_str, required_str, schema, set_default, str_value, string, WithSchema};

const DEFAULT_PRODUCT: &str = "redis";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisSecurityGroupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub security_group_id: ValueString<'a>,
    pub product: ValueString<'a>,
}

impl RedisSecurityGroupState<'_> {
    fn product(&self) -> &str {
        get_str(&self.product).unwrap_or(DEFAULT_PRODUCT)
    }
}

/// Binding of one security group to one Redis instance
#[derive(Debug, Default, Clone, Copy)]
pub struct RedisSecurityGroup;

impl WithSchema for RedisSecurityGroup {
    fn schema() -> Schema {
        schema(
            "Provides a resource to attach a security group to a Redis instance.",
            map! {
                "id" => string(Computed, "`instance_id#security_group_id`."),
                "instance_id" => string(Required, "Instance ID."),
                "security_group_id" => string(Required, "Security group ID."),
                "product" => string(OptionalComputed, "Name of the database product, `redis` by default."),
            },
            map! {},
        )
    }
}

#[async_trait]
impl ResourceBinding for RedisSecurityGroup {
    const TYPE_NAME: &'static str = "tencentcloud_redis_security_group";
    const FORCE_NEW: &'static [&'static str] = &["instance_id", "security_group_id", "product"];

    type State<'a> = RedisSecurityGroupState<'a>;

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        set_default(&mut state.product, DEFAULT_PRODUCT.into());
        if prior.is_none() {
            state.id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned; instance_id, security_group_id, product)
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        let instance_id = required_str(&state.instance_id, "instance_id")?;
        let security_group_id = required_str(&state.security_group_id, "security_group_id")?;
        let service = DbSecurityGroupService::new(client, REDIS, state.product());

        retry(client.timeouts().write, || async move {
            service
                .associate(instance_id, security_group_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;

        state.id = str_value(build_id([instance_id, security_group_id], FILED_SP));
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let id = required_str(&state.id, "id")?.to_owned();
        let [instance_id, security_group_id] = parse_id::<2>(&id, FILED_SP)?;
        let service = DbSecurityGroupService::new(client, REDIS, state.product());

        let groups = retry(client.timeouts().read, || async move {
            service
                .describe(instance_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        if !groups.iter().any(|group| group == security_group_id) {
            return Ok(None);
        }

        state.instance_id = str_value(instance_id);
        state.security_group_id = str_value(security_group_id);
        set_default(&mut state.product, DEFAULT_PRODUCT.into());
        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        _client: &TencentCloudClient,
        _prior: &Self::State<'a>,
        planned: Self::State<'a>,
        _changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        Ok(planned)
    }

    async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
        let [instance_id, security_group_id] = parse_id::<2>(required_str(&state.id, "id")?, FILED_SP)?;
        let service = DbSecurityGroupService::new(client, REDIS, state.product());

        retry(client.timeouts().write, || async move {
            service
                .disassociate(instance_id, security_group_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        let [instance_id, security_group_id] =
            parse_id::<2>(id, FILED_SP).map_err(|err| invalid_argument("id", err.to_string()))?;
        Ok(RedisSecurityGroupState {
            id: str_value(id),
            instance_id: str_value(instance_id),
            security_group_id: str_value(security_group_id),
            product: str_value(DEFAULT_PRODUCT),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tf_provider::{Diagnostics, Resource};

    use super::*;
    use crate::resource::tests::configured;

    fn attachment<'a>() -> RedisSecurityGroupState<'a> {
        let mut state = RedisSecurityGroupState {
            instance_id: str_value("crs-X"),
            security_group_id: str_value("sg-Y"),
            ..Default::default()
        };
        RedisSecurityGroup::plan(&mut state, None);
        state
    }

    #[tokio::test]
    async fn create_builds_composite_id_and_read_splits_it() {
        let (resource, mock) = configured(RedisSecurityGroup);
        mock.respond("AssociateSecurityGroups", json!({}));
        mock.respond(
            "DescribeDBSecurityGroups",
            json!({ "Groups": [{ "SecurityGroupId": "sg-A" }, { "SecurityGroupId": "sg-Y" }] }),
        );

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(attachment()),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        let state = state.as_ref().unwrap();
        assert_eq!(state.id.as_str(), "crs-X#sg-Y");
        assert_eq!(state.instance_id.as_str(), "crs-X");
        assert_eq!(state.security_group_id.as_str(), "sg-Y");

        let associate = &mock.payloads("AssociateSecurityGroups")[0];
        assert_eq!(associate["Product"], "redis");
        assert_eq!(associate["InstanceIds"], json!(["crs-X"]));
    }

    #[tokio::test]
    async fn detached_group_reads_as_gone() {
        let (resource, mock) = configured(RedisSecurityGroup);
        mock.respond("DescribeDBSecurityGroups", json!({ "Groups": null }));

        let state = RedisSecurityGroup::import("crs-X#sg-Y").unwrap();
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .read(&mut diags, Value::Value(state), Default::default(), Default::default())
            .await
            .unwrap();

        assert!(state.is_null());
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn import_rejects_broken_ids() {
        assert!(RedisSecurityGroup::import("crs-X").is_err());
        assert!(RedisSecurityGroup::import("crs-X#").is_err());
    }
}
