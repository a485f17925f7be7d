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
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::DcdbService;
use crate::client::TencentCloudClient;
use crate::common::{invalid_argument, retry, retry_error};
use crate::resource::ResourceBinding;
use crate::utils::{
    boolean, changed_fields, get_i64, number, required_str, schema, set_default, str_value, string,
    unknown_if_null, WithSchema,
};

const CONFIG_FIELDS: &[&str] = &["rs_access_strategy", "extranet_access"];

/// `WanStatus` values: 0 not opened, 1 opened, 2 closed, 3 opening
const WAN_OPENED: i64 = 1;
const WAN_UNOPENED: i64 = 0;
const WAN_CLOSED: i64 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcdbInstanceConfigState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub rs_access_strategy: ValueNumber,
    pub extranet_access: Value<bool>,
    pub ipv6_flag: ValueNumber,
}

/// Network settings of an existing DCDB instance
#[derive(Debug, Default, Clone, Copy)]
pub struct DcdbInstanceConfig;

impl WithSchema for DcdbInstanceConfig {
    fn schema() -> Schema {
        schema(
            "Provides a resource to create a dcdb instance_config.",
            map! {
                "id" => string(Computed, "Same as `instance_id`."),
                "instance_id" => string(Required, "The ID of instance."),
                "rs_access_strategy" => number(OptionalComputed, "RS nearest access mode, 0: no policy, 1: nearest access."),
                "extranet_access" => boolean(OptionalComputed, "Whether to open the extranet access."),
                "ipv6_flag" => number(OptionalComputed, "Whether the extranet access uses IPv6, 0 by default."),
            },
            map! {},
        )
    }
}

/// Push the settings listed in `fields` to the instance
async fn configure(
    client: &TencentCloudClient,
    state: &DcdbInstanceConfigState<'_>,
    fields: &[&'static str],
) -> Result<()> {
    let instance_id = required_str(&state.instance_id, "instance_id")?;
    let service = DcdbService::new(client);
    let timeouts = client.timeouts();

    if let Some(strategy) = get_i64(&state.rs_access_strategy) {
        if fields.contains(&"rs_access_strategy") {
            retry(timeouts.write, || async move {
                service
                    .modify_real_server_access_strategy(instance_id, strategy)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }
    }

    if let Value::Value(enable) = state.extranet_access {
        if fields.contains(&"extranet_access") {
            let ipv6_flag = get_i64(&state.ipv6_flag).unwrap_or_default();
            let flow_id = retry(timeouts.write, || async move {
                service
                    .set_extranet_access(instance_id, ipv6_flag, enable)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
            if let Some(flow_id) = flow_id {
                service.wait_flow(flow_id, timeouts.read * 2).await?;
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ResourceBinding for DcdbInstanceConfig {
    const TYPE_NAME: &'static str = "tencentcloud_dcdb_instance_config";
    const FORCE_NEW: &'static [&'static str] = &["instance_id"];

    type State<'a> = DcdbInstanceConfigState<'a>;

    fn validate(state: &Self::State<'_>, diags: &mut Diagnostics) {
        for (field, value) in [
            ("rs_access_strategy", &state.rs_access_strategy),
            ("ipv6_flag", &state.ipv6_flag),
        ] {
            if let Some(value) = get_i64(value) {
                if value != 0 && value != 1 {
                    diags.error(
                        format!("Invalid {field}"),
                        format!("{field} must be 0 or 1, got {value}"),
                        AttributePath::new(field),
                    );
                }
            }
        }
    }

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        set_default(&mut state.ipv6_flag, 0);
        unknown_if_null(&mut state.rs_access_strategy);
        unknown_if_null(&mut state.extranet_access);
        if prior.is_none() {
            state.id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned; instance_id, rs_access_strategy, extranet_access, ipv6_flag)
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        configure(client, &state, CONFIG_FIELDS).await?;
        state.id = state.instance_id.clone();
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let instance_id = required_str(&state.id, "id")?.to_owned();
        let service = DcdbService::new(client);

        let instance = retry(client.timeouts().read, || {
            let instance_id = instance_id.as_str();
            async move {
                service
                    .describe_instance(instance_id)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            }
        })
        .await?;
        let Some(instance) = instance else {
            tracing::warn!(%instance_id, "dcdb instance not found");
            return Ok(None);
        };

        if let Some(strategy) = instance.rs_access_strategy {
            state.rs_access_strategy = Value::Value(strategy);
        }
        match instance.wan_status {
            Some(WAN_OPENED) => state.extranet_access = Value::Value(true),
            Some(WAN_UNOPENED | WAN_CLOSED) => state.extranet_access = Value::Value(false),
            _ => (),
        }
        set_default(&mut state.ipv6_flag, 0);
        state.instance_id = str_value(instance_id);
        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        _prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        configure(client, &planned, changes).await?;
        Ok(planned)
    }

    async fn delete<'a>(&self, _client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
        tracing::debug!(id = state.id.as_str(), "dcdb instance config only leaves the state");
        Ok(())
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        if id.is_empty() {
            return Err(invalid_argument("id", "instance id must not be empty"));
        }
        Ok(DcdbInstanceConfigState {
            id: str_value(id),
            instance_id: str_value(id),
            ipv6_flag: Value::Value(0),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tf_provider::Resource;

    use super::*;
    use crate::client::mock_client;
    use crate::resource::tests::configured;

    fn instance(rs_access_strategy: i64, wan_status: i64) -> serde_json::Value {
        json!({ "TotalCount": 1, "Instances": [{
            "InstanceId": "dcdbt-1",
            "RsAccessStrategy": rs_access_strategy,
            "WanStatus": wan_status
        }] })
    }

    #[tokio::test(start_paused = true)]
    async fn create_applies_strategy_then_waits_for_extranet_flow() {
        let (resource, mock) = configured(DcdbInstanceConfig);
        mock.respond("ModifyRealServerAccessStrategy", json!({}));
        mock.respond("OpenDBExtranetAccess", json!({ "FlowId": 5 }));
        mock.respond("DescribeFlow", json!({ "Status": 2 }));
        mock.respond("DescribeFlow", json!({ "Status": 0 }));
        mock.respond("DescribeDCDBInstances", instance(1, 1));

        let mut state = DcdbInstanceConfigState {
            instance_id: str_value("dcdbt-1"),
            rs_access_strategy: Value::Value(1),
            extranet_access: Value::Value(true),
            ..Default::default()
        };
        DcdbInstanceConfig::plan(&mut state, None);

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(state),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        let state = state.as_ref().unwrap();
        assert_eq!(state.id.as_str(), "dcdbt-1");
        assert_eq!(state.extranet_access, Value::Value(true));
        assert_eq!(
            mock.actions(),
            vec![
                "ModifyRealServerAccessStrategy",
                "OpenDBExtranetAccess",
                "DescribeFlow",
                "DescribeFlow",
                "DescribeDCDBInstances"
            ]
        );
        assert_eq!(
            mock.payloads("OpenDBExtranetAccess")[0],
            json!({ "InstanceId": "dcdbt-1", "Ipv6Flag": 0 })
        );
    }

    #[tokio::test]
    async fn update_only_touches_changed_settings() {
        let (client, mock) = mock_client();
        mock.respond("CloseDBExtranetAccess", json!({}));

        let mut prior = DcdbInstanceConfig::import("dcdbt-1").unwrap();
        prior.rs_access_strategy = Value::Value(1);
        prior.extranet_access = Value::Value(true);
        let mut next = prior.clone();
        next.extranet_access = Value::Value(false);

        DcdbInstanceConfig
            .update(&client, &prior, next, &["extranet_access"])
            .await
            .unwrap();

        assert_eq!(mock.actions(), vec!["CloseDBExtranetAccess"]);
    }

    #[tokio::test]
    async fn wan_status_maps_to_extranet_access() {
        let (client, mock) = mock_client();
        mock.respond("DescribeDCDBInstances", instance(0, 2));

        let state = DcdbInstanceConfig::import("dcdbt-1").unwrap();
        let state = DcdbInstanceConfig.read(&client, state).await.unwrap().unwrap();

        assert_eq!(state.extranet_access, Value::Value(false));
        assert_eq!(state.rs_access_strategy, Value::Value(0));
    }

    #[tokio::test]
    async fn missing_instance_reads_as_gone() {
        let (client, mock) = mock_client();
        mock.respond("DescribeDCDBInstances", json!({ "TotalCount": 0, "Instances": [] }));

        let state = DcdbInstanceConfig::import("dcdbt-1").unwrap();
        assert!(DcdbInstanceConfig.read(&client, state).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_leaves_the_instance_alone() {
        let (client, mock) = mock_client();
        let state = DcdbInstanceConfig::import("dcdbt-1").unwrap();
        DcdbInstanceConfig.delete(&client, state).await.unwrap();
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn unset_settings_are_planned_as_computed() {
        let schema = DcdbInstanceConfig::schema();
        for field in ["rs_access_strategy", "extranet_access", "ipv6_flag"] {
            assert!(matches!(
                schema.block.attributes[field].constraint,
                OptionalComputed
            ));
        }

        let mut state = DcdbInstanceConfigState {
            instance_id: str_value("dcdbt-1"),
            ..Default::default()
        };
        DcdbInstanceConfig::plan(&mut state, None);

        assert_eq!(state.ipv6_flag, Value::Value(0));
        assert!(state.rs_access_strategy.is_unknown());
        assert!(state.extranet_access.is_unknown());
    }
}
