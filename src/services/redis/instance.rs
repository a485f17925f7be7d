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

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::{
    charge_type_id, charge_type_name, CreateInstancesRequest, DealStatus, InstanceSet,
    RedisNodeInfo, RedisService, RedisStatus, RedisTaskStatus, UpgradeInstanceRequest,
    CHARGE_TYPE_POSTPAID, CHARGE_TYPE_PREPAID, PREPAID_PERIODS,
};
use crate::client::TencentCloudClient;
use crate::common::{invalid_argument, retry, retry_error, StateChangeConf};
use crate::resource::ResourceBinding;
use crate::services::cvm::{zones, Zones};
use crate::services::tag::{diff_tags, resource_name, TagService};
use crate::utils::{
    boolean, changed_fields, get_bool, get_i64, get_i64_list, get_str, get_str_map, get_str_set,
    number, number_list, opt_str_value, required_i64, required_str, schema, sensitive,
    set_default, str_map_value, str_set_value, str_value, string, string_map, string_set,
    unknown_if_null, StringSet, WithSchema,
};

/// Polls during which an instance still reported online is assumed not to
/// have started its upgrade yet
const UPGRADE_START_GRACE: u32 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisInstanceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub availability_zone: ValueString<'a>,
    pub type_id: ValueNumber,
    pub redis_shard_num: ValueNumber,
    pub redis_replicas_num: ValueNumber,
    pub replica_zone_ids: ValueList<ValueNumber>,
    pub name: ValueString<'a>,
    pub password: ValueString<'a>,
    pub no_auth: Value<bool>,
    pub mem_size: ValueNumber,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub security_groups: StringSet<'a>,
    pub project_id: ValueNumber,
    pub port: ValueNumber,
    pub charge_type: ValueString<'a>,
    pub prepaid_period: ValueNumber,
    pub force_delete: Value<bool>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub ip: ValueString<'a>,
    pub status: ValueString<'a>,
    pub create_time: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RedisInstance;

impl WithSchema for RedisInstance {
    fn schema() -> Schema {
        schema(
            "Provides a resource to create a Redis instance and set its attributes.",
            map! {
                "id" => string(Computed, "Id of the instance."),
                "availability_zone" => string(Required, "The available zone ID of an instance to be created."),
                "type_id" => number(OptionalComputed, "Instance type. Available values reference data source `tencentcloud_redis_zone_config` or document. Defaults to 2."),
                "redis_shard_num" => number(OptionalComputed, "The number of instance shards. Defaults to 1."),
                "redis_replicas_num" => number(OptionalComputed, "The number of instance copies. Defaults to 1."),
                "replica_zone_ids" => number_list(OptionalComputed, "ID of replica nodes available zone. This is not required for standalone and master slave versions."),
                "name" => string(OptionalComputed, "Instance name."),
                "password" => sensitive(string(Optional, "Password for a Redis user, which should be 8 to 16 characters. NOTE: Only `no_auth=true` specified can make password empty.")),
                "no_auth" => boolean(OptionalComputed, "Indicates whether the redis instance support no-auth access. NOTE: Only available in private cloud environment."),
                "mem_size" => number(Required, "The memory volume of an available instance(in MB), please refer to `tencentcloud_redis_zone_config.list[zone].mem_sizes`."),
                "vpc_id" => string(Optional, "ID of the vpc with which the instance is to be associated."),
                "subnet_id" => string(Optional, "Specifies which subnet the instance should belong to."),
                "security_groups" => string_set(OptionalComputed, "ID of security group. If both vpc_id and subnet_id are not set, this argument should not be set either."),
                "project_id" => number(OptionalComputed, "Specifies which project the instance should belong to."),
                "port" => number(OptionalComputed, "The port used to access a redis instance. The default value is 6379."),
                "charge_type" => string(OptionalComputed, "The charge type of instance. Valid values: `PREPAID` and `POSTPAID`. Default value is `POSTPAID`."),
                "prepaid_period" => number(OptionalComputed, "The tenancy (time unit is month) of the prepaid instance. Valid values: 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 24, 36. Cannot be changed once set."),
                "force_delete" => boolean(OptionalComputed, "Indicate whether to delete Redis instance directly or not. Default is false. If set true, the instance will be deleted instead of staying recycle bin."),
                "tags" => string_map(Optional, "Instance tags."),
                "ip" => string(Computed, "IP address of an instance."),
                "status" => string(Computed, "Current status of an instance, maybe: init, processing, online, isolate and todelete."),
                "create_time" => string(Computed, "The time when the instance was created."),
            },
            map! {},
        )
    }
}

/// Arguments checked before anything is sent
fn check_create_args(state: &RedisInstanceState<'_>) -> Result<()> {
    let vpc_id = get_str(&state.vpc_id);
    let subnet_id = get_str(&state.subnet_id);
    let no_auth = get_bool(&state.no_auth);

    match (vpc_id, subnet_id) {
        (Some(_), Some(_)) => (),
        (None, None) => {
            if !get_str_set(&state.security_groups).is_empty() {
                return Err(invalid_argument(
                    "security_groups",
                    "redis need empty security_groups if vpc_id and subnet_id is empty",
                ));
            }
            if no_auth {
                return Err(invalid_argument(
                    "no_auth",
                    "cannot set `no_auth=true` if `vpc_id` and `subnet_id` is empty",
                ));
            }
        }
        _ => {
            return Err(invalid_argument(
                "vpc_id",
                "redis need vpc_id and subnet_id both set or none",
            ))
        }
    }

    if !no_auth && get_str(&state.password).is_none() {
        return Err(invalid_argument(
            "password",
            "`password` is required unless `no_auth` is true",
        ));
    }

    if get_str(&state.charge_type) == Some(CHARGE_TYPE_PREPAID) {
        let period = get_i64(&state.prepaid_period).unwrap_or(1);
        if !PREPAID_PERIODS.contains(&period) {
            return Err(invalid_argument(
                "prepaid_period",
                format!("prepaid_period {period} is not one of {PREPAID_PERIODS:?}"),
            ));
        }
    }
    Ok(())
}

fn create_request(state: &RedisInstanceState<'_>, zones: &Zones) -> Result<CreateInstancesRequest> {
    let zone_name = required_str(&state.availability_zone, "availability_zone")?;
    let zone_id = zones
        .id(zone_name)
        .map_err(|err| invalid_argument("availability_zone", err.to_string()))?;
    let charge_type = get_str(&state.charge_type).unwrap_or(CHARGE_TYPE_POSTPAID);
    let billing_mode = charge_type_id(charge_type).ok_or_else(|| {
        invalid_argument("charge_type", format!("unsupported charge type `{charge_type}`"))
    })?;

    // The master node lives in the instance zone, replicas in the listed ones
    let replica_zone_ids = get_i64_list(&state.replica_zone_ids);
    let node_set = (!replica_zone_ids.is_empty()).then(|| {
        std::iter::once(RedisNodeInfo {
            node_type: 0,
            node_id: None,
            zone_id,
        })
        .chain(replica_zone_ids.iter().map(|&zone_id| RedisNodeInfo {
            node_type: 1,
            node_id: None,
            zone_id,
        }))
        .collect()
    });
    let security_groups = get_str_set(&state.security_groups);

    Ok(CreateInstancesRequest {
        type_id: get_i64(&state.type_id).unwrap_or(2),
        mem_size: required_i64(&state.mem_size, "mem_size")?,
        goods_num: 1,
        period: get_i64(&state.prepaid_period).unwrap_or(1),
        billing_mode,
        zone_id,
        password: get_str(&state.password).map(str::to_owned),
        vpc_id: get_str(&state.vpc_id).map(str::to_owned),
        subnet_id: get_str(&state.subnet_id).map(str::to_owned),
        project_id: get_i64(&state.project_id).filter(|id| *id >= 0),
        security_group_id_list: (!security_groups.is_empty()).then_some(security_groups),
        vport: get_i64(&state.port),
        redis_shard_num: get_i64(&state.redis_shard_num).filter(|n| *n > 0),
        redis_replicas_num: get_i64(&state.redis_replicas_num).filter(|n| *n > 0),
        instance_name: get_str(&state.name).map(str::to_owned),
        no_auth: get_bool(&state.no_auth).then_some(true),
        node_set,
    })
}

fn unknown_as_empty(value: &mut ValueList<ValueNumber>) {
    if value.is_unknown() {
        *value = Value::Value(Vec::new());
    }
}

async fn describe(service: RedisService<'_>, instance_id: &str, timeout: Duration) -> Result<Option<InstanceSet>> {
    retry(timeout, || async move {
        service
            .describe_instance(instance_id)
            .await
            .map_err(|err| retry_error(err, &[]))
    })
    .await
}

async fn wait_online(service: RedisService<'_>, instance_id: &str, timeout: Duration) -> Result<InstanceSet> {
    StateChangeConf::new(
        format!("redis instance {instance_id}"),
        [RedisStatus::Online],
        timeout,
    )
    .pending([RedisStatus::Init, RedisStatus::Processing])
    .wait(|| async move {
        let instance = service
            .describe_instance(instance_id)
            .await?
            .ok_or_else(|| anyhow!("redis instance {instance_id} does not exist"))?;
        let status = instance.status();
        Ok((instance, status))
    })
    .await
}

/// Order id of a creation that did not return instance ids directly
async fn wait_deal(service: RedisService<'_>, deal_id: &str, timeout: Duration) -> Result<String> {
    StateChangeConf::new(format!("redis order {deal_id}"), [DealStatus::Delivered], timeout)
        .wait(|| async move {
            let detail = service
                .describe_instance_deal_detail(deal_id)
                .await?
                .ok_or_else(|| anyhow!("redis order {deal_id} does not exist"))?;
            let status = DealStatus::from(detail.status);
            if let DealStatus::Failed(code) = status {
                bail!("redis instance delivery failure, deal status is {code}");
            }
            Ok((detail.instance_ids.unwrap_or_default(), status))
        })
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("redis order {deal_id} delivered no instance"))
}

async fn wait_task(service: RedisService<'_>, task_id: i64, what: &str, timeout: Duration) -> Result<()> {
    StateChangeConf::new(format!("redis task {what} ({task_id})"), [RedisTaskStatus::Succeed], timeout)
        .pending([RedisTaskStatus::Preparing, RedisTaskStatus::Running])
        .fail_on([RedisTaskStatus::Failed, RedisTaskStatus::Error])
        .wait(|| async move { Ok(((), service.describe_task_info(task_id).await?)) })
        .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpgradePhase {
    NotStarted,
    Running,
    Done,
}

/// An upgrade first leaves the instance online for a while, then processing,
/// then online again
async fn wait_upgraded(service: RedisService<'_>, instance_id: &str, timeout: Duration) -> Result<()> {
    let started = AtomicBool::new(false);
    let polls = AtomicU32::new(0);
    let (started, polls) = (&started, &polls);

    StateChangeConf::new(
        format!("redis instance {instance_id} upgrade"),
        [UpgradePhase::Done],
        timeout,
    )
    .wait(|| async move {
        let instance = service
            .describe_instance(instance_id)
            .await?
            .ok_or_else(|| anyhow!("redis instance {instance_id} disappeared during its upgrade"))?;
        let seen = polls.fetch_add(1, Ordering::SeqCst) + 1;
        let phase = match instance.status() {
            status if status.is_busy() => {
                started.store(true, Ordering::SeqCst);
                UpgradePhase::Running
            }
            RedisStatus::Online
                if started.load(Ordering::SeqCst) || seen >= UPGRADE_START_GRACE =>
            {
                UpgradePhase::Done
            }
            RedisStatus::Online => UpgradePhase::NotStarted,
            status => bail!(
                "after the upgrade of redis instance {instance_id}, status is {}",
                status.name()
            ),
        };
        Ok(((), phase))
    })
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Busy,
    Settled,
}

/// Wait for pending operations to end before destroying an instance
async fn wait_settled(service: RedisService<'_>, instance_id: &str, timeout: Duration) -> Result<Option<InstanceSet>> {
    StateChangeConf::new(
        format!("redis instance {instance_id}"),
        [Settlement::Settled],
        timeout,
    )
    .wait(|| async move {
        let instance = service.describe_instance(instance_id).await?;
        let settlement = match &instance {
            Some(instance) if instance.status().is_busy() => Settlement::Busy,
            _ => Settlement::Settled,
        };
        Ok((instance, settlement))
    })
    .await
}

async fn wait_isolated(service: RedisService<'_>, instance_id: &str, timeout: Duration) -> Result<()> {
    StateChangeConf::new(
        format!("redis instance {instance_id} isolation"),
        [Settlement::Settled],
        timeout,
    )
    .wait(|| async move {
        let settlement = match service.describe_instance(instance_id).await? {
            Some(instance) if !instance.status().is_gone() => Settlement::Busy,
            _ => Settlement::Settled,
        };
        Ok(((), settlement))
    })
    .await
}

#[async_trait]
impl ResourceBinding for RedisInstance {
    const TYPE_NAME: &'static str = "tencentcloud_redis_instance";
    const FORCE_NEW: &'static [&'static str] = &[
        "availability_zone",
        "type_id",
        "replica_zone_ids",
        "no_auth",
        "vpc_id",
        "subnet_id",
        "security_groups",
        "port",
        "charge_type",
    ];
    const IMMUTABLE: &'static [&'static str] = &["prepaid_period"];

    type State<'a> = RedisInstanceState<'a>;

    fn validate(state: &Self::State<'_>, diags: &mut Diagnostics) {
        if let Some(charge_type) = get_str(&state.charge_type) {
            if charge_type_id(charge_type).is_none() {
                diags.error(
                    "Invalid charge_type",
                    format!("`{charge_type}` is not one of {CHARGE_TYPE_POSTPAID}, {CHARGE_TYPE_PREPAID}"),
                    AttributePath::new("charge_type"),
                );
            }
        }
        if let Some(period) = get_i64(&state.prepaid_period) {
            if !PREPAID_PERIODS.contains(&period) {
                diags.error(
                    "Invalid prepaid_period",
                    format!("{period} is not one of {PREPAID_PERIODS:?}"),
                    AttributePath::new("prepaid_period"),
                );
            }
        }
    }

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        set_default(&mut state.type_id, 2);
        set_default(&mut state.redis_shard_num, 1);
        set_default(&mut state.redis_replicas_num, 1);
        set_default(&mut state.no_auth, false);
        set_default(&mut state.project_id, 0);
        set_default(&mut state.port, 6379);
        set_default(&mut state.charge_type, Cow::Borrowed(CHARGE_TYPE_POSTPAID));
        set_default(&mut state.prepaid_period, 1);
        set_default(&mut state.force_delete, false);
        unknown_if_null(&mut state.name);
        unknown_if_null(&mut state.security_groups);
        unknown_if_null(&mut state.replica_zone_ids);

        if prior.is_none() {
            state.id = Value::Unknown;
            state.ip = Value::Unknown;
            state.status = Value::Unknown;
            state.create_time = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned;
            availability_zone, type_id, redis_shard_num, redis_replicas_num, replica_zone_ids,
            name, password, no_auth, mem_size, vpc_id, subnet_id, security_groups, project_id,
            port, charge_type, prepaid_period, force_delete, tags,
        )
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        check_create_args(&state)?;
        let service = RedisService::new(client);
        let timeouts = client.timeouts();

        let zones = zones(client, timeouts.read).await?;
        let request = create_request(&state, &zones)?;
        let request = &request;
        let response = retry(timeouts.write, || async move {
            service
                .create_instances(request)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;

        let instance_id = match response.instance_ids.unwrap_or_default().into_iter().next() {
            Some(instance_id) => instance_id,
            None => wait_deal(service, &response.deal_id, timeouts.read * 10).await?,
        };
        tracing::info!(%instance_id, "redis instance created");

        wait_online(service, &instance_id, timeouts.read * 20).await?;

        let tags = get_str_map(&state.tags);
        if !tags.is_empty() {
            let resource = resource_name("redis", "instance", client.region(), &instance_id);
            TagService::new(client).modify_tags(&resource, &tags, &[]).await?;
        }
        state.id = str_value(instance_id);
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let instance_id = required_str(&state.id, "id")?.to_owned();
        let service = RedisService::new(client);
        let timeouts = client.timeouts();

        let Some(instance) = describe(service, &instance_id, timeouts.read).await? else {
            return Ok(None);
        };
        let status = instance.status();
        if status.is_gone() {
            return Ok(None);
        }
        if let RedisStatus::Other(code) = status {
            bail!("redis instance {instance_id} reports unknown status {code}");
        }

        let zones = zones(client, timeouts.read).await?;
        let security_groups = service.security_groups();
        let instance_ref = instance_id.as_str();
        let groups = retry(timeouts.read, || async move {
            security_groups
                .describe(instance_ref)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        let tag_service = TagService::new(client);
        let tags = retry(timeouts.read, || async move {
            tag_service
                .describe_resource_tags("redis", "instance", client.region(), instance_ref)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;

        state.availability_zone = str_value(zones.name(instance.zone_id)?);
        state.type_id = Value::Value(instance.type_id);
        state.redis_shard_num = Value::Value(instance.redis_shard_num);
        state.redis_replicas_num = Value::Value(instance.redis_replicas_num);
        state.name = str_value(instance.instance_name);
        state.no_auth = Value::Value(instance.no_auth);
        state.mem_size = Value::Value(instance.redis_shard_size);
        state.vpc_id = opt_str_value(Some(instance.uniq_vpc_id));
        state.subnet_id = opt_str_value(Some(instance.uniq_subnet_id));
        state.security_groups = str_set_value(groups);
        state.project_id = Value::Value(instance.project_id);
        state.port = Value::Value(instance.port);
        state.charge_type = str_value(charge_type_name(instance.billing_mode));
        state.tags = if tags.is_empty() {
            Value::Null
        } else {
            str_map_value(tags)
        };
        state.ip = str_value(instance.wan_ip);
        state.status = str_value(status.name());
        state.create_time = str_value(instance.createtime);

        match instance.node_set {
            Some(nodes) => {
                state.replica_zone_ids = Value::Value(
                    nodes
                        .into_iter()
                        .filter(|node| node.node_type != 0)
                        .map(|node| Value::Value(node.zone_id))
                        .collect(),
                );
            }
            None => unknown_as_empty(&mut state.replica_zone_ids),
        }
        set_default(&mut state.prepaid_period, 1);
        set_default(&mut state.force_delete, false);

        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        let instance_id = required_str(&planned.id, "id")?;
        let service = RedisService::new(client);
        let timeouts = client.timeouts();

        if changes.contains(&"name") {
            let name = get_str(&planned.name).unwrap_or(instance_id);
            retry(timeouts.write, || async move {
                service
                    .rename_instance(instance_id, name)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        if ["mem_size", "redis_shard_num", "redis_replicas_num"]
            .iter()
            .any(|field| changes.contains(field))
        {
            let request = UpgradeInstanceRequest {
                instance_id: instance_id.to_owned(),
                mem_size: required_i64(&planned.mem_size, "mem_size")?,
                redis_shard_num: get_i64(&planned.redis_shard_num).filter(|n| *n > 0),
                redis_replicas_num: get_i64(&planned.redis_replicas_num).filter(|n| *n > 0),
                node_set: None,
            };
            let request = &request;
            let deal_id = retry(timeouts.write, || async move {
                service
                    .upgrade_instance(request)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
            tracing::info!(instance_id, %deal_id, "redis instance upgrade ordered");
            wait_upgraded(service, instance_id, timeouts.read * 20).await?;
        }

        if changes.contains(&"password") {
            let password = get_str(&planned.password).unwrap_or_default();
            let task_id = service.reset_password(instance_id, password).await?;
            wait_task(service, task_id, "ResetPassword", timeouts.read * 2).await?;
        }

        if changes.contains(&"project_id") {
            let project_id = get_i64(&planned.project_id).unwrap_or_default();
            service.modify_project(instance_id, project_id).await?;
        }

        if changes.contains(&"tags") {
            let (replace, delete) = diff_tags(&get_str_map(&prior.tags), &get_str_map(&planned.tags));
            let resource = resource_name("redis", "instance", client.region(), instance_id);
            TagService::new(client)
                .modify_tags(&resource, &replace, &delete)
                .await?;
        }

        Ok(planned)
    }

    async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
        let instance_id = required_str(&state.id, "id")?;
        let service = RedisService::new(client);
        let timeouts = client.timeouts();

        let Some(instance) = wait_settled(service, instance_id, timeouts.read * 20).await? else {
            return Ok(());
        };
        let postpaid = charge_type_name(instance.billing_mode) == CHARGE_TYPE_POSTPAID;
        let force_delete = postpaid || get_bool(&state.force_delete);

        if postpaid {
            let task_id = service.destroy_postpaid_instance(instance_id).await?;
            wait_task(service, task_id, "DestroyPostpaidInstance", timeouts.write).await?;
        } else if !instance.status().is_gone() {
            retry(timeouts.write * 5, || async move {
                service
                    .destroy_prepaid_instance(instance_id)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
            wait_isolated(service, instance_id, timeouts.read * 10).await?;
        }

        if force_delete {
            let task_id = retry(timeouts.write * 6, || async move {
                service
                    .clean_up_instance(instance_id)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
            wait_task(service, task_id, "CleanUpInstance", timeouts.write).await?;
        }
        Ok(())
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        if id.is_empty() {
            return Err(invalid_argument("id", "redis instance id must not be empty"));
        }
        Ok(RedisInstanceState {
            id: str_value(id),
            prepaid_period: Value::Value(1),
            force_delete: Value::Value(false),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as Json};
    use tf_provider::Resource;

    use super::*;
    use crate::client::mock_client;
    use crate::common::InvalidArgument;
    use crate::resource::tests::configured;

    fn instance(status: i64, billing_mode: i64) -> Json {
        json!({
            "TotalCount": 1,
            "InstanceSet": [{
                "InstanceId": "crs-1",
                "InstanceName": "cache",
                "ProjectId": 0,
                "ZoneId": 100003,
                "Status": status,
                "WanIp": "10.0.0.12",
                "Port": 6379,
                "Createtime": "2024-03-01 10:00:00",
                "Type": 2,
                "UniqVpcId": "vpc-1",
                "UniqSubnetId": "subnet-1",
                "BillingMode": billing_mode,
                "RedisShardSize": 1024,
                "RedisShardNum": 1,
                "RedisReplicasNum": 1,
                "NoAuth": false,
                "NodeSet": null
            }]
        })
    }

    fn zone_set() -> Json {
        json!({ "ZoneSet": [
            { "Zone": "ap-guangzhou-3", "ZoneId": "100003", "ZoneState": "AVAILABLE" }
        ] })
    }

    fn planned<'a>() -> RedisInstanceState<'a> {
        let mut state = RedisInstanceState {
            availability_zone: str_value("ap-guangzhou-3"),
            mem_size: Value::Value(1024),
            password: str_value("Passw0rd.redis"),
            vpc_id: str_value("vpc-1"),
            subnet_id: str_value("subnet-1"),
            ..Default::default()
        };
        RedisInstance::plan(&mut state, None);
        state
    }

    fn field_of(err: &anyhow::Error) -> &'static str {
        err.downcast_ref::<InvalidArgument>().unwrap().field
    }

    #[tokio::test(start_paused = true)]
    async fn create_sends_arguments_only() {
        let (resource, mock) = configured(RedisInstance);
        mock.respond("DescribeZones", zone_set());
        mock.respond("CreateInstances", json!({ "DealId": "d-1", "InstanceIds": ["crs-1"] }));
        mock.respond("DescribeInstances", instance(2, 0));
        mock.respond("DescribeDBSecurityGroups", json!({ "Groups": [{ "SecurityGroupId": "sg-1" }] }));
        mock.respond("ModifyResourceTags", json!({}));
        mock.respond(
            "DescribeResourceTagsByResourceIds",
            json!({ "TotalCount": 1, "Tags": [{ "TagKey": "env", "TagValue": "prod", "ResourceId": "crs-1" }] }),
        );
        let mut config = planned();
        config.tags = str_map_value([("env".to_owned(), "prod".to_owned())]);

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(config),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        let payload = &mock.payloads("CreateInstances")[0];
        for computed in ["Ip", "WanIp", "Status", "Createtime", "CreateTime"] {
            assert!(payload.get(computed).is_none(), "{computed} was sent");
        }
        assert_eq!(payload["ZoneId"], 100003);
        assert_eq!(payload["VPort"], 6379);
        assert_eq!(payload["BillingMode"], 0);

        let state = state.as_ref().unwrap();
        assert_eq!(state.id.as_str(), "crs-1");
        assert_eq!(state.status.as_str(), "online");
        assert_eq!(state.ip.as_str(), "10.0.0.12");
        assert_eq!(get_str_set(&state.security_groups), vec!["sg-1"]);
        assert_eq!(get_str_map(&state.tags)["env"], "prod");
        assert_eq!(
            mock.payloads("ModifyResourceTags"),
            vec![json!({
                "Resource": "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                "ReplaceTags": [{ "TagKey": "env", "TagValue": "prod" }],
            })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_without_tags_skips_the_tag_api() {
        let (client, mock) = mock_client();
        mock.respond("DescribeZones", zone_set());
        mock.respond("CreateInstances", json!({ "DealId": "d-1", "InstanceIds": ["crs-1"] }));
        mock.respond("DescribeInstances", instance(2, 0));

        RedisInstance.create(&client, planned()).await.unwrap();

        assert!(mock.payloads("ModifyResourceTags").is_empty());
    }

    #[tokio::test]
    async fn read_refreshes_tags_from_the_tag_api() {
        let (client, mock) = mock_client();
        mock.respond("DescribeInstances", instance(2, 0));
        mock.respond("DescribeZones", zone_set());
        mock.respond("DescribeDBSecurityGroups", json!({ "Groups": [] }));
        mock.respond(
            "DescribeResourceTagsByResourceIds",
            json!({ "TotalCount": 2, "Tags": [
                { "TagKey": "env", "TagValue": "prod", "ResourceId": "crs-1" },
                { "TagKey": "team", "TagValue": "cache", "ResourceId": "crs-1" }
            ] }),
        );

        let mut state = planned();
        state.id = str_value("crs-1");
        state.tags = str_map_value([("env".to_owned(), "dev".to_owned())]);
        let state = RedisInstance.read(&client, state).await.unwrap().unwrap();

        let tags = get_str_map(&state.tags);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["env"], "prod");
        assert_eq!(tags["team"], "cache");
        let payload = &mock.payloads("DescribeResourceTagsByResourceIds")[0];
        assert_eq!(payload["ServiceType"], "redis");
        assert_eq!(payload["ResourcePrefix"], "instance");
        assert_eq!(payload["ResourceIds"], json!(["crs-1"]));
    }

    #[tokio::test]
    async fn read_without_tags_leaves_the_map_null() {
        let (client, mock) = mock_client();
        mock.respond("DescribeInstances", instance(2, 0));
        mock.respond("DescribeZones", zone_set());
        mock.respond("DescribeDBSecurityGroups", json!({ "Groups": [] }));
        mock.respond("DescribeResourceTagsByResourceIds", json!({ "TotalCount": 0, "Tags": [] }));

        let mut state = planned();
        state.id = str_value("crs-1");
        let state = RedisInstance.read(&client, state).await.unwrap().unwrap();

        assert!(state.tags.is_null());
    }

    #[tokio::test]
    async fn unmapped_status_is_an_error() {
        let (client, mock) = mock_client();
        mock.respond("DescribeInstances", instance(7, 0));

        let mut state = planned();
        state.id = str_value("crs-1");
        let err = RedisInstance.read(&client, state).await.unwrap_err();

        assert!(err.to_string().contains("unknown status 7"), "{err}");
        assert_eq!(mock.actions(), vec!["DescribeInstances"]);
    }

    #[tokio::test]
    async fn tag_update_sends_the_difference() {
        let (client, mock) = mock_client();
        mock.respond("ModifyResourceTags", json!({}));

        let mut prior = planned();
        prior.id = str_value("crs-1");
        prior.tags = str_map_value([
            ("env".to_owned(), "dev".to_owned()),
            ("owner".to_owned(), "ops".to_owned()),
            ("team".to_owned(), "cache".to_owned()),
        ]);
        let mut next = prior.clone();
        next.tags = str_map_value([
            ("env".to_owned(), "prod".to_owned()),
            ("team".to_owned(), "cache".to_owned()),
        ]);
        let changes = RedisInstance::changes(&prior, &next);
        assert_eq!(changes, vec!["tags"]);

        RedisInstance
            .update(&client, &prior, next, &changes)
            .await
            .unwrap();

        assert_eq!(
            mock.payloads("ModifyResourceTags"),
            vec![json!({
                "Resource": "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                "ReplaceTags": [{ "TagKey": "env", "TagValue": "prod" }],
                "DeleteTags": [{ "TagKey": "owner" }],
            })]
        );
    }

    #[tokio::test]
    async fn prepaid_period_cannot_change() {
        let (resource, mock) = configured(RedisInstance);
        let mut prior = planned();
        prior.id = str_value("crs-1");
        let mut next = prior.clone();
        next.prepaid_period = Value::Value(2);

        let mut diags = Diagnostics::default();
        let result = resource
            .update(
                &mut diags,
                Value::Value(prior),
                Value::Value(next),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await;

        assert!(result.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn isolated_instance_reads_as_gone() {
        let (resource, mock) = configured(RedisInstance);
        mock.respond("DescribeInstances", instance(-2, 1));

        let mut state = planned();
        state.id = str_value("crs-1");
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .read(&mut diags, Value::Value(state), Default::default(), Default::default())
            .await
            .unwrap();

        assert!(state.is_null());
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn network_arguments_are_checked() {
        let mut state = planned();
        state.subnet_id = Value::Null;
        assert_eq!(field_of(&check_create_args(&state).unwrap_err()), "vpc_id");

        let mut state = planned();
        state.vpc_id = Value::Null;
        state.subnet_id = Value::Null;
        state.security_groups = str_set_value(["sg-1".to_owned()]);
        assert_eq!(field_of(&check_create_args(&state).unwrap_err()), "security_groups");

        let mut state = planned();
        state.password = Value::Null;
        assert_eq!(field_of(&check_create_args(&state).unwrap_err()), "password");

        let mut state = planned();
        state.password = Value::Null;
        state.no_auth = Value::Value(true);
        assert!(check_create_args(&state).is_ok());

        let mut state = planned();
        state.charge_type = str_value(CHARGE_TYPE_PREPAID);
        state.prepaid_period = Value::Value(13);
        assert_eq!(field_of(&check_create_args(&state).unwrap_err()), "prepaid_period");
    }

    #[test]
    fn replica_zones_add_nodes_after_the_master() {
        let zones = Zones::from_zone_set(
            serde_json::from_value(json!([
                { "Zone": "ap-guangzhou-3", "ZoneId": "100003" },
                { "Zone": "ap-guangzhou-4", "ZoneId": "100004" }
            ]))
            .unwrap(),
        )
        .unwrap();
        let mut state = planned();
        state.replica_zone_ids = Value::Value(vec![Value::Value(100004)]);

        let request = create_request(&state, &zones).unwrap();
        let nodes = request.node_set.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!((nodes[0].node_type, nodes[0].zone_id), (0, 100003));
        assert_eq!((nodes[1].node_type, nodes[1].zone_id), (1, 100004));
    }

    #[tokio::test(start_paused = true)]
    async fn postpaid_delete_destroys_then_cleans_up() {
        let (client, mock) = mock_client();
        mock.respond("DescribeInstances", instance(2, 0));
        mock.respond("DestroyPostpaidInstance", json!({ "TaskId": 5 }));
        mock.respond("CleanUpInstance", json!({ "TaskId": 6 }));
        mock.respond("DescribeTaskInfo", json!({ "Status": "succeed" }));

        let mut state = planned();
        state.id = str_value("crs-1");
        RedisInstance.delete(&client, state).await.unwrap();

        assert_eq!(
            mock.actions(),
            vec![
                "DescribeInstances",
                "DestroyPostpaidInstance",
                "DescribeTaskInfo",
                "CleanUpInstance",
                "DescribeTaskInfo",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn prepaid_delete_keeps_recycle_bin_without_force() {
        let (client, mock) = mock_client();
        mock.respond("DescribeInstances", instance(2, 1));
        mock.respond("DescribeInstances", instance(-2, 1));
        mock.respond("DestroyPrepaidInstance", json!({ "DealId": "d-9" }));

        let mut state = planned();
        state.id = str_value("crs-1");
        state.charge_type = str_value(CHARGE_TYPE_PREPAID);
        RedisInstance.delete(&client, state).await.unwrap();

        assert!(mock.payloads("CleanUpInstance").is_empty());
        assert_eq!(mock.payloads("DestroyPrepaidInstance").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_password_task_is_an_error() {
        let (client, mock) = mock_client();
        mock.respond("ResetPassword", json!({ "TaskId": 3 }));
        mock.respond("DescribeTaskInfo", json!({ "Status": "running" }));
        mock.respond("DescribeTaskInfo", json!({ "Status": "failed" }));

        let mut prior = planned();
        prior.id = str_value("crs-1");
        let mut next = prior.clone();
        next.password = str_value("An0ther.pass");

        let err = RedisInstance
            .update(&client, &prior, next, &["password"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn upgrade_waits_for_processing_then_online() {
        let (client, mock) = mock_client();
        mock.respond("UpgradeInstance", json!({ "DealId": "d-2" }));
        for status in [2, 1, 1, 2] {
            mock.respond("DescribeInstances", instance(status, 0));
        }

        let mut prior = planned();
        prior.id = str_value("crs-1");
        let mut next = prior.clone();
        next.mem_size = Value::Value(2048);

        RedisInstance
            .update(&client, &prior, next, &["mem_size"])
            .await
            .unwrap();

        assert_eq!(mock.payloads("UpgradeInstance")[0]["MemSize"], 2048);
        assert_eq!(mock.payloads("DescribeInstances").len(), 4);
    }

    #[test]
    fn import_sets_identity_and_defaults() {
        let state = RedisInstance::import("crs-1").unwrap();
        assert_eq!(state.id.as_str(), "crs-1");
        assert_eq!(state.prepaid_period, Value::Value(1));
        assert!(RedisInstance::import("").is_err());
    }
}
