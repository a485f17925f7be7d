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

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::AttributeConstraint::{Computed, Optional};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use super::service::{charge_type_name, DescribeInstancesRequest, InstanceSet, RedisService};
use crate::client::TencentCloudClient;
use crate::common::{retry, retry_error};
use crate::data_source::{DataSourceBinding, Lookup};
use crate::services::cvm::{zones, Zones};
use crate::utils::{
    boolean, get_i64, get_str, number, object_list, schema, str_map_value, str_value, string,
    string_map, WithSchema,
};

const PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisNodeState {
    pub id: ValueNumber,
    pub zone_id: ValueNumber,
    pub master: Value<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisInstanceRow<'a> {
    #[serde(borrow = "'a")]
    pub redis_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub project_id: ValueNumber,
    pub type_id: ValueNumber,
    pub redis_shard_num: ValueNumber,
    pub redis_replicas_num: ValueNumber,
    pub mem_size: ValueNumber,
    pub status: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub ip: ValueString<'a>,
    pub port: ValueNumber,
    pub create_time: ValueString<'a>,
    pub charge_type: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub node_info: ValueList<Value<RedisNodeState>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisInstancesState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub search_key: ValueString<'a>,
    pub project_id: ValueNumber,
    pub limit: ValueNumber,
    pub result_output_file: ValueString<'a>,
    pub instance_list: ValueList<Value<RedisInstanceRow<'a>>>,
}

/// Plain copy of one result row, dumped into `result_output_file`
#[derive(Debug, Clone, Serialize)]
struct RedisNodeInfo {
    id: i64,
    zone_id: i64,
    master: bool,
}

#[derive(Debug, Clone, Serialize)]
struct RedisInstanceInfo {
    redis_id: String,
    name: String,
    zone: String,
    project_id: i64,
    type_id: i64,
    redis_shard_num: i64,
    redis_replicas_num: i64,
    mem_size: i64,
    status: &'static str,
    vpc_id: String,
    subnet_id: String,
    ip: String,
    port: i64,
    create_time: String,
    charge_type: &'static str,
    tags: BTreeMap<String, String>,
    node_info: Vec<RedisNodeInfo>,
}

impl RedisInstanceInfo {
    fn new(instance: InstanceSet, zones: &Zones) -> Result<Self> {
        let status = instance.status().name();
        Ok(Self {
            zone: zones.name(instance.zone_id)?.to_owned(),
            redis_id: instance.instance_id,
            name: instance.instance_name,
            project_id: instance.project_id,
            type_id: instance.type_id,
            redis_shard_num: instance.redis_shard_num,
            redis_replicas_num: instance.redis_replicas_num,
            mem_size: instance.redis_shard_size,
            status,
            vpc_id: instance.uniq_vpc_id,
            subnet_id: instance.uniq_subnet_id,
            ip: instance.wan_ip,
            port: instance.port,
            create_time: instance.createtime,
            charge_type: charge_type_name(instance.billing_mode),
            tags: instance
                .instance_tags
                .unwrap_or_default()
                .into_iter()
                .map(|tag| (tag.tag_key, tag.tag_value))
                .collect(),
            node_info: instance
                .node_set
                .unwrap_or_default()
                .into_iter()
                .map(|node| RedisNodeInfo {
                    id: node.node_id.unwrap_or_default(),
                    zone_id: node.zone_id,
                    master: node.node_type == 0,
                })
                .collect(),
        })
    }

    fn to_row<'a>(&self) -> RedisInstanceRow<'a> {
        RedisInstanceRow {
            redis_id: str_value(&self.redis_id),
            name: str_value(&self.name),
            zone: str_value(&self.zone),
            project_id: Value::Value(self.project_id),
            type_id: Value::Value(self.type_id),
            redis_shard_num: Value::Value(self.redis_shard_num),
            redis_replicas_num: Value::Value(self.redis_replicas_num),
            mem_size: Value::Value(self.mem_size),
            status: str_value(self.status),
            vpc_id: str_value(&self.vpc_id),
            subnet_id: str_value(&self.subnet_id),
            ip: str_value(&self.ip),
            port: Value::Value(self.port),
            create_time: str_value(&self.create_time),
            charge_type: str_value(self.charge_type),
            tags: str_map_value(self.tags.clone()),
            node_info: Value::Value(
                self.node_info
                    .iter()
                    .map(|node| {
                        Value::Value(RedisNodeState {
                            id: Value::Value(node.id),
                            zone_id: Value::Value(node.zone_id),
                            master: Value::Value(node.master),
                        })
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RedisInstances;

impl WithSchema for RedisInstances {
    fn schema() -> Schema {
        schema(
            "Use this data source to query the detail information of redis instances.",
            map! {
                "id" => string(Computed, "Hash of the ids of the listed instances."),
                "zone" => string(Optional, "ID of an available zone."),
                "search_key" => string(Optional, "Key words used to match the results, and the key words can be: instance ID, instance name and IP address."),
                "project_id" => number(Optional, "ID of the project to which redis instance belongs."),
                "limit" => number(Optional, "The number limitation of results for a query."),
                "result_output_file" => string(Optional, "Used to save results."),
                "instance_list" => object_list("A list of redis instance. Each element contains the following attributes:", map! {
                    "redis_id" => string(Computed, "ID of the Redis instance."),
                    "name" => string(Computed, "Name of a redis instance."),
                    "zone" => string(Computed, "Available zone."),
                    "project_id" => number(Computed, "ID of the project to which a redis instance belongs."),
                    "type_id" => number(Computed, "Instance type. Refer to `data.tencentcloud_redis_zone_config.list.type_id` get available values."),
                    "redis_shard_num" => number(Computed, "The number of instance shard."),
                    "redis_replicas_num" => number(Computed, "The number of instance copies."),
                    "mem_size" => number(Computed, "Memory size in MB."),
                    "status" => string(Computed, "Current status of an instance, maybe: init, processing, online, isolate and todelete."),
                    "vpc_id" => string(Computed, "ID of the vpc with which the instance is associated."),
                    "subnet_id" => string(Computed, "ID of the vpc subnet."),
                    "ip" => string(Computed, "IP address of an instance."),
                    "port" => number(Computed, "The port used to access a redis instance."),
                    "create_time" => string(Computed, "The time when the instance is created."),
                    "charge_type" => string(Computed, "The charge type of instance. Valid values: `PREPAID` and `POSTPAID`."),
                    "tags" => string_map(Computed, "Tags of the instance."),
                    "node_info" => object_list("Readonly Primary/Replica nodes.", map! {
                        "id" => number(Computed, "ID of the master or replica node."),
                        "zone_id" => number(Computed, "ID of the availability zone of the master or replica node."),
                        "master" => boolean(Computed, "Indicates whether the node is master."),
                    }),
                }),
            },
            map! {},
        )
    }
}

/// Walk every page of `DescribeInstances`, keeping the instances of `zone_id`
/// until `limit` of them are found
async fn list_instances(
    client: &TencentCloudClient,
    search_key: Option<&str>,
    project_id: Option<i64>,
    zone_id: Option<i64>,
    limit: Option<usize>,
) -> Result<Vec<InstanceSet>> {
    let service = RedisService::new(client);
    let mut instances = Vec::new();
    let mut offset = 0;

    loop {
        let request = DescribeInstancesRequest {
            search_key: search_key.map(str::to_owned),
            project_ids: project_id.map(|id| vec![id]),
            limit: PAGE_SIZE,
            offset,
            ..Default::default()
        };
        let request = &request;
        let page = retry(client.timeouts().read, || async move {
            service
                .describe_instances(request)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;

        let items = page.instance_set.unwrap_or_default();
        let received = items.len() as u64;
        for instance in items {
            if zone_id.is_some_and(|zone_id| zone_id != instance.zone_id) {
                continue;
            }
            instances.push(instance);
            if limit.is_some_and(|limit| instances.len() >= limit) {
                return Ok(instances);
            }
        }

        offset += PAGE_SIZE;
        if received < PAGE_SIZE || offset >= page.total_count.max(0) as u64 {
            return Ok(instances);
        }
    }
}

#[async_trait]
impl DataSourceBinding for RedisInstances {
    const TYPE_NAME: &'static str = "tencentcloud_redis_instances";

    type State<'a> = RedisInstancesState<'a>;

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut config: Self::State<'a>,
    ) -> Result<Lookup<Self::State<'a>>> {
        let zones = zones(client, client.timeouts().read).await?;
        let zone_id = get_str(&config.zone).map(|zone| zones.id(zone)).transpose()?;
        let limit = get_i64(&config.limit)
            .filter(|limit| *limit > 0)
            .map(|limit| limit as usize);

        let instances = list_instances(
            client,
            get_str(&config.search_key),
            get_i64(&config.project_id).filter(|id| *id >= 0),
            zone_id,
            limit,
        )
        .await?;
        let infos = instances
            .into_iter()
            .map(|instance| RedisInstanceInfo::new(instance, &zones))
            .collect::<Result<Vec<_>>>()?;

        config.instance_list = Value::Value(infos.iter().map(|info| Value::Value(info.to_row())).collect());
        Ok(Lookup {
            ids: infos.iter().map(|info| info.redis_id.clone()).collect(),
            result: serde_json::to_value(&infos)?,
            state: config,
        })
    }

    fn set_id(state: &mut Self::State<'_>, id: String) {
        state.id = str_value(id);
    }

    fn result_output_file<'b>(state: &'b Self::State<'_>) -> Option<&'b str> {
        get_str(&state.result_output_file)
    }
}
