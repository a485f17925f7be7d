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
use tf_provider::schema::AttributeConstraint::{Computed, Optional};
use tf_provider::schema::NestedBlock;
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::{ClusterQuery, CynosdbCluster, CynosdbService, QueryFilter};
use crate::client::TencentCloudClient;
use crate::common::{paginate, retry_error};
use crate::data_source::{DataSourceBinding, Lookup};
use crate::utils::{
    block, boolean, get_str, get_str_set, number, object_list, schema, str_list_value, str_value,
    string, string_list, string_set, StringSet, WithSchema,
};

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterState<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub operator: ValueString<'a>,
    pub names: StringSet<'a>,
    pub values: StringSet<'a>,
    pub exact_match: Value<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRow<'a> {
    #[serde(borrow = "'a")]
    pub task_type: ValueString<'a>,
    pub task_status: ValueString<'a>,
    pub object_id: ValueString<'a>,
    pub object_type: ValueString<'a>,
    pub task_id: ValueNumber,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagRow<'a> {
    #[serde(borrow = "'a")]
    pub tag_key: ValueString<'a>,
    pub tag_value: ValueString<'a>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterRow<'a> {
    #[serde(borrow = "'a")]
    pub cluster_id: ValueString<'a>,
    pub cluster_name: ValueString<'a>,
    pub region: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub physical_zone: ValueString<'a>,
    pub status: ValueString<'a>,
    pub status_desc: ValueString<'a>,
    pub update_time: ValueString<'a>,
    pub create_time: ValueString<'a>,
    pub db_version: ValueString<'a>,
    pub db_type: ValueString<'a>,
    pub db_mode: ValueString<'a>,
    pub cynos_version: ValueString<'a>,
    pub instance_num: ValueNumber,
    pub uin: ValueString<'a>,
    pub app_id: ValueNumber,
    pub pay_mode: ValueNumber,
    pub period_end_time: ValueString<'a>,
    pub vip: ValueString<'a>,
    pub vport: ValueNumber,
    pub project_id: ValueNumber,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub storage_limit: ValueNumber,
    pub renew_flag: ValueNumber,
    pub processing_task: ValueString<'a>,
    pub serverless_status: ValueString<'a>,
    pub storage: ValueNumber,
    pub storage_id: ValueString<'a>,
    pub storage_pay_mode: ValueNumber,
    pub min_storage_size: ValueNumber,
    pub max_storage_size: ValueNumber,
    pub master_zone: ValueString<'a>,
    pub has_slave_zone: ValueString<'a>,
    pub slave_zones: ValueList<ValueString<'a>>,
    pub business_type: ValueString<'a>,
    pub is_freeze: ValueString<'a>,
    pub order_source: ValueString<'a>,
    pub tasks: ValueList<Value<TaskRow<'a>>>,
    pub resource_tags: ValueList<Value<TagRow<'a>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CynosdbClustersState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub db_type: ValueString<'a>,
    pub order_by: ValueString<'a>,
    pub order_by_type: ValueString<'a>,
    pub filters: ValueList<Value<FilterState<'a>>>,
    pub result_output_file: ValueString<'a>,
    pub total_count: ValueNumber,
    pub cluster_set: ValueList<Value<ClusterRow<'a>>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CynosdbClusters;

impl WithSchema for CynosdbClusters {
    fn schema() -> Schema {
        let filters = block(
            "Filter conditions.",
            map! {
                "names" => string_set(Optional, "Search fields, such as `InstanceId`, `ClusterId` or `Vip`."),
                "values" => string_set(Optional, "Search strings."),
                "exact_match" => boolean(Optional, "Whether to use exact match."),
                "name" => string(Optional, "Search field."),
                "operator" => string(Optional, "Operator."),
            },
        );

        schema(
            "Use this data source to query detailed information of cynosdb clusters.",
            map! {
                "id" => string(Computed, "Hash of the ids of the listed clusters."),
                "db_type" => string(Optional, "Engine type: `MYSQL` or `POSTGRESQL`."),
                "order_by" => string(Optional, "Sort field, such as `CreateTime` or `PeriodEndTime`."),
                "order_by_type" => string(Optional, "Sort type: `ASC` or `DESC`."),
                "result_output_file" => string(Optional, "Used to save results."),
                "total_count" => number(Computed, "Number of clusters."),
                "cluster_set" => object_list("Cluster list.", map! {
                    "cluster_id" => string(Computed, "Cluster ID."),
                    "cluster_name" => string(Computed, "Cluster name."),
                    "region" => string(Computed, "Region."),
                    "zone" => string(Computed, "AZ."),
                    "physical_zone" => string(Computed, "Physical AZ."),
                    "status" => string(Computed, "Status."),
                    "status_desc" => string(Computed, "Status description."),
                    "update_time" => string(Computed, "Update time."),
                    "create_time" => string(Computed, "Creation time."),
                    "db_version" => string(Computed, "Database version."),
                    "db_type" => string(Computed, "Database type."),
                    "db_mode" => string(Computed, "Database mode: `NORMAL` or `SERVERLESS`."),
                    "cynos_version" => string(Computed, "Kernel version."),
                    "instance_num" => number(Computed, "Number of instances."),
                    "uin" => string(Computed, "User `uin`."),
                    "app_id" => number(Computed, "User `appid`."),
                    "pay_mode" => number(Computed, "Billing mode."),
                    "period_end_time" => string(Computed, "Expiration time."),
                    "vip" => string(Computed, "Cluster read-write VIP."),
                    "vport" => number(Computed, "Cluster read-write vport."),
                    "project_id" => number(Computed, "Project ID."),
                    "vpc_id" => string(Computed, "VPC ID."),
                    "subnet_id" => string(Computed, "Subnet ID."),
                    "storage_limit" => number(Computed, "Storage capacity."),
                    "renew_flag" => number(Computed, "Renewal flag."),
                    "processing_task" => string(Computed, "Task in progress."),
                    "serverless_status" => string(Computed, "Serverless cluster status: `resume` or `pause`."),
                    "storage" => number(Computed, "Prepaid cluster storage capacity."),
                    "storage_id" => string(Computed, "Cluster storage ID used in prepaid storage modification."),
                    "storage_pay_mode" => number(Computed, "Cluster storage billing mode. 0: pay-as-you-go, 1: monthly subscription."),
                    "min_storage_size" => number(Computed, "The minimum storage corresponding to the compute specification of the cluster."),
                    "max_storage_size" => number(Computed, "The maximum storage corresponding to the compute specification of the cluster."),
                    "master_zone" => string(Computed, "Primary AZ."),
                    "has_slave_zone" => string(Computed, "Whether there is a secondary AZ."),
                    "slave_zones" => string_list(Computed, "Secondary AZ."),
                    "business_type" => string(Computed, "Business type."),
                    "is_freeze" => string(Computed, "Whether to freeze."),
                    "order_source" => string(Computed, "Order source."),
                    "tasks" => object_list("Task list.", map! {
                        "task_id" => number(Computed, "Task auto-increment ID."),
                        "task_type" => string(Computed, "Task type."),
                        "task_status" => string(Computed, "Task status."),
                        "object_id" => string(Computed, "Task ID (cluster ID or instance ID)."),
                        "object_type" => string(Computed, "Task type."),
                    }),
                    "resource_tags" => object_list("The tag information bound to the cluster.", map! {
                        "tag_key" => string(Computed, "The tag key."),
                        "tag_value" => string(Computed, "The value of tag."),
                    }),
                }),
            },
            map! {
                "filters" => NestedBlock::List(filters),
            },
        )
    }
}

fn query(config: &CynosdbClustersState<'_>) -> ClusterQuery {
    ClusterQuery {
        db_type: get_str(&config.db_type).map(str::to_owned),
        order_by: get_str(&config.order_by).map(str::to_owned),
        order_by_type: get_str(&config.order_by_type).map(str::to_owned),
        filters: config
            .filters
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(|filter| QueryFilter {
                names: get_str_set(&filter.names),
                values: get_str_set(&filter.values),
                exact_match: filter.exact_match.as_ref_option().copied(),
                name: get_str(&filter.name).map(str::to_owned),
                operator: get_str(&filter.operator).map(str::to_owned),
            })
            .collect(),
    }
}

fn cluster_row<'a>(cluster: &CynosdbCluster) -> ClusterRow<'a> {
    ClusterRow {
        cluster_id: str_value(&cluster.cluster_id),
        cluster_name: str_value(&cluster.cluster_name),
        region: str_value(&cluster.region),
        zone: str_value(&cluster.zone),
        physical_zone: str_value(&cluster.physical_zone),
        status: str_value(&cluster.status),
        status_desc: str_value(&cluster.status_desc),
        update_time: str_value(&cluster.update_time),
        create_time: str_value(&cluster.create_time),
        db_version: str_value(&cluster.db_version),
        db_type: str_value(&cluster.db_type),
        db_mode: str_value(&cluster.db_mode),
        cynos_version: str_value(&cluster.cynos_version),
        instance_num: Value::Value(cluster.instance_num),
        uin: str_value(&cluster.uin),
        app_id: Value::Value(cluster.app_id),
        pay_mode: Value::Value(cluster.pay_mode),
        period_end_time: str_value(&cluster.period_end_time),
        vip: str_value(&cluster.vip),
        vport: Value::Value(cluster.vport),
        project_id: Value::Value(cluster.project_id),
        vpc_id: str_value(&cluster.vpc_id),
        subnet_id: str_value(&cluster.subnet_id),
        storage_limit: Value::Value(cluster.storage_limit),
        renew_flag: Value::Value(cluster.renew_flag),
        processing_task: str_value(&cluster.processing_task),
        serverless_status: str_value(&cluster.serverless_status),
        storage: Value::Value(cluster.storage),
        storage_id: str_value(&cluster.storage_id),
        storage_pay_mode: Value::Value(cluster.storage_pay_mode),
        min_storage_size: Value::Value(cluster.min_storage_size),
        max_storage_size: Value::Value(cluster.max_storage_size),
        master_zone: str_value(&cluster.master_zone),
        has_slave_zone: str_value(&cluster.has_slave_zone),
        slave_zones: str_list_value(cluster.slave_zones.iter().cloned()),
        business_type: str_value(&cluster.business_type),
        is_freeze: str_value(&cluster.is_freeze),
        order_source: str_value(&cluster.order_source),
        tasks: Value::Value(
            cluster
                .tasks
                .iter()
                .map(|task| {
                    Value::Value(TaskRow {
                        task_type: str_value(&task.task_type),
                        task_status: str_value(&task.task_status),
                        object_id: str_value(&task.object_id),
                        object_type: str_value(&task.object_type),
                        task_id: Value::Value(task.task_id),
                    })
                })
                .collect(),
        ),
        resource_tags: Value::Value(
            cluster
                .resource_tags
                .iter()
                .map(|tag| {
                    Value::Value(TagRow {
                        tag_key: str_value(&tag.tag_key),
                        tag_value: str_value(&tag.tag_value),
                    })
                })
                .collect(),
        ),
    }
}

#[async_trait]
impl DataSourceBinding for CynosdbClusters {
    const TYPE_NAME: &'static str = "tencentcloud_cynosdb_clusters";

    type State<'a> = CynosdbClustersState<'a>;

    fn validate(config: &Self::State<'_>, diags: &mut Diagnostics) {
        if let Some(order) = get_str(&config.order_by_type) {
            if order != "ASC" && order != "DESC" {
                diags.error(
                    "Invalid order_by_type",
                    format!("order_by_type must be `ASC` or `DESC`, got `{order}`"),
                    AttributePath::new("order_by_type"),
                );
            }
        }
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut config: Self::State<'a>,
    ) -> Result<Lookup<Self::State<'a>>> {
        let service = CynosdbService::new(client);
        let query = query(&config);
        let query = &query;

        let clusters = paginate(PAGE_SIZE, client.timeouts().read, |offset| async move {
            service
                .describe_clusters(query, PAGE_SIZE, offset)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        tracing::debug!(count = clusters.len(), "cynosdb clusters listed");

        config.total_count = Value::Value(clusters.len() as i64);
        config.cluster_set = Value::Value(clusters.iter().map(|cluster| Value::Value(cluster_row(cluster))).collect());
        Ok(Lookup {
            ids: clusters.iter().map(|cluster| cluster.cluster_id.clone()).collect(),
            result: serde_json::to_value(&clusters)?,
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
