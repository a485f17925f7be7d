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

use serde::{Deserialize, Serialize};

use crate::client::TencentCloudClient;
use crate::connection::{Endpoint, SdkError};
use crate::services::{Acknowledged, DbSecurityGroupService};

pub const REDIS: Endpoint = Endpoint {
    service: "redis",
    version: "2018-04-12",
};

pub const CHARGE_TYPE_POSTPAID: &str = "POSTPAID";
pub const CHARGE_TYPE_PREPAID: &str = "PREPAID";

/// Billing mode as sent to the API
pub fn charge_type_id(charge_type: &str) -> Option<i64> {
    match charge_type {
        CHARGE_TYPE_POSTPAID => Some(0),
        CHARGE_TYPE_PREPAID => Some(1),
        _ => None,
    }
}

pub fn charge_type_name(billing_mode: i64) -> &'static str {
    match billing_mode {
        1 => CHARGE_TYPE_PREPAID,
        _ => CHARGE_TYPE_POSTPAID,
    }
}

/// Prepaid periods accepted by the API, in months
pub const PREPAID_PERIODS: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 24, 36];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisStatus {
    Init,
    Processing,
    Online,
    Isolated,
    ToDelete,
    Other(i64),
}

impl From<i64> for RedisStatus {
    fn from(status: i64) -> Self {
        match status {
            0 => RedisStatus::Init,
            1 => RedisStatus::Processing,
            2 => RedisStatus::Online,
            -2 => RedisStatus::Isolated,
            -3 => RedisStatus::ToDelete,
            other => RedisStatus::Other(other),
        }
    }
}

impl RedisStatus {
    pub fn name(self) -> &'static str {
        match self {
            RedisStatus::Init => "init",
            RedisStatus::Processing => "processing",
            RedisStatus::Online => "online",
            RedisStatus::Isolated => "isolate",
            RedisStatus::ToDelete => "todelete",
            RedisStatus::Other(_) => "unknown",
        }
    }

    /// Isolated and to-be-deleted instances are gone from the user's point of view
    pub fn is_gone(self) -> bool {
        matches!(self, RedisStatus::Isolated | RedisStatus::ToDelete)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, RedisStatus::Init | RedisStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedisTaskStatus {
    Preparing,
    Running,
    Succeed,
    Failed,
    Error,
    #[serde(other)]
    Unknown,
}

/// Order progress reported by `DescribeInstanceDealDetail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStatus {
    Pending,
    Delivered,
    Failed(i64),
}

impl From<i64> for DealStatus {
    fn from(status: i64) -> Self {
        match status {
            3 => DealStatus::Delivered,
            0..=2 | 11 => DealStatus::Pending,
            other => DealStatus::Failed(other),
        }
    }
}

/// Product name of each instance type
pub fn type_name(type_id: i64) -> &'static str {
    match type_id {
        2 => "master_slave_redis",
        3 => "master_slave_ckv",
        4 => "cluster_ckv",
        5 => "standalone_redis",
        6 => "master_slave_redis4.0",
        7 => "cluster_redis4.0",
        8 => "master_slave_redis5.0",
        9 => "cluster_redis5.0",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RedisNodeInfo {
    /// 0 for the master, 1 for a replica
    pub node_type: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    pub zone_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstanceTag {
    pub tag_key: String,
    pub tag_value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstanceSet {
    pub instance_id: String,
    pub instance_name: String,
    pub project_id: i64,
    pub zone_id: i64,
    pub status: i64,
    pub wan_ip: String,
    pub port: i64,
    pub createtime: String,
    #[serde(rename = "Type")]
    pub type_id: i64,
    pub uniq_vpc_id: String,
    pub uniq_subnet_id: String,
    pub billing_mode: i64,
    pub redis_shard_size: i64,
    pub redis_shard_num: i64,
    pub redis_replicas_num: i64,
    pub no_auth: bool,
    pub node_set: Option<Vec<RedisNodeInfo>>,
    pub instance_tags: Option<Vec<InstanceTag>>,
}

impl InstanceSet {
    pub fn status(&self) -> RedisStatus {
        self.status.into()
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstancesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<i64>>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribeInstancesResponse {
    pub total_count: i64,
    pub instance_set: Option<Vec<InstanceSet>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstancesRequest {
    pub type_id: i64,
    pub mem_size: i64,
    pub goods_num: i64,
    pub period: i64,
    pub billing_mode: i64,
    pub zone_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_id_list: Option<Vec<String>>,
    #[serde(rename = "VPort", skip_serializing_if = "Option::is_none")]
    pub vport: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_shard_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_replicas_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_set: Option<Vec<RedisNodeInfo>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateInstancesResponse {
    pub deal_id: String,
    pub instance_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstanceDealDetailRequest<'a> {
    deal_ids: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeInstanceDealDetailResponse {
    deal_details: Vec<TradeDealDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TradeDealDetail {
    pub deal_id: String,
    pub status: i64,
    pub instance_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyInstanceRequest<'a> {
    operation: &'a str,
    instance_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpgradeInstanceRequest {
    pub instance_id: String,
    pub mem_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_shard_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_replicas_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_set: Option<Vec<RedisNodeInfo>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DealResponse {
    deal_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct TaskResponse {
    task_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceRequest<'a> {
    instance_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResetPasswordRequest<'a> {
    instance_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTaskInfoRequest {
    task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTaskInfoResponse {
    status: RedisTaskStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyAutoBackupConfigRequest<'a> {
    instance_id: &'a str,
    week_days: &'a [String],
    time_period: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AutoBackupConfig {
    pub week_days: Option<Vec<String>>,
    pub time_period: String,
}

/// Redis API calls, one method per action
#[derive(Debug, Clone, Copy)]
pub struct RedisService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> RedisService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    pub fn security_groups(&self) -> DbSecurityGroupService<'c> {
        DbSecurityGroupService::new(self.client, REDIS, "redis")
    }

    pub async fn describe_instances(
        &self,
        request: &DescribeInstancesRequest,
    ) -> Result<DescribeInstancesResponse, SdkError> {
        self.client.call(REDIS, "DescribeInstances", request).await
    }

    /// The instance with this id, if any
    pub async fn describe_instance(&self, instance_id: &str) -> Result<Option<InstanceSet>, SdkError> {
        let request = DescribeInstancesRequest {
            instance_id: Some(instance_id.to_owned()),
            limit: 1,
            ..Default::default()
        };
        let response = self.describe_instances(&request).await?;
        Ok(response
            .instance_set
            .unwrap_or_default()
            .into_iter()
            .find(|instance| instance.instance_id == instance_id))
    }

    pub async fn create_instances(
        &self,
        request: &CreateInstancesRequest,
    ) -> Result<CreateInstancesResponse, SdkError> {
        self.client.call(REDIS, "CreateInstances", request).await
    }

    pub async fn describe_instance_deal_detail(
        &self,
        deal_id: &str,
    ) -> Result<Option<TradeDealDetail>, SdkError> {
        let response: DescribeInstanceDealDetailResponse = self
            .client
            .call(
                REDIS,
                "DescribeInstanceDealDetail",
                &DescribeInstanceDealDetailRequest { deal_ids: [deal_id] },
            )
            .await?;
        Ok(response.deal_details.into_iter().next())
    }

    pub async fn rename_instance(&self, instance_id: &str, name: &str) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                REDIS,
                "ModifyInstance",
                &ModifyInstanceRequest {
                    operation: "rename",
                    instance_id,
                    instance_name: Some(name),
                    project_id: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn modify_project(&self, instance_id: &str, project_id: i64) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                REDIS,
                "ModifyInstance",
                &ModifyInstanceRequest {
                    operation: "modifyProject",
                    instance_id,
                    instance_name: None,
                    project_id: Some(project_id),
                },
            )
            .await?;
        Ok(())
    }

    /// Returns the deal id of the upgrade order
    pub async fn upgrade_instance(&self, request: &UpgradeInstanceRequest) -> Result<String, SdkError> {
        let response: DealResponse = self.client.call(REDIS, "UpgradeInstance", request).await?;
        Ok(response.deal_id)
    }

    /// Returns the id of the password reset task
    pub async fn reset_password(&self, instance_id: &str, password: &str) -> Result<i64, SdkError> {
        let response: TaskResponse = self
            .client
            .call(
                REDIS,
                "ResetPassword",
                &ResetPasswordRequest {
                    instance_id,
                    password,
                },
            )
            .await?;
        Ok(response.task_id)
    }

    pub async fn describe_task_info(&self, task_id: i64) -> Result<RedisTaskStatus, SdkError> {
        let response: DescribeTaskInfoResponse = self
            .client
            .call(REDIS, "DescribeTaskInfo", &DescribeTaskInfoRequest { task_id })
            .await?;
        Ok(response.status)
    }

    pub async fn destroy_postpaid_instance(&self, instance_id: &str) -> Result<i64, SdkError> {
        let response: TaskResponse = self
            .client
            .call(REDIS, "DestroyPostpaidInstance", &InstanceRequest { instance_id })
            .await?;
        Ok(response.task_id)
    }

    pub async fn destroy_prepaid_instance(&self, instance_id: &str) -> Result<String, SdkError> {
        let response: DealResponse = self
            .client
            .call(REDIS, "DestroyPrepaidInstance", &InstanceRequest { instance_id })
            .await?;
        Ok(response.deal_id)
    }

    /// Remove an isolated instance from the recycle bin
    pub async fn clean_up_instance(&self, instance_id: &str) -> Result<i64, SdkError> {
        let response: TaskResponse = self
            .client
            .call(REDIS, "CleanUpInstance", &InstanceRequest { instance_id })
            .await?;
        Ok(response.task_id)
    }

    pub async fn modify_auto_backup_config(
        &self,
        instance_id: &str,
        week_days: &[String],
        time_period: &str,
    ) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                REDIS,
                "ModifyAutoBackupConfig",
                &ModifyAutoBackupConfigRequest {
                    instance_id,
                    week_days,
                    time_period,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn describe_auto_backup_config(&self, instance_id: &str) -> Result<AutoBackupConfig, SdkError> {
        self.client
            .call(REDIS, "DescribeAutoBackupConfig", &InstanceRequest { instance_id })
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(RedisStatus::from(2), RedisStatus::Online);
        assert_eq!(RedisStatus::from(-2).name(), "isolate");
        assert_eq!(RedisStatus::from(-3).name(), "todelete");
        assert_eq!(RedisStatus::from(7).name(), "unknown");
        assert!(RedisStatus::from(-3).is_gone());
        assert!(RedisStatus::from(1).is_busy());
    }

    #[test]
    fn task_status_tolerates_new_values() {
        let status: RedisTaskStatus = serde_json::from_value(json!("succeed")).unwrap();
        assert_eq!(status, RedisTaskStatus::Succeed);
        let status: RedisTaskStatus = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(status, RedisTaskStatus::Unknown);
    }

    #[test]
    fn deal_status_codes() {
        assert_eq!(DealStatus::from(3), DealStatus::Delivered);
        assert_eq!(DealStatus::from(1), DealStatus::Pending);
        assert_eq!(DealStatus::from(11), DealStatus::Pending);
        assert_eq!(DealStatus::from(4), DealStatus::Failed(4));
    }

    #[test]
    fn charge_types() {
        assert_eq!(charge_type_id("PREPAID"), Some(1));
        assert_eq!(charge_type_id("monthly"), None);
        assert_eq!(charge_type_name(0), "POSTPAID");
    }

    #[test]
    fn unset_create_fields_are_not_sent() {
        let request = CreateInstancesRequest {
            type_id: 2,
            mem_size: 1024,
            goods_num: 1,
            period: 1,
            zone_id: 100003,
            ..Default::default()
        };
        let body = serde_json::to_value(&request).unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["BillingMode", "GoodsNum", "MemSize", "Period", "TypeId", "ZoneId"]
        );
    }
}
