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
use crate::connection::{null_as_default, Endpoint, SdkError};

pub const CYNOSDB: Endpoint = Endpoint {
    service: "cynosdb",
    version: "2019-01-07",
};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryFilter {
    pub names: Vec<String>,
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

/// Search criteria of `DescribeClusters`, shared by every page
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeClustersRequest<'a> {
    #[serde(flatten)]
    query: &'a ClusterQuery,
    limit: u64,
    offset: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeClustersResponse {
    cluster_set: Option<Vec<CynosdbCluster>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct ObjectTask {
    pub task_id: i64,
    pub task_type: String,
    pub task_status: String,
    pub object_id: String,
    pub object_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct ResourceTag {
    pub tag_key: String,
    pub tag_value: String,
}

/// One cluster of `DescribeClusters`; serializes with the attribute names.
/// Members the API may leave `null` decode as their default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct CynosdbCluster {
    pub cluster_id: String,
    pub cluster_name: String,
    pub region: String,
    pub zone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub physical_zone: String,
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status_desc: String,
    pub update_time: String,
    pub create_time: String,
    pub db_version: String,
    pub db_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub db_mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cynos_version: String,
    pub instance_num: i64,
    pub uin: String,
    pub app_id: i64,
    pub pay_mode: i64,
    pub period_end_time: String,
    pub vip: String,
    pub vport: i64,
    #[serde(rename(deserialize = "ProjectID"))]
    pub project_id: i64,
    pub vpc_id: String,
    pub subnet_id: String,
    pub storage_limit: i64,
    pub renew_flag: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub processing_task: String,
    #[serde(deserialize_with = "null_as_default")]
    pub serverless_status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub storage_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage_pay_mode: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub min_storage_size: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_storage_size: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub master_zone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub has_slave_zone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slave_zones: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub business_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_freeze: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tasks: Vec<ObjectTask>,
    #[serde(deserialize_with = "null_as_default")]
    pub resource_tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, Copy)]
pub struct CynosdbService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> CynosdbService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    pub async fn describe_clusters(
        &self,
        query: &ClusterQuery,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<CynosdbCluster>, SdkError> {
        let response: DescribeClustersResponse = self
            .client
            .call(
                CYNOSDB,
                "DescribeClusters",
                &DescribeClustersRequest {
                    query,
                    limit,
                    offset,
                },
            )
            .await?;
        Ok(response.cluster_set.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::mock_client;

    #[tokio::test]
    async fn query_is_flattened_into_each_page() {
        let (client, mock) = mock_client();
        mock.respond(
            "DescribeClusters",
            json!({ "TotalCount": 1, "ClusterSet": [{ "ClusterId": "cynosdbmysql-1", "ProjectID": 3, "Vport": 3306, "SlaveZones": null, "Tasks": null }] }),
        );
        let query = ClusterQuery {
            db_type: Some("MYSQL".to_owned()),
            filters: vec![QueryFilter {
                names: vec!["ClusterId".to_owned()],
                values: vec!["cynosdbmysql-1".to_owned()],
                exact_match: Some(true),
                ..Default::default()
            }],
            ..Default::default()
        };

        let clusters = CynosdbService::new(&client)
            .describe_clusters(&query, 100, 200)
            .await
            .unwrap();

        assert_eq!(clusters[0].project_id, 3);
        assert_eq!(clusters[0].vport, 3306);
        assert!(clusters[0].slave_zones.is_empty());
        assert_eq!(
            mock.payloads("DescribeClusters")[0],
            json!({
                "DbType": "MYSQL",
                "Filters": [{ "Names": ["ClusterId"], "Values": ["cynosdbmysql-1"], "ExactMatch": true }],
                "Limit": 100,
                "Offset": 200
            })
        );
    }

    #[test]
    fn cluster_serializes_with_attribute_names() {
        let cluster: CynosdbCluster = serde_json::from_value(json!({
            "ClusterId": "cynosdbmysql-1",
            "ResourceTags": [{ "TagKey": "team", "TagValue": "db" }]
        }))
        .unwrap();

        let dumped = serde_json::to_value(&cluster).unwrap();
        assert_eq!(dumped["cluster_id"], "cynosdbmysql-1");
        assert_eq!(dumped["resource_tags"][0]["tag_key"], "team");
    }
}
