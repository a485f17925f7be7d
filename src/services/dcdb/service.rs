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

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::client::TencentCloudClient;
use crate::common::{retry, retry_error, StateChangeConf};
use crate::connection::{Endpoint, SdkError};
use crate::services::{Acknowledged, DbSecurityGroupService};

pub const DCDB: Endpoint = Endpoint {
    service: "dcdb",
    version: "2018-04-11",
};

/// Product selector of the security group actions
const PRODUCT: &str = "dcdb";

/// Progress of an asynchronous DCDB flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Success,
    Failed,
    Running,
    Unknown(i64),
}

impl From<i64> for FlowStatus {
    fn from(status: i64) -> Self {
        match status {
            0 => FlowStatus::Success,
            1 => FlowStatus::Failed,
            2 => FlowStatus::Running,
            other => FlowStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDCDBInstancesRequest<'a> {
    instance_ids: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeDCDBInstancesResponse {
    instances: Option<Vec<DcdbInstance>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DcdbInstance {
    pub instance_id: String,
    pub instance_name: Option<String>,
    pub status: Option<i64>,
    /// 0: no nearest access, 1: nearest access
    pub rs_access_strategy: Option<i64>,
    /// 1 once the public network access is open
    pub wan_status: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyRealServerAccessStrategyRequest<'a> {
    instance_id: &'a str,
    rs_access_strategy: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExtranetAccessRequest<'a> {
    instance_id: &'a str,
    ipv6_flag: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FlowResponse {
    flow_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowRequest {
    flow_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeFlowResponse {
    status: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct DcdbService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> DcdbService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    pub fn security_groups(&self) -> DbSecurityGroupService<'c> {
        DbSecurityGroupService::new(self.client, DCDB, PRODUCT)
    }

    pub async fn describe_instance(&self, instance_id: &str) -> Result<Option<DcdbInstance>, SdkError> {
        let response: DescribeDCDBInstancesResponse = self
            .client
            .call(
                DCDB,
                "DescribeDCDBInstances",
                &DescribeDCDBInstancesRequest {
                    instance_ids: [instance_id],
                },
            )
            .await?;
        Ok(response
            .instances
            .unwrap_or_default()
            .into_iter()
            .find(|instance| instance.instance_id == instance_id))
    }

    pub async fn modify_real_server_access_strategy(
        &self,
        instance_id: &str,
        rs_access_strategy: i64,
    ) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                DCDB,
                "ModifyRealServerAccessStrategy",
                &ModifyRealServerAccessStrategyRequest {
                    instance_id,
                    rs_access_strategy,
                },
            )
            .await?;
        Ok(())
    }

    /// Open or close the public network access, returning the flow to wait for
    pub async fn set_extranet_access(
        &self,
        instance_id: &str,
        ipv6_flag: i64,
        enable: bool,
    ) -> Result<Option<i64>, SdkError> {
        let action = if enable {
            "OpenDBExtranetAccess"
        } else {
            "CloseDBExtranetAccess"
        };
        let response: FlowResponse = self
            .client
            .call(
                DCDB,
                action,
                &ExtranetAccessRequest {
                    instance_id,
                    ipv6_flag,
                },
            )
            .await?;
        Ok(response.flow_id)
    }

    pub async fn describe_flow(&self, flow_id: i64) -> Result<FlowStatus, SdkError> {
        let response: DescribeFlowResponse = self
            .client
            .call(DCDB, "DescribeFlow", &DescribeFlowRequest { flow_id })
            .await?;
        Ok(response.status.into())
    }

    /// Poll `DescribeFlow` until the flow succeeds; flow `0` has nothing to wait for
    pub async fn wait_flow(&self, flow_id: i64, timeout: Duration) -> Result<()> {
        if flow_id == 0 {
            return Ok(());
        }
        let service = *self;
        StateChangeConf::new(format!("dcdb flow {flow_id}"), [FlowStatus::Success], timeout)
            .fail_on([FlowStatus::Failed])
            .wait(|| async move {
                let status = retry(timeout, || async move {
                    service
                        .describe_flow(flow_id)
                        .await
                        .map_err(|err| retry_error(err, &[]))
                })
                .await?;
                Ok(((), status))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::mock_client;

    #[test]
    fn flow_status_codes() {
        assert_eq!(FlowStatus::from(0), FlowStatus::Success);
        assert_eq!(FlowStatus::from(1), FlowStatus::Failed);
        assert_eq!(FlowStatus::from(2), FlowStatus::Running);
        assert_eq!(FlowStatus::from(7), FlowStatus::Unknown(7));
    }

    #[tokio::test(start_paused = true)]
    async fn flow_is_polled_until_success() {
        let (client, mock) = mock_client();
        mock.respond("DescribeFlow", json!({ "Status": 2 }));
        mock.respond("DescribeFlow", json!({ "Status": 2 }));
        mock.respond("DescribeFlow", json!({ "Status": 0 }));

        DcdbService::new(&client)
            .wait_flow(42, Duration::from_secs(60))
            .await
            .unwrap();

        let flows = mock.payloads("DescribeFlow");
        assert_eq!(flows.len(), 3);
        assert_eq!(flows[0], json!({ "FlowId": 42 }));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flow_is_an_error() {
        let (client, mock) = mock_client();
        mock.respond("DescribeFlow", json!({ "Status": 1 }));

        let err = DcdbService::new(&client)
            .wait_flow(42, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dcdb flow 42 failed"));
    }

    #[tokio::test]
    async fn zero_flow_needs_no_poll() {
        let (client, mock) = mock_client();
        DcdbService::new(&client)
            .wait_flow(0, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn extranet_switch_picks_the_action() {
        let (client, mock) = mock_client();
        mock.respond("OpenDBExtranetAccess", json!({ "FlowId": 9 }));
        mock.respond("CloseDBExtranetAccess", json!({}));
        let service = DcdbService::new(&client);

        assert_eq!(service.set_extranet_access("dcdbt-1", 1, true).await.unwrap(), Some(9));
        assert_eq!(service.set_extranet_access("dcdbt-1", 0, false).await.unwrap(), None);
        assert_eq!(
            mock.payloads("OpenDBExtranetAccess")[0],
            json!({ "InstanceId": "dcdbt-1", "Ipv6Flag": 1 })
        );
    }
}
