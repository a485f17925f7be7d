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

use super::Acknowledged;
use crate::client::TencentCloudClient;
use crate::connection::{Endpoint, SdkError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AssociateSecurityGroupsRequest<'a> {
    product: &'a str,
    security_group_id: &'a str,
    instance_ids: [&'a str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DisassociateSecurityGroupsRequest<'a> {
    product: &'a str,
    security_group_id: &'a str,
    instance_ids: [&'a str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDBSecurityGroupsRequest<'a> {
    product: &'a str,
    instance_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeDBSecurityGroupsResponse {
    groups: Option<Vec<SecurityGroup>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SecurityGroup {
    security_group_id: String,
}

/// Security group bindings of database products, served by several APIs
/// (`redis`, `dcdb`) with the same actions and a `Product` selector
#[derive(Debug, Clone, Copy)]
pub struct DbSecurityGroupService<'c> {
    client: &'c TencentCloudClient,
    endpoint: Endpoint,
    product: &'c str,
}

impl<'c> DbSecurityGroupService<'c> {
    pub fn new(client: &'c TencentCloudClient, endpoint: Endpoint, product: &'c str) -> Self {
        Self {
            client,
            endpoint,
            product,
        }
    }

    pub async fn associate(&self, instance_id: &str, security_group_id: &str) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                self.endpoint,
                "AssociateSecurityGroups",
                &AssociateSecurityGroupsRequest {
                    product: self.product,
                    security_group_id,
                    instance_ids: [instance_id],
                },
            )
            .await?;
        Ok(())
    }

    /// Ids of the security groups bound to `instance_id`
    pub async fn describe(&self, instance_id: &str) -> Result<Vec<String>, SdkError> {
        let response: DescribeDBSecurityGroupsResponse = self
            .client
            .call(
                self.endpoint,
                "DescribeDBSecurityGroups",
                &DescribeDBSecurityGroupsRequest {
                    product: self.product,
                    instance_id,
                },
            )
            .await?;
        Ok(response
            .groups
            .unwrap_or_default()
            .into_iter()
            .map(|group| group.security_group_id)
            .collect())
    }

    pub async fn disassociate(&self, instance_id: &str, security_group_id: &str) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                self.endpoint,
                "DisassociateSecurityGroups",
                &DisassociateSecurityGroupsRequest {
                    product: self.product,
                    security_group_id,
                    instance_ids: [instance_id],
                },
            )
            .await?;
        Ok(())
    }
}
