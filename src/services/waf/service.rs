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
use crate::services::Acknowledged;

pub const WAF: Endpoint = Endpoint {
    service: "waf",
    version: "2018-01-25",
};

/// Matching condition of a white rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Strategy {
    pub field: String,
    pub compare_func: String,
    pub content: String,
    pub arg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_not_sensitive: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TimedJob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CronJob {
    pub days: Vec<i64>,
    pub w_days: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Schedule of a rule whose `JobType` is `TimedJob` or `CronJob`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobDateTime {
    pub timed: Vec<TimedJob>,
    pub cron: Vec<CronJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_t_zone: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddCustomWhiteRuleRequest {
    pub name: String,
    pub sort_id: String,
    pub expire_time: String,
    pub strategies: Vec<Strategy>,
    pub domain: String,
    pub bypass: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_date_time: Option<JobDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_op: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct AddCustomWhiteRuleResponse {
    rule_id: Option<u64>,
}

/// Same content as the creation, with numeric sort id and expiry
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyCustomWhiteRuleRequest {
    pub domain: String,
    pub rule_id: u64,
    pub rule_name: String,
    pub bypass: String,
    pub sort_id: u64,
    pub expire_time: u64,
    pub strategies: Vec<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_date_time: Option<JobDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_op: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyCustomWhiteRuleStatusRequest<'a> {
    domain: &'a str,
    rule_id: u64,
    status: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WhiteRuleFilter<'a> {
    name: &'a str,
    values: [&'a str; 1],
    exact_match: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCustomWhiteRuleRequest<'a> {
    domain: &'a str,
    offset: u64,
    limit: u64,
    filters: [WhiteRuleFilter<'a>; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeCustomWhiteRuleResponse {
    rule_list: Option<Vec<WhiteRule>>,
}

/// White rule as listed by `DescribeCustomWhiteRule`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WhiteRule {
    pub rule_id: Option<String>,
    pub name: Option<String>,
    pub sort_id: Option<String>,
    pub expire_time: Option<String>,
    pub strategies: Option<Vec<Strategy>>,
    pub bypass: Option<String>,
    pub status: Option<String>,
    pub job_type: Option<String>,
    pub job_date_time: Option<JobDateTime>,
    pub logical_op: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteCustomWhiteRuleRequest<'a> {
    domain: &'a str,
    rule_id: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct WafService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> WafService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    /// Create a white rule and return its id
    pub async fn add_custom_white_rule(
        &self,
        request: &AddCustomWhiteRuleRequest,
    ) -> Result<Option<u64>, SdkError> {
        let response: AddCustomWhiteRuleResponse =
            self.client.call(WAF, "AddCustomWhiteRule", request).await?;
        Ok(response.rule_id)
    }

    pub async fn modify_custom_white_rule(&self, request: &ModifyCustomWhiteRuleRequest) -> Result<(), SdkError> {
        let _: Acknowledged = self.client.call(WAF, "ModifyCustomWhiteRule", request).await?;
        Ok(())
    }

    pub async fn modify_custom_white_rule_status(
        &self,
        domain: &str,
        rule_id: u64,
        enabled: bool,
    ) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                WAF,
                "ModifyCustomWhiteRuleStatus",
                &ModifyCustomWhiteRuleStatusRequest {
                    domain,
                    rule_id,
                    status: enabled.into(),
                },
            )
            .await?;
        Ok(())
    }

    /// The rule `rule_id` of `domain`, if it still exists
    pub async fn describe_custom_white_rule(
        &self,
        domain: &str,
        rule_id: &str,
    ) -> Result<Option<WhiteRule>, SdkError> {
        let response: DescribeCustomWhiteRuleResponse = self
            .client
            .call(
                WAF,
                "DescribeCustomWhiteRule",
                &DescribeCustomWhiteRuleRequest {
                    domain,
                    offset: 0,
                    limit: 20,
                    filters: [WhiteRuleFilter {
                        name: "RuleId",
                        values: [rule_id],
                        exact_match: true,
                    }],
                },
            )
            .await?;
        Ok(response.rule_list.unwrap_or_default().into_iter().next())
    }

    pub async fn delete_custom_white_rule(&self, domain: &str, rule_id: u64) -> Result<(), SdkError> {
        let _: Acknowledged = self
            .client
            .call(
                WAF,
                "DeleteCustomWhiteRule",
                &DeleteCustomWhiteRuleRequest { domain, rule_id },
            )
            .await?;
        Ok(())
    }
}
