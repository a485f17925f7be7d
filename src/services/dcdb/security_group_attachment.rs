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
use tf_provider::schema::AttributeConstraint::{Computed, Required};
use tf_provider::value::{Value, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use super::service::DcdbService;
use crate::client::TencentCloudClient;
use crate::common::{build_id, invalid_argument, parse_id, retry, retry_error, FILED_SP};
use crate::resource::ResourceBinding;
use crate::utils::{changed_fields, required_str, schema, str_value, string, WithSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcdbSecurityGroupAttachmentState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub security_group_id: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DcdbSecurityGroupAttachment;

impl WithSchema for DcdbSecurityGroupAttachment {
    fn schema() -> Schema {
        schema(
            "Provides a resource to create a dcdb security_group_attachment.",
            map! {
                "id" => string(Computed, "`instance_id#security_group_id`."),
                "instance_id" => string(Required, "Attached instance id."),
                "security_group_id" => string(Required, "Security group id."),
            },
            map! {},
        )
    }
}

#[async_trait]
impl ResourceBinding for DcdbSecurityGroupAttachment {
    const TYPE_NAME: &'static str = "tencentcloud_dcdb_security_group_attachment";
    const FORCE_NEW: &'static [&'static str] = &["instance_id", "security_group_id"];

    type State<'a> = DcdbSecurityGroupAttachmentState<'a>;

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        if prior.is_none() {
            state.id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned; instance_id, security_group_id)
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        let instance_id = required_str(&state.instance_id, "instance_id")?;
        let security_group_id = required_str(&state.security_group_id, "security_group_id")?;
        let groups = DcdbService::new(client).security_groups();

        retry(client.timeouts().write, || async move {
            groups
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
        let groups = DcdbService::new(client).security_groups();

        let attached = retry(client.timeouts().read, || async move {
            groups
                .describe(instance_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        if !attached.iter().any(|group| group == security_group_id) {
            tracing::warn!(%id, "dcdb security group attachment not found");
            return Ok(None);
        }

        state.instance_id = str_value(instance_id);
        state.security_group_id = str_value(security_group_id);
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
        let groups = DcdbService::new(client).security_groups();

        retry(client.timeouts().write, || async move {
            groups
                .disassociate(instance_id, security_group_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        let [instance_id, security_group_id] =
            parse_id::<2>(id, FILED_SP).map_err(|err| invalid_argument("id", err.to_string()))?;
        Ok(DcdbSecurityGroupAttachmentState {
            id: str_value(id),
            instance_id: str_value(instance_id),
            security_group_id: str_value(security_group_id),
        })
    }
}
