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
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::RedisService;
use crate::client::TencentCloudClient;
use crate::common::{invalid_argument, is_not_found, retry, retry_error};
use crate::resource::ResourceBinding;
use crate::utils::{
    changed_fields, get_str_set, required_str, schema, str_set_value, str_value, string, string_set,
    unknown_if_null, StringSet, WithSchema,
};

const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisBackupConfigState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub redis_id: ValueString<'a>,
    pub backup_time: ValueString<'a>,
    pub backup_period: StringSet<'a>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RedisBackupConfig;

impl WithSchema for RedisBackupConfig {
    fn schema() -> Schema {
        schema(
            "Use this resource to create a backup config of redis.",
            map! {
                "id" => string(Computed, "Id of the redis instance."),
                "redis_id" => string(Required, "ID of a Redis instance to which the policy will be applied."),
                "backup_time" => string(Required, "Specifies what time the backup action should take place, e.g. `01:00-02:00`."),
                "backup_period" => string_set(OptionalComputed, "Specifies which day the backup action should take place. Supported values: `Monday`, `Tuesday`, `Wednesday`, `Thursday`, `Friday`, `Saturday` and `Sunday`."),
            },
            map! {},
        )
    }
}

async fn apply(client: &TencentCloudClient, state: &RedisBackupConfigState<'_>) -> Result<()> {
    let redis_id = required_str(&state.redis_id, "redis_id")?;
    let backup_time = required_str(&state.backup_time, "backup_time")?;
    let week_days = get_str_set(&state.backup_period);
    if let Some(day) = week_days.iter().find(|day| !WEEK_DAYS.contains(&day.as_str())) {
        return Err(invalid_argument(
            "backup_period",
            format!("`{day}` is not a week day"),
        ));
    }

    let service = RedisService::new(client);
    let week_days = week_days.as_slice();
    retry(client.timeouts().write, || async move {
        service
            .modify_auto_backup_config(redis_id, week_days, backup_time)
            .await
            .map_err(|err| retry_error(err, &[]))
    })
    .await
}

#[async_trait]
impl ResourceBinding for RedisBackupConfig {
    const TYPE_NAME: &'static str = "tencentcloud_redis_backup_config";
    const FORCE_NEW: &'static [&'static str] = &["redis_id"];

    type State<'a> = RedisBackupConfigState<'a>;

    fn validate(state: &Self::State<'_>, diags: &mut Diagnostics) {
        for day in state.backup_period.iter().flatten() {
            if let Value::Value(day) = day {
                if !WEEK_DAYS.iter().any(|known| *known == *day) {
                    diags.error(
                        "Invalid backup_period",
                        format!("`{day}` is not one of {}", WEEK_DAYS.join(", ")),
                        AttributePath::new("backup_period"),
                    );
                }
            }
        }
    }

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        unknown_if_null(&mut state.backup_period);
        if prior.is_none() {
            state.id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned; redis_id, backup_time, backup_period)
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        apply(client, &state).await?;
        state.id = state.redis_id.clone();
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let redis_id = required_str(&state.id, "id")?.to_owned();
        let service = RedisService::new(client);
        let id = redis_id.as_str();

        let config = retry(client.timeouts().read, || async move {
            service
                .describe_auto_backup_config(id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await;
        let config = match config {
            Ok(config) => config,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => return Err(err),
        };

        state.backup_time = str_value(config.time_period);
        state.backup_period = str_set_value(config.week_days.unwrap_or_default());
        state.redis_id = str_value(redis_id);
        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        _prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        if changes.contains(&"backup_time") || changes.contains(&"backup_period") {
            apply(client, &planned).await?;
        }
        Ok(planned)
    }

    async fn delete<'a>(&self, _client: &TencentCloudClient, _state: Self::State<'a>) -> Result<()> {
        tracing::warn!("the auto-backup config of a redis instance cannot be removed, dropping it from the state only");
        Ok(())
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        if id.is_empty() {
            return Err(invalid_argument("id", "redis id must not be empty"));
        }
        Ok(RedisBackupConfigState {
            id: str_value(id),
            redis_id: str_value(id),
            ..Default::default()
        })
    }
}
