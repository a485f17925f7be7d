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

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
use tf_provider::schema::{Block, NestedBlock};
use tf_provider::value::{self, Value, ValueList, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::{
    AddCustomWhiteRuleRequest, CronJob, JobDateTime, ModifyCustomWhiteRuleRequest, Strategy,
    TimedJob, WafService,
};
use crate::client::TencentCloudClient;
use crate::common::{build_id, invalid_argument, parse_id, retry, retry_error, FILED_SP};
use crate::resource::ResourceBinding;
use crate::utils::{
    block, changed_fields, get_i64, get_i64_set, get_str, i64_set_value, number, number_set,
    opt_str_value, required_str, schema, set_default, str_value, string, unknown_if_null,
    NumberSet, WithSchema,
};

const STATUS_DISABLED: &str = "0";
const STATUS_ENABLED: &str = "1";

/// Attributes sent through `ModifyCustomWhiteRule`
const RULE_FIELDS: &[&str] = &[
    "name",
    "sort_id",
    "expire_time",
    "strategies",
    "bypass",
    "job_type",
    "job_date_time",
    "logical_op",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyState<'a> {
    #[serde(borrow = "'a")]
    pub field: ValueString<'a>,
    pub compare_func: ValueString<'a>,
    pub content: ValueString<'a>,
    pub arg: ValueString<'a>,
    pub case_not_sensitive: ValueNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedState {
    pub start_date_time: ValueNumber,
    pub end_date_time: ValueNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CronState<'a> {
    #[serde(borrow = "'a")]
    pub start_time: ValueString<'a>,
    pub end_time: ValueString<'a>,
    pub days: NumberSet,
    pub w_days: NumberSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDateTimeState<'a> {
    #[serde(borrow = "'a")]
    pub time_t_zone: ValueString<'a>,
    pub timed: ValueList<Value<TimedState>>,
    pub cron: ValueList<Value<CronState<'a>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WafCustomWhiteRuleState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub sort_id: ValueString<'a>,
    pub expire_time: ValueString<'a>,
    pub strategies: ValueList<Value<StrategyState<'a>>>,
    pub domain: ValueString<'a>,
    pub bypass: ValueString<'a>,
    pub job_type: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub job_date_time: Value<JobDateTimeState<'a>>,
    pub logical_op: ValueString<'a>,
    pub status: ValueString<'a>,
    pub rule_id: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WafCustomWhiteRule;

impl WithSchema for WafCustomWhiteRule {
    fn schema() -> Schema {
        let strategies = block(
            "Strategies detail.",
            map! {
                "field" => string(Required, "Matching field, such as `IP`, `URL`, `Referer` or `ARGS_HEADER`."),
                "compare_func" => string(Required, "Logical symbol, such as `ipmatch`, `eq`, `contains` or `rematch`."),
                "content" => string(Required, "Matching content."),
                "arg" => string(Required, "Matching parameter, only for `GET`, `POST`, `ARGS_COOKIE` and `ARGS_HEADER` fields."),
                "case_not_sensitive" => number(OptionalComputed, "0: case sensitive, 1: case insensitive."),
            },
        );
        let timed = block(
            "Time parameters for timed execution.",
            map! {
                "start_date_time" => number(Optional, "Start timestamp, in seconds."),
                "end_date_time" => number(Optional, "End timestamp, in seconds."),
            },
        );
        let cron = block(
            "Time parameters for periodic execution.",
            map! {
                "days" => number_set(Optional, "Days of the month on which the rule runs."),
                "w_days" => number_set(Optional, "Days of the week on which the rule runs."),
                "start_time" => string(Optional, "Start time."),
                "end_time" => string(Optional, "End time."),
            },
        );
        let job_date_time = Block {
            blocks: map! {
                "timed" => NestedBlock::List(timed),
                "cron" => NestedBlock::List(cron),
            },
            ..block(
                "Details of scheduled execution time.",
                map! {
                    "time_t_zone" => string(Optional, "Time zone."),
                },
            )
        };

        schema(
            "Provides a resource to create a waf custom white rule.",
            map! {
                "id" => string(Computed, "`domain#rule_id`."),
                "name" => string(Required, "Rule name."),
                "sort_id" => string(Required, "Priority, value range 0-100."),
                "expire_time" => string(OptionalComputed, "Expiration time in second-level timestamp, `0` never expires."),
                "domain" => string(Required, "Domain name that needs to add policy."),
                "bypass" => string(Required, "Details of bypass, separated by commas, such as `geoip,cc,owasp`."),
                "job_type" => string(OptionalComputed, "Rule execution mode: `TimedJob` or `CronJob`."),
                "logical_op" => string(OptionalComputed, "Logical operator between the strategies: `and` or `or`."),
                "status" => string(OptionalComputed, "The status of the switch, 1 is on, 0 is off, default 1."),
                "rule_id" => string(Computed, "Rule ID."),
            },
            map! {
                "strategies" => NestedBlock::List(strategies),
                "job_date_time" => NestedBlock::Optional(job_date_time),
            },
        )
    }
}

fn strategy_list(state: &WafCustomWhiteRuleState<'_>) -> Vec<Strategy> {
    state
        .strategies
        .iter()
        .flatten()
        .filter_map(Value::as_ref_option)
        .map(|strategy| Strategy {
            field: get_str(&strategy.field).unwrap_or_default().to_owned(),
            compare_func: get_str(&strategy.compare_func).unwrap_or_default().to_owned(),
            content: get_str(&strategy.content).unwrap_or_default().to_owned(),
            arg: get_str(&strategy.arg).unwrap_or_default().to_owned(),
            case_not_sensitive: get_i64(&strategy.case_not_sensitive),
        })
        .collect()
}

fn schedule(state: &JobDateTimeState<'_>) -> JobDateTime {
    JobDateTime {
        timed: state
            .timed
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(|timed| TimedJob {
                start_date_time: get_i64(&timed.start_date_time),
                end_date_time: get_i64(&timed.end_date_time),
            })
            .collect(),
        cron: state
            .cron
            .iter()
            .flatten()
            .filter_map(Value::as_ref_option)
            .map(|cron| CronJob {
                days: get_i64_set(&cron.days),
                w_days: get_i64_set(&cron.w_days),
                start_time: get_str(&cron.start_time).map(str::to_owned),
                end_time: get_str(&cron.end_time).map(str::to_owned),
            })
            .collect(),
        time_t_zone: get_str(&state.time_t_zone).map(str::to_owned),
    }
}

fn strategy_state<'a>(strategy: Strategy) -> Value<StrategyState<'a>> {
    Value::Value(StrategyState {
        field: str_value(strategy.field),
        compare_func: str_value(strategy.compare_func),
        content: str_value(strategy.content),
        arg: str_value(strategy.arg),
        case_not_sensitive: strategy.case_not_sensitive.map_or(Value::Null, Value::Value),
    })
}

fn schedule_state<'a>(schedule: JobDateTime) -> JobDateTimeState<'a> {
    JobDateTimeState {
        time_t_zone: opt_str_value(schedule.time_t_zone),
        timed: Value::Value(
            schedule
                .timed
                .into_iter()
                .map(|timed| {
                    Value::Value(TimedState {
                        start_date_time: timed.start_date_time.map_or(Value::Null, Value::Value),
                        end_date_time: timed.end_date_time.map_or(Value::Null, Value::Value),
                    })
                })
                .collect(),
        ),
        cron: Value::Value(
            schedule
                .cron
                .into_iter()
                .map(|cron| {
                    Value::Value(CronState {
                        start_time: opt_str_value(cron.start_time),
                        end_time: opt_str_value(cron.end_time),
                        days: i64_set_value(cron.days),
                        w_days: i64_set_value(cron.w_days),
                    })
                })
                .collect(),
        ),
    }
}

/// Numeric argument carried as a string by the schema
fn parse_number(value: &ValueString<'_>, field: &'static str) -> Result<u64> {
    let raw = get_str(value).unwrap_or("0");
    raw.parse()
        .map_err(|_| invalid_argument(field, format!("`{field}` must be a non-negative integer, got `{raw}`")))
}

fn parse_rule_id(rule_id: &str) -> Result<u64> {
    rule_id
        .parse()
        .map_err(|_| anyhow!("id is broken, rule id `{rule_id}` is not a number"))
}

#[async_trait]
impl ResourceBinding for WafCustomWhiteRule {
    const TYPE_NAME: &'static str = "tencentcloud_waf_custom_white_rule";
    const IMMUTABLE: &'static [&'static str] = &["domain"];

    type State<'a> = WafCustomWhiteRuleState<'a>;

    fn validate(state: &Self::State<'_>, diags: &mut Diagnostics) {
        if let Some(status) = get_str(&state.status) {
            if status != STATUS_DISABLED && status != STATUS_ENABLED {
                diags.error(
                    "Invalid status",
                    format!("status must be `0` or `1`, got `{status}`"),
                    AttributePath::new("status"),
                );
            }
        }
        for (field, value) in [("sort_id", &state.sort_id), ("expire_time", &state.expire_time)] {
            if let Err(err) = parse_number(value, field) {
                diags.error(format!("Invalid {field}"), err.to_string(), AttributePath::new(field));
            }
        }
    }

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        set_default(&mut state.expire_time, "0".into());
        set_default(&mut state.status, STATUS_ENABLED.into());
        unknown_if_null(&mut state.job_type);
        unknown_if_null(&mut state.logical_op);
        if let Value::Value(strategies) = &mut state.strategies {
            for strategy in strategies.iter_mut() {
                if let Value::Value(strategy) = strategy {
                    unknown_if_null(&mut strategy.case_not_sensitive);
                }
            }
        }
        if prior.is_none() {
            state.id = Value::Unknown;
            state.rule_id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned;
            name, sort_id, expire_time, strategies, domain, bypass, job_type, job_date_time,
            logical_op, status,
        )
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        let domain = required_str(&state.domain, "domain")?;
        let request = AddCustomWhiteRuleRequest {
            name: required_str(&state.name, "name")?.to_owned(),
            sort_id: required_str(&state.sort_id, "sort_id")?.to_owned(),
            expire_time: get_str(&state.expire_time).unwrap_or("0").to_owned(),
            strategies: strategy_list(&state),
            domain: domain.to_owned(),
            bypass: required_str(&state.bypass, "bypass")?.to_owned(),
            job_type: get_str(&state.job_type).map(str::to_owned),
            job_date_time: state.job_date_time.as_ref_option().map(schedule),
            logical_op: get_str(&state.logical_op).map(str::to_owned),
        };
        let service = WafService::new(client);
        let timeout = client.timeouts().write;

        let request = &request;
        let rule_id = retry(timeout, || async move {
            service
                .add_custom_white_rule(request)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?
        .ok_or_else(|| anyhow!("AddCustomWhiteRule returned no RuleId"))?;

        if get_str(&state.status) == Some(STATUS_DISABLED) {
            retry(timeout, || async move {
                service
                    .modify_custom_white_rule_status(domain, rule_id, false)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        let rule_id = rule_id.to_string();
        tracing::info!(domain, %rule_id, "waf custom white rule created");
        state.id = str_value(build_id([domain, rule_id.as_str()], FILED_SP));
        state.rule_id = str_value(rule_id);
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let id = required_str(&state.id, "id")?.to_owned();
        let [domain, rule_id] = parse_id::<2>(&id, FILED_SP)?;
        let service = WafService::new(client);

        let rule = retry(client.timeouts().read, || async move {
            service
                .describe_custom_white_rule(domain, rule_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        let Some(rule) = rule else {
            return Ok(None);
        };

        state.domain = str_value(domain);
        state.rule_id = str_value(rule.rule_id.unwrap_or_else(|| rule_id.to_owned()));
        if let Some(name) = rule.name {
            state.name = str_value(name);
        }
        if let Some(sort_id) = rule.sort_id {
            state.sort_id = str_value(sort_id);
        }
        if let Some(expire_time) = rule.expire_time {
            state.expire_time = str_value(expire_time);
        }
        if let Some(bypass) = rule.bypass {
            state.bypass = str_value(bypass);
        }
        if let Some(status) = rule.status {
            state.status = str_value(status);
        }
        if let Some(strategies) = rule.strategies {
            state.strategies = Value::Value(strategies.into_iter().map(strategy_state).collect());
        }
        state.job_type = opt_str_value(rule.job_type);
        state.logical_op = opt_str_value(rule.logical_op);
        // a block left out of the configuration stays out of the state
        if !state.job_date_time.is_null() {
            if let Some(job_date_time) = rule.job_date_time {
                state.job_date_time = Value::Value(schedule_state(job_date_time));
            }
        }
        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        _prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        let [domain, rule_id] = parse_id::<2>(required_str(&planned.id, "id")?, FILED_SP)?;
        let rule_id = parse_rule_id(rule_id)?;
        let service = WafService::new(client);
        let timeout = client.timeouts().write;

        if changes.iter().any(|field| RULE_FIELDS.contains(field)) {
            let request = ModifyCustomWhiteRuleRequest {
                domain: domain.to_owned(),
                rule_id,
                rule_name: required_str(&planned.name, "name")?.to_owned(),
                bypass: required_str(&planned.bypass, "bypass")?.to_owned(),
                sort_id: parse_number(&planned.sort_id, "sort_id")?,
                expire_time: parse_number(&planned.expire_time, "expire_time")?,
                strategies: strategy_list(&planned),
                job_type: get_str(&planned.job_type).map(str::to_owned),
                job_date_time: planned.job_date_time.as_ref_option().map(schedule),
                logical_op: get_str(&planned.logical_op).map(str::to_owned),
            };
            let request = &request;
            retry(timeout, || async move {
                service
                    .modify_custom_white_rule(request)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        if changes.contains(&"status") {
            let enabled = get_str(&planned.status) != Some(STATUS_DISABLED);
            retry(timeout, || async move {
                service
                    .modify_custom_white_rule_status(domain, rule_id, enabled)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        Ok(planned)
    }

    async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
        let [domain, rule_id] = parse_id::<2>(required_str(&state.id, "id")?, FILED_SP)?;
        let rule_id = parse_rule_id(rule_id)?;
        let service = WafService::new(client);

        retry(client.timeouts().write, || async move {
            service
                .delete_custom_white_rule(domain, rule_id)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        let [domain, rule_id] =
            parse_id::<2>(id, FILED_SP).map_err(|err| invalid_argument("id", err.to_string()))?;
        parse_rule_id(rule_id)?;
        Ok(WafCustomWhiteRuleState {
            id: str_value(id),
            domain: str_value(domain),
            rule_id: str_value(rule_id),
            ..Default::default()
        })
    }
}
