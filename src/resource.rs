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

use std::fmt::Debug;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{AttributePath, Diagnostics, Resource};

use crate::client::{ProviderMeta, TencentCloudClient};
use crate::common::{instrumented, InvalidArgument};
use crate::utils::WithSchema;

/// CRUD handlers of one resource type.
///
/// Handlers receive the typed state and the configured client; the adapter
/// below takes care of the plan logic, the read-after-write and the mapping of
/// errors into diagnostics.
#[async_trait]
pub trait ResourceBinding: WithSchema + Debug + Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    /// Arguments whose change replaces the resource
    const FORCE_NEW: &'static [&'static str] = &[];
    /// Arguments that can never change once the resource exists
    const IMMUTABLE: &'static [&'static str] = &[];

    type State<'a>: Serialize + Deserialize<'a> + Clone + Debug + Default + Send + Sync;

    fn validate(_state: &Self::State<'_>, _diags: &mut Diagnostics) {}

    /// Fill defaults and mark provider computed attributes unknown
    fn plan(_state: &mut Self::State<'_>, _prior: Option<&Self::State<'_>>) {}

    /// Names of the attributes that differ between two states
    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str>;

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        state: Self::State<'a>,
    ) -> Result<Self::State<'a>>;

    /// `Ok(None)` when the object does not exist anymore
    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>>;

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>>;

    async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()>;

    /// Identifying fields recovered from an import id
    fn import<'a>(id: &str) -> Result<Self::State<'a>>;
}

#[derive(Debug, Default)]
pub struct TencentResource<B> {
    binding: B,
    meta: ProviderMeta,
}

impl<B: ResourceBinding> TencentResource<B> {
    pub fn new(binding: B, meta: ProviderMeta) -> Self {
        Self { binding, meta }
    }

    fn client(&self, diags: &mut Diagnostics) -> Option<TencentCloudClient> {
        match self.meta.client() {
            Ok(client) => Some(client),
            Err(err) => {
                diags.root_error_short(err.to_string());
                None
            }
        }
    }
}

/// Push `err` into the diagnostics, on the faulty attribute when there is one
pub(crate) fn report(diags: &mut Diagnostics, type_name: &str, operation: &str, err: anyhow::Error) {
    let summary = format!("{type_name}: {operation} failed");
    let detail = format!("{err:#}");
    tracing::error!(reason = %detail, "{summary}");
    match err.downcast_ref::<InvalidArgument>() {
        Some(invalid) => diags.error(summary, detail, AttributePath::new(invalid.field)),
        None => diags.root_error(summary, detail),
    }
}

#[async_trait]
impl<B: ResourceBinding> Resource for TencentResource<B> {
    type State<'a> = Value<B::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(B::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            B::validate(config, diags);
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(state) = state else {
            return Some((state, private_state));
        };
        let client = self.client(diags)?;

        match instrumented(B::TYPE_NAME, "read", self.binding.read(&client, state)).await {
            Ok(Some(state)) => Some((Value::Value(state), private_state)),
            Ok(None) => {
                tracing::warn!("{} not found, removing it from the state", B::TYPE_NAME);
                Some((Value::Null, private_state))
            }
            Err(err) => {
                report(diags, B::TYPE_NAME, "read", err);
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            B::plan(state, None);
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<AttributePath>,
    )> {
        let mut state = proposed_state;
        let mut trigger_replace = Vec::new();

        if let Value::Value(planned) = &mut state {
            B::plan(planned, prior_state.as_ref_option());
            if let Value::Value(prior) = &prior_state {
                trigger_replace = B::changes(prior, planned)
                    .into_iter()
                    .filter(|field| B::FORCE_NEW.contains(field))
                    .map(AttributePath::new)
                    .collect();
            }
        }

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(planned) = planned_state else {
            diags.root_error_short(format!("{}: planned state is not known", B::TYPE_NAME));
            return None;
        };
        let client = self.client(diags)?;

        let result = instrumented(B::TYPE_NAME, "create", async {
            let created = self.binding.create(&client, planned).await?;
            self.binding
                .read(&client, created)
                .await?
                .ok_or_else(|| anyhow!("{} not found right after its creation", B::TYPE_NAME))
        })
        .await;

        match result {
            Ok(state) => Some((Value::Value(state), private_state)),
            Err(err) => {
                report(diags, B::TYPE_NAME, "create", err);
                None
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (Value::Value(prior), Value::Value(planned)) = (prior_state, planned_state) else {
            diags.root_error_short(format!("{}: state is not known", B::TYPE_NAME));
            return None;
        };

        let changes = B::changes(&prior, &planned);
        let immutable: Vec<_> = changes
            .iter()
            .filter(|field| B::IMMUTABLE.contains(field))
            .collect();
        if !immutable.is_empty() {
            for field in immutable {
                diags.error(
                    format!("argument `{field}` cannot be changed"),
                    format!("`{field}` is fixed once the {} exists", B::TYPE_NAME),
                    AttributePath::new(*field),
                );
            }
            return None;
        }
        let client = self.client(diags)?;

        let result = instrumented(B::TYPE_NAME, "update", async {
            let updated = self
                .binding
                .update(&client, &prior, planned, &changes)
                .await?;
            self.binding
                .read(&client, updated)
                .await?
                .ok_or_else(|| anyhow!("{} disappeared during its update", B::TYPE_NAME))
        })
        .await;

        match result {
            Ok(state) => Some((Value::Value(state), private_state)),
            Err(err) => {
                report(diags, B::TYPE_NAME, "update", err);
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = state else {
            return Some(());
        };
        let client = self.client(diags)?;

        match instrumented(B::TYPE_NAME, "delete", self.binding.delete(&client, state)).await {
            Ok(()) => Some(()),
            Err(err) => {
                report(diags, B::TYPE_NAME, "delete", err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        match B::import(&id) {
            Ok(state) => Some((Value::Value(state), Default::default())),
            Err(err) => {
                report(diags, B::TYPE_NAME, "import", err);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use tf_provider::schema::AttributeConstraint;
    use tf_provider::value::{ValueNumber, ValueString};

    use super::*;
    use crate::client::mock_client;
    use crate::connection::{Endpoint, MockConnection, SdkError};
    use crate::utils::{changed_fields, get_str, number, schema, str_value, string};

    const WIDGET: Endpoint = Endpoint {
        service: "widget",
        version: "2020-01-01",
    };

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct WidgetState<'a> {
        #[serde(borrow = "'a")]
        id: ValueString<'a>,
        zone: ValueString<'a>,
        name: ValueString<'a>,
        size: ValueNumber,
    }

    #[derive(Debug, Default)]
    struct Widget;

    impl WithSchema for Widget {
        fn schema() -> Schema {
            let mut attributes = HashMap::new();
            attributes.insert("id".into(), string(AttributeConstraint::Computed, "Id"));
            attributes.insert("zone".into(), string(AttributeConstraint::Required, "Zone"));
            attributes.insert("name".into(), string(AttributeConstraint::Required, "Name"));
            attributes.insert("size".into(), number(AttributeConstraint::Optional, "Size"));
            schema("Widget", attributes, HashMap::new())
        }
    }

    #[async_trait]
    impl ResourceBinding for Widget {
        const TYPE_NAME: &'static str = "tencentcloud_widget";
        const FORCE_NEW: &'static [&'static str] = &["zone"];
        const IMMUTABLE: &'static [&'static str] = &["size"];

        type State<'a> = WidgetState<'a>;

        fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
            changed_fields!(prior, planned; zone, name, size)
        }

        async fn create<'a>(
            &self,
            client: &TencentCloudClient,
            mut state: Self::State<'a>,
        ) -> Result<Self::State<'a>> {
            let response: serde_json::Value = client
                .call(WIDGET, "CreateWidget", &json!({ "Name": get_str(&state.name) }))
                .await?;
            state.id = str_value(response["WidgetId"].as_str().unwrap_or_default());
            Ok(state)
        }

        async fn read<'a>(
            &self,
            client: &TencentCloudClient,
            mut state: Self::State<'a>,
        ) -> Result<Option<Self::State<'a>>> {
            let response: Result<serde_json::Value, SdkError> = client
                .call(WIDGET, "DescribeWidget", &json!({ "WidgetId": state.id.as_str() }))
                .await;
            match response {
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err.into()),
                Ok(response) => {
                    state.name = str_value(response["Name"].as_str().unwrap_or_default());
                    Ok(Some(state))
                }
            }
        }

        async fn update<'a>(
            &self,
            client: &TencentCloudClient,
            _prior: &Self::State<'a>,
            planned: Self::State<'a>,
            _changes: &[&'static str],
        ) -> Result<Self::State<'a>> {
            let _: serde_json::Value = client
                .call(WIDGET, "ModifyWidget", &json!({ "Name": get_str(&planned.name) }))
                .await?;
            Ok(planned)
        }

        async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
            let _: serde_json::Value = client
                .call(WIDGET, "DeleteWidget", &json!({ "WidgetId": state.id.as_str() }))
                .await?;
            Ok(())
        }

        fn import<'a>(id: &str) -> Result<Self::State<'a>> {
            if id.is_empty() {
                return Err(crate::common::invalid_argument("id", "empty id"));
            }
            Ok(WidgetState {
                id: str_value(id),
                ..Default::default()
            })
        }
    }

    /// Resource wired to a scripted connection
    pub(crate) fn configured<B: ResourceBinding>(binding: B) -> (TencentResource<B>, std::sync::Arc<MockConnection>) {
        let (client, mock) = mock_client();
        let meta = ProviderMeta::default();
        meta.set(client).unwrap();
        (TencentResource::new(binding, meta), mock)
    }

    fn widget<'a>(id: &str, name: &str, size: i64) -> WidgetState<'a> {
        WidgetState {
            id: str_value(id),
            zone: str_value("ap-guangzhou-3"),
            name: str_value(name),
            size: Value::Value(size),
        }
    }

    #[tokio::test]
    async fn missing_object_reads_as_null_state() {
        let (resource, mock) = configured(Widget);
        mock.fail("DescribeWidget", "ResourceNotFound.WidgetNotExist", "gone");

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .read(
                &mut diags,
                Value::Value(widget("w-1", "a", 1)),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        assert!(state.is_null());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn immutable_change_is_rejected_before_any_call() {
        let (resource, mock) = configured(Widget);

        let mut diags = Diagnostics::default();
        let result = resource
            .update(
                &mut diags,
                Value::Value(widget("w-1", "a", 1)),
                Value::Value(widget("w-1", "b", 2)),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await;

        assert!(result.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn force_new_change_requires_replace() {
        let (resource, _) = configured(Widget);
        let mut moved = widget("w-1", "a", 1);
        moved.zone = str_value("ap-guangzhou-4");

        let mut diags = Diagnostics::default();
        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                Value::Value(widget("w-1", "a", 1)),
                Value::Value(moved),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        assert_eq!(replace.len(), 1);
    }

    #[tokio::test]
    async fn create_reads_back_the_object() {
        let (resource, mock) = configured(Widget);
        mock.respond("CreateWidget", json!({ "WidgetId": "w-9" }));
        mock.respond("DescribeWidget", json!({ "Name": "from-api" }));

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(widget("", "a", 1)),
                Default::default(),
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();

        let state = state.as_ref().unwrap();
        assert_eq!(state.id.as_str(), "w-9");
        assert_eq!(state.name.as_str(), "from-api");
        assert_eq!(mock.actions(), vec!["CreateWidget", "DescribeWidget"]);
    }

    #[tokio::test]
    async fn api_failure_becomes_a_diagnostic() {
        let (resource, mock) = configured(Widget);
        mock.fail("DeleteWidget", "AuthFailure.UnauthorizedOperation", "denied");

        let mut diags = Diagnostics::default();
        let result = resource
            .destroy(
                &mut diags,
                Value::Value(widget("w-1", "a", 1)),
                Default::default(),
                Default::default(),
            )
            .await;

        assert!(result.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_reported() {
        let resource = TencentResource::new(Widget, ProviderMeta::default());

        let mut diags = Diagnostics::default();
        let result = resource
            .destroy(
                &mut diags,
                Value::Value(widget("w-1", "a", 1)),
                Default::default(),
                Default::default(),
            )
            .await;

        assert!(result.is_none());
        assert!(!diags.errors.is_empty());
    }

    #[tokio::test]
    async fn broken_import_id_is_reported() {
        let (resource, _) = configured(Widget);

        let mut diags = Diagnostics::default();
        assert!(resource.import(&mut diags, String::new()).await.is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
