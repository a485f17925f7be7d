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

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{DataSource, Diagnostics};

use crate::client::{ProviderMeta, TencentCloudClient};
use crate::common::{data_resource_ids_hash, instrumented, write_to_file};
use crate::resource::report;
use crate::utils::WithSchema;

/// Outcome of a data source query
#[derive(Debug)]
pub struct Lookup<S> {
    pub state: S,
    /// Ids of the result rows, hashed into the data source id
    pub ids: Vec<String>,
    /// Rows dumped into `result_output_file`
    pub result: serde_json::Value,
}

#[async_trait]
pub trait DataSourceBinding: WithSchema + Debug + Send + Sync + 'static {
    const TYPE_NAME: &'static str;

    type State<'a>: Serialize + Deserialize<'a> + Clone + Debug + Default + Send + Sync;

    fn validate(_config: &Self::State<'_>, _diags: &mut Diagnostics) {}

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        config: Self::State<'a>,
    ) -> Result<Lookup<Self::State<'a>>>;

    fn set_id(state: &mut Self::State<'_>, id: String);

    fn result_output_file<'b>(state: &'b Self::State<'_>) -> Option<&'b str>;
}

#[derive(Debug, Default)]
pub struct TencentDataSource<D> {
    binding: D,
    meta: ProviderMeta,
}

impl<D: DataSourceBinding> TencentDataSource<D> {
    pub fn new(binding: D, meta: ProviderMeta) -> Self {
        Self { binding, meta }
    }

    async fn lookup<'a>(&self, config: D::State<'a>) -> Result<D::State<'a>> {
        let client = self.meta.client()?;
        let Lookup {
            mut state,
            ids,
            result,
        } = self.binding.read(&client, config).await?;

        D::set_id(&mut state, data_resource_ids_hash(&ids));
        if let Some(path) = D::result_output_file(&state) {
            write_to_file(path, &result).await?;
        }
        Ok(state)
    }
}

#[async_trait]
impl<D: DataSourceBinding> DataSource for TencentDataSource<D> {
    type State<'a> = D::State<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(D::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        D::validate(&config, diags);

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        match instrumented(D::TYPE_NAME, "read", self.lookup(config)).await {
            Ok(state) => Some(state),
            Err(err) => {
                report(diags, D::TYPE_NAME, "read", err);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::json;
    use tf_provider::schema::AttributeConstraint;
    use tf_provider::value::{ValueList, ValueString};

    use super::*;
    use crate::client::mock_client;
    use crate::connection::{Endpoint, MockConnection};
    use crate::utils::{get_str, schema, str_list_value, str_value, string, string_list};

    const WIDGET: Endpoint = Endpoint {
        service: "widget",
        version: "2020-01-01",
    };

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct WidgetsState<'a> {
        #[serde(borrow = "'a")]
        id: ValueString<'a>,
        result_output_file: ValueString<'a>,
        widget_ids: ValueList<ValueString<'a>>,
    }

    #[derive(Debug, Default)]
    struct Widgets;

    impl WithSchema for Widgets {
        fn schema() -> Schema {
            let mut attributes = HashMap::new();
            attributes.insert("id".into(), string(AttributeConstraint::Computed, "Id"));
            attributes.insert(
                "result_output_file".into(),
                string(AttributeConstraint::Optional, "Output file"),
            );
            attributes.insert(
                "widget_ids".into(),
                string_list(AttributeConstraint::Computed, "Ids"),
            );
            schema("Widgets", attributes, HashMap::new())
        }
    }

    #[async_trait]
    impl DataSourceBinding for Widgets {
        const TYPE_NAME: &'static str = "tencentcloud_widgets";

        type State<'a> = WidgetsState<'a>;

        async fn read<'a>(
            &self,
            client: &TencentCloudClient,
            mut config: Self::State<'a>,
        ) -> Result<Lookup<Self::State<'a>>> {
            let response: serde_json::Value =
                client.call(WIDGET, "DescribeWidgets", &json!({})).await?;
            let ids: Vec<String> = response["WidgetIds"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|id| id.as_str().map(str::to_owned))
                .collect();
            config.widget_ids = str_list_value(ids.clone());
            Ok(Lookup {
                state: config,
                result: json!(ids),
                ids,
            })
        }

        fn set_id(state: &mut Self::State<'_>, id: String) {
            state.id = str_value(id);
        }

        fn result_output_file<'b>(state: &'b Self::State<'_>) -> Option<&'b str> {
            get_str(&state.result_output_file)
        }
    }

    /// Data source wired to a scripted connection
    pub(crate) fn configured<D: DataSourceBinding>(binding: D) -> (TencentDataSource<D>, Arc<MockConnection>) {
        let (client, mock) = mock_client();
        let meta = ProviderMeta::default();
        meta.set(client).unwrap();
        (TencentDataSource::new(binding, meta), mock)
    }

    #[tokio::test]
    async fn id_is_the_hash_of_row_ids_and_result_is_written() {
        let (data_source, mock) = configured(Widgets);
        mock.respond("DescribeWidgets", json!({ "WidgetIds": ["w-1", "w-2"] }));
        let path = std::env::temp_dir()
            .join(format!("tc-ds-{}", crate::common::log_id()))
            .join("widgets.json");

        let config = WidgetsState {
            result_output_file: str_value(path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, config, Default::default())
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(state.id.as_str(), data_resource_ids_hash(&["w-1", "w-2"]));
        let written: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(written, json!(["w-1", "w-2"]));

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn failed_query_is_a_diagnostic() {
        let (data_source, mock) = configured(Widgets);
        mock.fail("DescribeWidgets", "UnauthorizedOperation", "denied");

        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, WidgetsState::default(), Default::default())
            .await;

        assert!(state.is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
