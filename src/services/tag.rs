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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Acknowledged;
use crate::client::TencentCloudClient;
use crate::connection::{Endpoint, SdkError};

pub const TAG: Endpoint = Endpoint {
    service: "tag",
    version: "2018-08-13",
};

const PAGE_SIZE: u64 = 20;

/// Six-segment resource name the tag API keys its bindings on
pub fn resource_name(service: &str, resource_type: &str, region: &str, id: &str) -> String {
    format!("qcs::{service}:{region}:uin/:{resource_type}/{id}")
}

/// Tags to write and keys to remove to go from `old` to `new`
pub fn diff_tags(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, Vec<String>) {
    let replace = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let delete = old
        .keys()
        .filter(|key| !new.contains_key(*key))
        .cloned()
        .collect();
    (replace, delete)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag<'a> {
    tag_key: &'a str,
    tag_value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagKey<'a> {
    tag_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyResourceTagsRequest<'a> {
    resource: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replace_tags: Vec<Tag<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    delete_tags: Vec<TagKey<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeResourceTagsByResourceIdsRequest<'a> {
    service_type: &'a str,
    resource_prefix: &'a str,
    resource_ids: [&'a str; 1],
    resource_region: &'a str,
    offset: u64,
    limit: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeResourceTagsByResourceIdsResponse {
    total_count: u64,
    tags: Option<Vec<ResourceTag>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ResourceTag {
    tag_key: String,
    tag_value: String,
}

#[derive(Debug, Clone, Copy)]
pub struct TagService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> TagService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    /// Write `replace` and drop the `delete` keys on `resource`, a name from [`resource_name`]
    pub async fn modify_tags(
        &self,
        resource: &str,
        replace: &BTreeMap<String, String>,
        delete: &[String],
    ) -> Result<(), SdkError> {
        if replace.is_empty() && delete.is_empty() {
            return Ok(());
        }
        let request = ModifyResourceTagsRequest {
            resource,
            replace_tags: replace
                .iter()
                .map(|(key, value)| Tag {
                    tag_key: key,
                    tag_value: value,
                })
                .collect(),
            delete_tags: delete.iter().map(|key| TagKey { tag_key: key }).collect(),
        };
        let _: Acknowledged = self
            .client
            .call(TAG, "ModifyResourceTags", &request)
            .await?;
        Ok(())
    }

    /// Tags bound to one resource, all pages
    pub async fn describe_resource_tags(
        &self,
        service_type: &str,
        resource_prefix: &str,
        region: &str,
        id: &str,
    ) -> Result<BTreeMap<String, String>, SdkError> {
        let mut tags = BTreeMap::new();
        let mut offset = 0;
        loop {
            let response: DescribeResourceTagsByResourceIdsResponse = self
                .client
                .call(
                    TAG,
                    "DescribeResourceTagsByResourceIds",
                    &DescribeResourceTagsByResourceIdsRequest {
                        service_type,
                        resource_prefix,
                        resource_ids: [id],
                        resource_region: region,
                        offset,
                        limit: PAGE_SIZE,
                    },
                )
                .await?;
            let page = response.tags.unwrap_or_default();
            let fetched = page.len() as u64;
            tags.extend(page.into_iter().map(|tag| (tag.tag_key, tag.tag_value)));
            offset += fetched;
            if fetched < PAGE_SIZE || offset >= response.total_count {
                return Ok(tags);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::client::mock_client;
    use crate::connection::{Credential, HttpConnection};

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn resource_names_follow_the_six_segment_format() {
        assert_eq!(
            resource_name("redis", "instance", "ap-guangzhou", "crs-1"),
            "qcs::redis:ap-guangzhou:uin/:instance/crs-1"
        );
    }

    #[test]
    fn diff_replaces_changed_and_deletes_dropped_keys() {
        let old = tags(&[("env", "dev"), ("team", "db"), ("owner", "ops")]);
        let new = tags(&[("env", "prod"), ("team", "db"), ("cost", "42")]);

        let (replace, delete) = diff_tags(&old, &new);

        assert_eq!(replace, tags(&[("cost", "42"), ("env", "prod")]));
        assert_eq!(delete, vec!["owner".to_string()]);
    }

    #[tokio::test]
    async fn empty_modification_is_not_sent() {
        let (client, mock) = mock_client();

        TagService::new(&client)
            .modify_tags("qcs::redis:ap-guangzhou:uin/:instance/crs-1", &BTreeMap::new(), &[])
            .await
            .unwrap();

        assert!(mock.actions().is_empty());
    }

    #[tokio::test]
    async fn modification_sends_replace_and_delete_lists() {
        let (client, mock) = mock_client();
        mock.respond("ModifyResourceTags", json!({}));

        TagService::new(&client)
            .modify_tags(
                "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                &tags(&[("env", "prod")]),
                &["owner".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(
            mock.payloads("ModifyResourceTags"),
            vec![json!({
                "Resource": "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                "ReplaceTags": [{ "TagKey": "env", "TagValue": "prod" }],
                "DeleteTags": [{ "TagKey": "owner" }],
            })]
        );
    }

    #[tokio::test]
    async fn describe_reads_every_page() {
        let (client, mock) = mock_client();
        let first: Vec<_> = (0..20)
            .map(|i| json!({ "TagKey": format!("k{i:02}"), "TagValue": "v", "ResourceId": "crs-1" }))
            .collect();
        mock.respond(
            "DescribeResourceTagsByResourceIds",
            json!({ "TotalCount": 21, "Tags": first }),
        );
        mock.respond(
            "DescribeResourceTagsByResourceIds",
            json!({ "TotalCount": 21, "Tags": [{ "TagKey": "last", "TagValue": "x", "ResourceId": "crs-1" }] }),
        );

        let found = TagService::new(&client)
            .describe_resource_tags("redis", "instance", "ap-guangzhou", "crs-1")
            .await
            .unwrap();

        assert_eq!(found.len(), 21);
        assert_eq!(found["last"], "x");
        let payloads = mock.payloads("DescribeResourceTagsByResourceIds");
        assert_eq!(payloads[0]["Offset"], 0);
        assert_eq!(payloads[1]["Offset"], 20);
        assert_eq!(payloads[1]["ResourceIds"], json!(["crs-1"]));
        assert_eq!(payloads[1]["ResourceRegion"], "ap-guangzhou");
    }

    #[tokio::test]
    async fn modification_goes_to_the_tag_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyResourceTags")
            .match_header("x-tc-version", "2018-08-13")
            .match_header("x-tc-region", "ap-guangzhou")
            .match_header("host", "tag.tencentcloudapi.com")
            .match_body(Matcher::Json(json!({
                "Resource": "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                "DeleteTags": [{ "TagKey": "owner" }],
            })))
            .with_status(200)
            .with_body(r#"{"Response":{"RequestId":"r-1"}}"#)
            .create_async()
            .await;
        let credential = Credential {
            secret_id: "AKIDTEST".into(),
            secret_key: "key".into(),
            token: None,
        };
        let connection = HttpConnection::new(credential, "HTTPS", "tencentcloudapi.com")
            .unwrap()
            .with_base_url(server.url());
        let client = TencentCloudClient::new(Arc::new(connection), "ap-guangzhou");

        TagService::new(&client)
            .modify_tags(
                "qcs::redis:ap-guangzhou:uin/:instance/crs-1",
                &BTreeMap::new(),
                &["owner".to_string()],
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
