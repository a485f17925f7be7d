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

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::client::TencentCloudClient;
use crate::common::{retry, retry_error};
use crate::connection::{Endpoint, SdkError};

pub const CVM: Endpoint = Endpoint {
    service: "cvm",
    version: "2017-03-12",
};

#[derive(Debug, Serialize)]
struct DescribeZonesRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeZonesResponse {
    zone_set: Vec<ZoneInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ZoneInfo {
    /// Zone name, e.g. `ap-guangzhou-3`
    pub zone: String,
    pub zone_name: String,
    /// Numeric id, sent as a string
    pub zone_id: String,
    pub zone_state: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CvmService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> CvmService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    pub async fn describe_zones(&self) -> Result<Vec<ZoneInfo>, SdkError> {
        let response: DescribeZonesResponse = self
            .client
            .call(CVM, "DescribeZones", &DescribeZonesRequest {})
            .await?;
        Ok(response.zone_set)
    }
}

/// Zone table of the client's region, fetched under the read retry
pub async fn zones(client: &TencentCloudClient, timeout: Duration) -> Result<Zones> {
    let service = CvmService::new(client);
    let zone_set = retry(timeout, || async move {
        service
            .describe_zones()
            .await
            .map_err(|err| retry_error(err, &[]))
    })
    .await?;
    Zones::from_zone_set(zone_set)
}

/// Mapping between zone names and the numeric zone ids used by database APIs
#[derive(Debug, Clone, Default)]
pub struct Zones {
    names: HashMap<i64, String>,
}

impl Zones {
    pub fn from_zone_set(zone_set: Vec<ZoneInfo>) -> Result<Self> {
        let names = zone_set
            .into_iter()
            .map(|zone| {
                let id = zone.zone_id.parse::<i64>().map_err(|_| {
                    anyhow!("DescribeZones returned an invalid ZoneId `{}`", zone.zone_id)
                })?;
                Ok((id, zone.zone))
            })
            .collect::<Result<_>>()?;
        Ok(Self { names })
    }

    pub fn id(&self, name: &str) -> Result<i64> {
        self.names
            .iter()
            .find(|(_, zone)| zone.as_str() == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| anyhow!("zone `{name}` is not supported yet"))
    }

    pub fn name(&self, id: i64) -> Result<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("zone id {id} is not supported yet"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::mock_client;

    #[tokio::test]
    async fn zone_names_and_ids_map_both_ways() {
        let (client, mock) = mock_client();
        mock.respond(
            "DescribeZones",
            json!({ "ZoneSet": [
                { "Zone": "ap-guangzhou-3", "ZoneName": "Guangzhou Zone 3", "ZoneId": "100003", "ZoneState": "AVAILABLE" },
                { "Zone": "ap-guangzhou-4", "ZoneName": "Guangzhou Zone 4", "ZoneId": "100004", "ZoneState": "AVAILABLE" }
            ] }),
        );

        let zones = zones(&client, Duration::from_secs(10)).await.unwrap();

        assert_eq!(zones.id("ap-guangzhou-4").unwrap(), 100004);
        assert_eq!(zones.name(100003).unwrap(), "ap-guangzhou-3");
        assert!(zones.id("ap-shanghai-1").is_err());
        assert!(zones.name(1).is_err());
    }

    #[test]
    fn malformed_zone_id_is_rejected() {
        let zone = ZoneInfo {
            zone: "ap-guangzhou-3".into(),
            zone_id: "abc".into(),
            ..Default::default()
        };
        assert!(Zones::from_zone_set(vec![zone]).is_err());
    }
}
