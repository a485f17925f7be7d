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
use crate::connection::{null_as_default, Endpoint, SdkError};

pub const SSL: Endpoint = Endpoint {
    service: "ssl",
    version: "2019-12-05",
};

/// Returned for an unknown certificate id
pub const CERTIFICATE_NOT_FOUND: &str = "FailedOperation.CertificateNotFound";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCertificateRequest<'a> {
    certificate_id: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct CertificateExtra {
    pub domain_number: Option<String>,
    pub origin_certificate_id: Option<String>,
    pub replaced_by: Option<String>,
    pub replaced_for: Option<String>,
    pub renew_order: Option<String>,
    #[serde(rename(deserialize = "SMCert"))]
    pub s_m_cert: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct DvAuth {
    pub dv_auth_key: Option<String>,
    pub dv_auth_value: Option<String>,
    pub dv_auth_domain: Option<String>,
    pub dv_auth_path: Option<String>,
    pub dv_auth_sub_domain: Option<String>,
    pub dv_auth_verify_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct DvAuthDetail {
    pub dv_auth_key: Option<String>,
    pub dv_auth_value: Option<String>,
    pub dv_auth_domain: Option<String>,
    pub dv_auth_path: Option<String>,
    pub dv_auth_key_sub_domain: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dv_auths: Vec<DvAuth>,
}

/// `DescribeCertificate` response; fields the API reports as nullable stay optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct Certificate {
    pub certificate_id: Option<String>,
    pub owner_uin: Option<String>,
    pub project_id: Option<String>,
    pub from: Option<String>,
    pub certificate_type: Option<String>,
    pub package_type: Option<String>,
    pub package_type_name: Option<String>,
    pub product_zh_name: Option<String>,
    pub domain: Option<String>,
    pub alias: Option<String>,
    pub status: Option<i64>,
    pub status_name: Option<String>,
    pub status_msg: Option<String>,
    pub verify_type: Option<String>,
    pub vulnerability_status: Option<String>,
    pub vulnerability_report: Option<String>,
    pub cert_begin_time: Option<String>,
    pub cert_end_time: Option<String>,
    pub validity_period: Option<String>,
    pub insert_time: Option<String>,
    pub order_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub subject_alt_name: Vec<String>,
    pub is_vip: Option<bool>,
    pub is_wildcard: Option<bool>,
    pub is_dv: Option<bool>,
    pub is_vulnerability: Option<bool>,
    pub renew_able: Option<bool>,
    pub deployable: Option<bool>,
    pub certificate_extra: Option<CertificateExtra>,
    pub dv_auth_detail: Option<DvAuthDetail>,
}

#[derive(Debug, Clone, Copy)]
pub struct SslService<'c> {
    client: &'c TencentCloudClient,
}

impl<'c> SslService<'c> {
    pub fn new(client: &'c TencentCloudClient) -> Self {
        Self { client }
    }

    pub async fn describe_certificate(&self, certificate_id: &str) -> Result<Certificate, SdkError> {
        self.client
            .call(
                SSL,
                "DescribeCertificate",
                &DescribeCertificateRequest { certificate_id },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::mock_client;

    #[tokio::test]
    async fn certificate_is_decoded_with_nullable_fields() {
        let (client, mock) = mock_client();
        mock.respond(
            "DescribeCertificate",
            json!({
                "CertificateId": "cert-1",
                "Status": 1,
                "SubjectAltName": ["a.example.com", "b.example.com"],
                "IsDv": true,
                "CertificateExtra": { "DomainNumber": "2", "SMCert": 0 },
                "DvAuthDetail": null
            }),
        );

        let certificate = SslService::new(&client)
            .describe_certificate("cert-1")
            .await
            .unwrap();

        assert_eq!(certificate.status, Some(1));
        assert_eq!(certificate.is_dv, Some(true));
        assert_eq!(certificate.owner_uin, None);
        assert_eq!(certificate.subject_alt_name.len(), 2);
        assert_eq!(certificate.certificate_extra.unwrap().s_m_cert, Some(0));
        assert!(certificate.dv_auth_detail.is_none());
        assert_eq!(
            mock.payloads("DescribeCertificate")[0],
            json!({ "CertificateId": "cert-1" })
        );
    }
}
