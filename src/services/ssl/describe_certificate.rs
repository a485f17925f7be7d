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
use tf_provider::schema::AttributeConstraint::{Computed, Optional, Required};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::map;
use tf_provider::schema::Schema;

use super::service::{Certificate, CertificateExtra, DvAuthDetail, SslService, CERTIFICATE_NOT_FOUND};
use crate::client::TencentCloudClient;
use crate::common::{retry, retry_error, RetryError};
use crate::data_source::{DataSourceBinding, Lookup};
use crate::utils::{
    boolean, get_str, number, object_list, opt_str_value, required_str, schema, str_set_value,
    str_value, string, string_set, StringSet, WithSchema,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateExtraRow<'a> {
    #[serde(borrow = "'a")]
    pub domain_number: ValueString<'a>,
    pub origin_certificate_id: ValueString<'a>,
    pub replaced_by: ValueString<'a>,
    pub replaced_for: ValueString<'a>,
    pub renew_order: ValueString<'a>,
    pub s_m_cert: ValueNumber,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DvAuthRow<'a> {
    #[serde(borrow = "'a")]
    pub dv_auth_key: ValueString<'a>,
    pub dv_auth_value: ValueString<'a>,
    pub dv_auth_domain: ValueString<'a>,
    pub dv_auth_path: ValueString<'a>,
    pub dv_auth_sub_domain: ValueString<'a>,
    pub dv_auth_verify_type: ValueString<'a>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DvAuthDetailRow<'a> {
    #[serde(borrow = "'a")]
    pub dv_auth_key: ValueString<'a>,
    pub dv_auth_value: ValueString<'a>,
    pub dv_auth_domain: ValueString<'a>,
    pub dv_auth_path: ValueString<'a>,
    pub dv_auth_key_sub_domain: ValueString<'a>,
    pub dv_auths: ValueList<Value<DvAuthRow<'a>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslDescribeCertificateState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub certificate_id: ValueString<'a>,
    pub result_output_file: ValueString<'a>,
    pub owner_uin: ValueString<'a>,
    pub project_id: ValueString<'a>,
    pub from: ValueString<'a>,
    pub certificate_type: ValueString<'a>,
    pub package_type: ValueString<'a>,
    pub package_type_name: ValueString<'a>,
    pub product_zh_name: ValueString<'a>,
    pub domain: ValueString<'a>,
    pub alias: ValueString<'a>,
    pub status: ValueNumber,
    pub status_name: ValueString<'a>,
    pub status_msg: ValueString<'a>,
    pub verify_type: ValueString<'a>,
    pub vulnerability_status: ValueString<'a>,
    pub vulnerability_report: ValueString<'a>,
    pub cert_begin_time: ValueString<'a>,
    pub cert_end_time: ValueString<'a>,
    pub validity_period: ValueString<'a>,
    pub insert_time: ValueString<'a>,
    pub order_id: ValueString<'a>,
    pub subject_alt_name: StringSet<'a>,
    pub is_vip: Value<bool>,
    pub is_wildcard: Value<bool>,
    pub is_dv: Value<bool>,
    pub is_vulnerability: Value<bool>,
    pub renew_able: Value<bool>,
    pub deployable: Value<bool>,
    pub certificate_extra: ValueList<Value<CertificateExtraRow<'a>>>,
    pub dv_auth_detail: ValueList<Value<DvAuthDetailRow<'a>>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SslDescribeCertificate;

impl WithSchema for SslDescribeCertificate {
    fn schema() -> Schema {
        let dv_auth = map! {
            "dv_auth_key" => string(Computed, "DV authentication key."),
            "dv_auth_value" => string(Computed, "DV authentication value."),
            "dv_auth_domain" => string(Computed, "DV authentication domain name."),
            "dv_auth_path" => string(Computed, "DV authentication value path."),
            "dv_auth_sub_domain" => string(Computed, "DV authentication sub-domain name."),
            "dv_auth_verify_type" => string(Computed, "DV authentication type."),
        };

        schema(
            "Use this data source to query detailed information of a ssl certificate.",
            map! {
                "id" => string(Computed, "Hash of the certificate id."),
                "certificate_id" => string(Required, "Certificate ID."),
                "result_output_file" => string(Optional, "Used to save results."),
                "owner_uin" => string(Computed, "Account UIN."),
                "project_id" => string(Computed, "Project ID."),
                "from" => string(Computed, "Certificate source: `trustasia` or `upload`."),
                "certificate_type" => string(Computed, "Certificate type: `CA` for client certificates, `SVR` for server certificates."),
                "package_type" => string(Computed, "Certificate package type."),
                "package_type_name" => string(Computed, "Certificate package name."),
                "product_zh_name" => string(Computed, "Certificate issuer name."),
                "domain" => string(Computed, "Domain name."),
                "alias" => string(Computed, "Remark name."),
                "status" => number(Computed, "Certificate status code."),
                "status_name" => string(Computed, "Certificate status name."),
                "status_msg" => string(Computed, "Status information."),
                "verify_type" => string(Computed, "Verification type: `DNS_AUTO`, `DNS` or `FILE`."),
                "vulnerability_status" => string(Computed, "Vulnerability scanning status."),
                "vulnerability_report" => string(Computed, "Vulnerability scanning evaluation report."),
                "cert_begin_time" => string(Computed, "Certificate effective time."),
                "cert_end_time" => string(Computed, "Certificate expiration time."),
                "validity_period" => string(Computed, "Certificate validity period in months."),
                "insert_time" => string(Computed, "Application time."),
                "order_id" => string(Computed, "Order ID."),
                "subject_alt_name" => string_set(Computed, "Domain names contained in the certificate, main domain included."),
                "is_vip" => boolean(Computed, "Whether the customer is a VIP customer."),
                "is_wildcard" => boolean(Computed, "Whether the certificate is a wildcard certificate."),
                "is_dv" => boolean(Computed, "Whether the certificate is a DV certificate."),
                "is_vulnerability" => boolean(Computed, "Whether vulnerability scanning is enabled."),
                "renew_able" => boolean(Computed, "Whether the certificate can be renewed."),
                "deployable" => boolean(Computed, "Whether the certificate can be deployed."),
                "certificate_extra" => object_list("Certificate extension information.", map! {
                    "domain_number" => string(Computed, "Number of domain names the certificate can hold."),
                    "origin_certificate_id" => string(Computed, "Original certificate ID."),
                    "replaced_by" => string(Computed, "Original ID of a reissued certificate."),
                    "replaced_for" => string(Computed, "New ID of a reissued certificate."),
                    "renew_order" => string(Computed, "Certificate ID of the renewal order."),
                    "s_m_cert" => number(Computed, "Whether the certificate is a SM (national cryptography) certificate."),
                }),
                "dv_auth_detail" => object_list("DV authentication information.", map! {
                    "dv_auth_key" => string(Computed, "DV authentication key."),
                    "dv_auth_value" => string(Computed, "DV authentication value."),
                    "dv_auth_domain" => string(Computed, "DV authentication domain name."),
                    "dv_auth_path" => string(Computed, "DV authentication value path."),
                    "dv_auth_key_sub_domain" => string(Computed, "DV authentication sub-domain name."),
                    "dv_auths" => object_list("DV authentication details.", dv_auth),
                }),
            },
            map! {},
        )
    }
}

fn opt<T>(value: Option<T>) -> Value<T> {
    value.map_or(Value::Null, Value::Value)
}

fn extra_row<'a>(extra: &CertificateExtra) -> CertificateExtraRow<'a> {
    CertificateExtraRow {
        domain_number: opt_str_value(extra.domain_number.clone()),
        origin_certificate_id: opt_str_value(extra.origin_certificate_id.clone()),
        replaced_by: opt_str_value(extra.replaced_by.clone()),
        replaced_for: opt_str_value(extra.replaced_for.clone()),
        renew_order: opt_str_value(extra.renew_order.clone()),
        s_m_cert: opt(extra.s_m_cert),
    }
}

fn dv_auth_row<'a>(detail: &DvAuthDetail) -> DvAuthDetailRow<'a> {
    DvAuthDetailRow {
        dv_auth_key: opt_str_value(detail.dv_auth_key.clone()),
        dv_auth_value: opt_str_value(detail.dv_auth_value.clone()),
        dv_auth_domain: opt_str_value(detail.dv_auth_domain.clone()),
        dv_auth_path: opt_str_value(detail.dv_auth_path.clone()),
        dv_auth_key_sub_domain: opt_str_value(detail.dv_auth_key_sub_domain.clone()),
        dv_auths: Value::Value(
            detail
                .dv_auths
                .iter()
                .map(|auth| {
                    Value::Value(DvAuthRow {
                        dv_auth_key: opt_str_value(auth.dv_auth_key.clone()),
                        dv_auth_value: opt_str_value(auth.dv_auth_value.clone()),
                        dv_auth_domain: opt_str_value(auth.dv_auth_domain.clone()),
                        dv_auth_path: opt_str_value(auth.dv_auth_path.clone()),
                        dv_auth_sub_domain: opt_str_value(auth.dv_auth_sub_domain.clone()),
                        dv_auth_verify_type: opt_str_value(auth.dv_auth_verify_type.clone()),
                    })
                })
                .collect(),
        ),
    }
}

fn fill(state: &mut SslDescribeCertificateState<'_>, certificate: &Certificate) {
    let c = certificate.clone();
    state.owner_uin = opt_str_value(c.owner_uin);
    state.project_id = opt_str_value(c.project_id);
    state.from = opt_str_value(c.from);
    state.certificate_type = opt_str_value(c.certificate_type);
    state.package_type = opt_str_value(c.package_type);
    state.package_type_name = opt_str_value(c.package_type_name);
    state.product_zh_name = opt_str_value(c.product_zh_name);
    state.domain = opt_str_value(c.domain);
    state.alias = opt_str_value(c.alias);
    state.status = opt(c.status);
    state.status_name = opt_str_value(c.status_name);
    state.status_msg = opt_str_value(c.status_msg);
    state.verify_type = opt_str_value(c.verify_type);
    state.vulnerability_status = opt_str_value(c.vulnerability_status);
    state.vulnerability_report = opt_str_value(c.vulnerability_report);
    state.cert_begin_time = opt_str_value(c.cert_begin_time);
    state.cert_end_time = opt_str_value(c.cert_end_time);
    state.validity_period = opt_str_value(c.validity_period);
    state.insert_time = opt_str_value(c.insert_time);
    state.order_id = opt_str_value(c.order_id);
    state.subject_alt_name = str_set_value(c.subject_alt_name);
    state.is_vip = opt(c.is_vip);
    state.is_wildcard = opt(c.is_wildcard);
    state.is_dv = opt(c.is_dv);
    state.is_vulnerability = opt(c.is_vulnerability);
    state.renew_able = opt(c.renew_able);
    state.deployable = opt(c.deployable);
    state.certificate_extra = Value::Value(
        c.certificate_extra
            .iter()
            .map(|extra| Value::Value(extra_row(extra)))
            .collect(),
    );
    state.dv_auth_detail = Value::Value(
        c.dv_auth_detail
            .iter()
            .map(|detail| Value::Value(dv_auth_row(detail)))
            .collect(),
    );
}

#[async_trait]
impl DataSourceBinding for SslDescribeCertificate {
    const TYPE_NAME: &'static str = "tencentcloud_ssl_describe_certificate";

    type State<'a> = SslDescribeCertificateState<'a>;

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut config: Self::State<'a>,
    ) -> Result<Lookup<Self::State<'a>>> {
        let service = SslService::new(client);
        let certificate_id = required_str(&config.certificate_id, "certificate_id")?.to_owned();
        let id = certificate_id.as_str();

        let certificate = retry(client.timeouts().read, || async move {
            service.describe_certificate(id).await.map_err(|err| {
                if err.code() == CERTIFICATE_NOT_FOUND {
                    RetryError::non_retryable(err)
                } else {
                    retry_error(err, &[])
                }
            })
        })
        .await?;

        fill(&mut config, &certificate);
        Ok(Lookup {
            ids: vec![certificate_id.clone()],
            result: serde_json::to_value(&certificate)?,
            state: config,
        })
    }

    fn set_id(state: &mut Self::State<'_>, id: String) {
        state.id = str_value(id);
    }

    fn result_output_file<'b>(state: &'b Self::State<'_>) -> Option<&'b str> {
        get_str(&state.result_output_file)
    }
}
