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

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tf_provider::schema::AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{map, AttributePath, Diagnostics};

use super::service::{
    is_listener_missing, CertificateAliasInfo, CreateDomainRequest, DomainRuleSet, GaapService,
    ModifyCertificateRequest, SetAuthenticationRequest,
};
use crate::client::TencentCloudClient;
use crate::common::{build_id, invalid_argument, paginate, parse_id, retry, retry_error, StateChangeConf};
use crate::resource::ResourceBinding;
use crate::utils::{
    boolean, changed_fields, get_bool, get_str, get_str_set, opt_str_value, required_str, schema,
    set_default, str_set_value, str_value, string, string_set, unknown_if_null, StringSet, WithSchema,
};

/// Separator of `listener_id+protocol+domain`
const ID_SP: &str = "+";
const LISTENER_PAGE: u64 = 50;
const DEFAULT_CERTIFICATE: &str = "default";

const AUTH_FIELDS: &[&str] = &[
    "basic_auth",
    "basic_auth_id",
    "realserver_auth",
    "realserver_certificate_ids",
    "realserver_certificate_domain",
    "gaap_auth",
    "gaap_auth_id",
];

/// Settings refused when the listener forwards plain HTTP to its origin
const HTTPS_ORIGIN_FIELDS: &[&str] = &[
    "realserver_auth",
    "realserver_certificate_ids",
    "realserver_certificate_domain",
    "gaap_auth",
    "gaap_auth_id",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaapHttpDomainState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub listener_id: ValueString<'a>,
    pub domain: ValueString<'a>,
    pub certificate_id: ValueString<'a>,
    pub client_certificate_ids: StringSet<'a>,
    pub basic_auth: Value<bool>,
    pub basic_auth_id: ValueString<'a>,
    pub realserver_auth: Value<bool>,
    pub realserver_certificate_ids: StringSet<'a>,
    pub realserver_certificate_domain: ValueString<'a>,
    pub gaap_auth: Value<bool>,
    pub gaap_auth_id: ValueString<'a>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GaapHttpDomain;

impl WithSchema for GaapHttpDomain {
    fn schema() -> Schema {
        schema(
            "Provides a resource to create a forward domain of layer7 listener.",
            map! {
                "id" => string(Computed, "`listener_id+protocol+domain`."),
                "listener_id" => string(Required, "ID of the layer7 listener."),
                "domain" => string(Required, "Forward domain of the layer7 listener."),
                "certificate_id" => string(OptionalComputed, "ID of the server certificate, default value is `default`."),
                "client_certificate_ids" => string_set(OptionalComputed, "ID list of the poly client certificate."),
                "basic_auth" => boolean(OptionalComputed, "Indicates whether basic authentication is enable, default is `false`."),
                "basic_auth_id" => string(OptionalComputed, "ID of the basic authentication."),
                "realserver_auth" => boolean(OptionalComputed, "Indicates whether realserver authentication is enable, default is `false`."),
                "realserver_certificate_ids" => string_set(OptionalComputed, "CA certificate ID list of the realserver."),
                "realserver_certificate_domain" => string(OptionalComputed, "CA certificate domain of the realserver."),
                "gaap_auth" => boolean(OptionalComputed, "Indicates whether SSL certificate authentication is enable, default is `false`."),
                "gaap_auth_id" => string(Optional, "ID of the SSL certificate."),
            },
            map! {},
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ListenerProtocol {
    Http,
    Https { forward_protocol: String },
}

impl ListenerProtocol {
    fn name(&self) -> &'static str {
        match self {
            ListenerProtocol::Http => "HTTP",
            ListenerProtocol::Https { .. } => "HTTPS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomainPresence {
    Present,
    Absent,
    ListenerGone,
}

/// Look the listener up among both layer-7 listener kinds at once
async fn listener_protocol(service: GaapService<'_>, listener_id: &str, timeout: Duration) -> Result<ListenerProtocol> {
    let http = paginate(LISTENER_PAGE, timeout, |offset| async move {
        match service.describe_http_listeners(listener_id, LISTENER_PAGE, offset).await {
            Err(err) if is_listener_missing(&err) => Ok(Vec::new()),
            result => result.map_err(|err| retry_error(err, &[])),
        }
    });
    let https = paginate(LISTENER_PAGE, timeout, |offset| async move {
        match service.describe_https_listeners(listener_id, LISTENER_PAGE, offset).await {
            Err(err) if is_listener_missing(&err) => Ok(Vec::new()),
            result => result.map_err(|err| retry_error(err, &[])),
        }
    });
    let (http, https) = futures::try_join!(http, https)?;

    if let Some(listener) = https.into_iter().next() {
        let forward_protocol = listener
            .forward_protocol
            .ok_or_else(|| anyhow!("https listener {listener_id} has no forward protocol"))?;
        return Ok(ListenerProtocol::Https { forward_protocol });
    }
    if !http.is_empty() {
        return Ok(ListenerProtocol::Http);
    }
    Err(invalid_argument(
        "listener_id",
        format!("listener {listener_id} is neither an HTTP nor an HTTPS listener"),
    ))
}

/// Rule of `domain` on the listener, with the presence it implies
async fn lookup(
    service: GaapService<'_>,
    listener_id: &str,
    domain: &str,
    timeout: Duration,
) -> Result<(Option<DomainRuleSet>, DomainPresence)> {
    let rules = retry(timeout, || async move {
        match service.describe_rules(listener_id).await {
            Ok(rules) => Ok(Some(rules)),
            Err(err) if is_listener_missing(&err) => Ok(None),
            Err(err) => Err(retry_error(err, &[])),
        }
    })
    .await?;
    let Some(rules) = rules else {
        return Ok((None, DomainPresence::ListenerGone));
    };

    for rule in rules {
        match rule.domain.as_deref() {
            None => bail!("DescribeRules returned a rule without domain"),
            Some(name) if name == domain => return Ok((Some(rule), DomainPresence::Present)),
            Some(_) => (),
        }
    }
    Ok((None, DomainPresence::Absent))
}

async fn wait_domain(
    service: GaapService<'_>,
    listener_id: &str,
    domain: &str,
    target: DomainPresence,
    timeout: Duration,
) -> Result<()> {
    StateChangeConf::new(
        format!("gaap domain {domain} of listener {listener_id}"),
        [target, DomainPresence::ListenerGone],
        timeout,
    )
    .wait(|| async move {
        let (_, presence) = lookup(service, listener_id, domain, timeout).await?;
        Ok(((), presence))
    })
    .await
}

fn alias_ids(infos: Option<Vec<CertificateAliasInfo>>) -> impl Iterator<Item = String> {
    infos.into_iter().flatten().map(|info| info.certificate_id)
}

fn auth_request(
    state: &GaapHttpDomainState<'_>,
    listener_id: &str,
    domain: &str,
) -> Result<SetAuthenticationRequest> {
    let basic_auth = get_bool(&state.basic_auth);
    let basic_auth_id = get_str(&state.basic_auth_id);
    if basic_auth && basic_auth_id.is_none() {
        return Err(invalid_argument(
            "basic_auth_id",
            "when use basic auth, basic auth id should be set",
        ));
    }

    let realserver_auth = get_bool(&state.realserver_auth);
    let realserver_certificate_ids = get_str_set(&state.realserver_certificate_ids);
    let realserver_certificate_domain = get_str(&state.realserver_certificate_domain);
    if realserver_auth && (realserver_certificate_ids.is_empty() || realserver_certificate_domain.is_none()) {
        return Err(invalid_argument(
            "realserver_certificate_ids",
            "when use realserver auth, realserver_certificate_ids and domain should be set",
        ));
    }

    let gaap_auth = get_bool(&state.gaap_auth);
    let gaap_certificate_id = get_str(&state.gaap_auth_id);
    if gaap_auth && gaap_certificate_id.is_none() {
        return Err(invalid_argument(
            "gaap_auth_id",
            "when use gaap auth, gaap auth id should be set",
        ));
    }

    Ok(SetAuthenticationRequest {
        listener_id: listener_id.to_owned(),
        domain: domain.to_owned(),
        basic_auth: basic_auth.into(),
        basic_auth_conf_id: basic_auth_id.map(str::to_owned),
        real_server_auth: realserver_auth.into(),
        real_server_certificate_domain: realserver_certificate_domain.map(str::to_owned),
        poly_real_server_certificate_ids: (!realserver_certificate_ids.is_empty())
            .then_some(realserver_certificate_ids),
        gaap_auth: gaap_auth.into(),
        gaap_certificate_id: gaap_certificate_id.map(str::to_owned),
    })
}

#[async_trait]
impl ResourceBinding for GaapHttpDomain {
    const TYPE_NAME: &'static str = "tencentcloud_gaap_http_domain";
    const FORCE_NEW: &'static [&'static str] = &["listener_id", "domain"];

    type State<'a> = GaapHttpDomainState<'a>;

    fn validate(state: &Self::State<'_>, diags: &mut Diagnostics) {
        if get_str_set(&state.client_certificate_ids)
            .iter()
            .any(|id| id == DEFAULT_CERTIFICATE)
        {
            diags.error(
                "Invalid client_certificate_ids",
                "client_certificate_ids can't have `default`",
                AttributePath::new("client_certificate_ids"),
            );
        }
    }

    fn plan(state: &mut Self::State<'_>, prior: Option<&Self::State<'_>>) {
        set_default(&mut state.certificate_id, DEFAULT_CERTIFICATE.into());
        set_default(&mut state.basic_auth, false);
        set_default(&mut state.realserver_auth, false);
        set_default(&mut state.gaap_auth, false);
        unknown_if_null(&mut state.client_certificate_ids);
        unknown_if_null(&mut state.basic_auth_id);
        unknown_if_null(&mut state.realserver_certificate_ids);
        unknown_if_null(&mut state.realserver_certificate_domain);
        if prior.is_none() {
            state.id = Value::Unknown;
        }
    }

    fn changes(prior: &Self::State<'_>, planned: &Self::State<'_>) -> Vec<&'static str> {
        changed_fields!(prior, planned;
            listener_id, domain, certificate_id, client_certificate_ids, basic_auth, basic_auth_id,
            realserver_auth, realserver_certificate_ids, realserver_certificate_domain, gaap_auth,
            gaap_auth_id,
        )
    }

    async fn create<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Self::State<'a>> {
        let listener_id = required_str(&state.listener_id, "listener_id")?;
        let domain = required_str(&state.domain, "domain")?;
        let service = GaapService::new(client);
        let timeouts = client.timeouts();

        let protocol = listener_protocol(service, listener_id, timeouts.read).await?;
        let (request, auth) = match &protocol {
            ListenerProtocol::Http => (
                CreateDomainRequest {
                    listener_id: listener_id.to_owned(),
                    domain: domain.to_owned(),
                    ..Default::default()
                },
                None,
            ),
            ListenerProtocol::Https { forward_protocol } => {
                let client_certificate_ids = get_str_set(&state.client_certificate_ids);
                if client_certificate_ids.iter().any(|id| id == DEFAULT_CERTIFICATE) {
                    return Err(invalid_argument(
                        "client_certificate_ids",
                        "client_certificate_ids can't have `default`",
                    ));
                }
                if forward_protocol == "HTTP" {
                    if get_bool(&state.realserver_auth) {
                        return Err(invalid_argument(
                            "realserver_auth",
                            "when listener forward protocol is http, realserver_auth can't be true",
                        ));
                    }
                    if get_bool(&state.gaap_auth) {
                        return Err(invalid_argument(
                            "gaap_auth",
                            "when listener forward protocol is http, gaap_auth can't be set",
                        ));
                    }
                }
                let auth = auth_request(&state, listener_id, domain)?;
                let request = CreateDomainRequest {
                    listener_id: listener_id.to_owned(),
                    domain: domain.to_owned(),
                    certificate_id: Some(
                        get_str(&state.certificate_id)
                            .unwrap_or(DEFAULT_CERTIFICATE)
                            .to_owned(),
                    ),
                    poly_client_certificate_ids: (!client_certificate_ids.is_empty())
                        .then_some(client_certificate_ids),
                };
                (request, Some(auth))
            }
        };

        let request = &request;
        retry(timeouts.write, || async move {
            service
                .create_domain(request)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        wait_domain(service, listener_id, domain, DomainPresence::Present, timeouts.read).await?;

        if let Some(auth) = &auth {
            retry(timeouts.write, || async move {
                service
                    .set_authentication(auth)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        state.id = str_value(build_id([listener_id, protocol.name(), domain], ID_SP));
        Ok(state)
    }

    async fn read<'a>(
        &self,
        client: &TencentCloudClient,
        mut state: Self::State<'a>,
    ) -> Result<Option<Self::State<'a>>> {
        let id = required_str(&state.id, "id")?.to_owned();
        let [listener_id, _, domain] = parse_id::<3>(&id, ID_SP)?;
        let service = GaapService::new(client);

        let (rule, _) = lookup(service, listener_id, domain, client.timeouts().read).await?;
        let Some(rule) = rule else {
            return Ok(None);
        };

        state.listener_id = str_value(listener_id);
        state.domain = str_value(domain);
        state.certificate_id = str_value(
            rule.certificate_id
                .unwrap_or_else(|| DEFAULT_CERTIFICATE.to_owned()),
        );
        state.client_certificate_ids = str_set_value(alias_ids(rule.poly_client_certificate_alias_info));
        state.basic_auth = Value::Value(rule.basic_auth == Some(1));
        state.basic_auth_id = opt_str_value(rule.basic_auth_conf_id);
        state.realserver_auth = Value::Value(rule.real_server_auth == Some(1));
        state.realserver_certificate_ids =
            str_set_value(alias_ids(rule.poly_real_server_certificate_alias_info));
        state.realserver_certificate_domain = opt_str_value(rule.real_server_certificate_domain);
        state.gaap_auth = Value::Value(rule.gaap_auth == Some(1));
        state.gaap_auth_id = opt_str_value(rule.gaap_certificate_id);
        Ok(Some(state))
    }

    async fn update<'a>(
        &self,
        client: &TencentCloudClient,
        _prior: &Self::State<'a>,
        planned: Self::State<'a>,
        changes: &[&'static str],
    ) -> Result<Self::State<'a>> {
        let id = required_str(&planned.id, "id")?;
        let [listener_id, protocol, domain] = parse_id::<3>(id, ID_SP)?;
        match protocol {
            "HTTP" => bail!("http listener can't set auth"),
            "HTTPS" => (),
            other => bail!("id is broken, {id}: protocol `{other}` is invalid"),
        }
        let changed = |fields: &[&str]| fields.iter().any(|field| changes.contains(field));

        let service = GaapService::new(client);
        let timeouts = client.timeouts();
        let forward_protocol = match listener_protocol(service, listener_id, timeouts.read).await? {
            ListenerProtocol::Https { forward_protocol } => forward_protocol,
            ListenerProtocol::Http => bail!("listener {listener_id} is not an HTTPS listener"),
        };
        if forward_protocol == "HTTP" && changed(HTTPS_ORIGIN_FIELDS) {
            bail!("when listener forward protocol is HTTP, only can set basic auth");
        }
        let auth = auth_request(&planned, listener_id, domain)?;

        if changed(&["certificate_id", "client_certificate_ids"]) {
            let client_certificate_ids: Vec<String> = get_str_set(&planned.client_certificate_ids)
                .into_iter()
                .filter(|id| id != DEFAULT_CERTIFICATE)
                .collect();
            let request = ModifyCertificateRequest {
                listener_id: listener_id.to_owned(),
                domain: domain.to_owned(),
                certificate_id: get_str(&planned.certificate_id)
                    .unwrap_or(DEFAULT_CERTIFICATE)
                    .to_owned(),
                poly_client_certificate_ids: (!client_certificate_ids.is_empty())
                    .then_some(client_certificate_ids),
            };
            let request = &request;
            retry(timeouts.write, || async move {
                service
                    .modify_certificate(request)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        if changed(AUTH_FIELDS) {
            let auth = &auth;
            retry(timeouts.write, || async move {
                service
                    .set_authentication(auth)
                    .await
                    .map_err(|err| retry_error(err, &[]))
            })
            .await?;
        }

        Ok(planned)
    }

    async fn delete<'a>(&self, client: &TencentCloudClient, state: Self::State<'a>) -> Result<()> {
        let [listener_id, _, domain] = parse_id::<3>(required_str(&state.id, "id")?, ID_SP)?;
        let service = GaapService::new(client);
        let timeouts = client.timeouts();

        retry(timeouts.write, || async move {
            service
                .delete_domain(listener_id, domain)
                .await
                .map_err(|err| retry_error(err, &[]))
        })
        .await?;
        wait_domain(service, listener_id, domain, DomainPresence::Absent, timeouts.read).await
    }

    fn import<'a>(id: &str) -> Result<Self::State<'a>> {
        let [listener_id, _, domain] =
            parse_id::<3>(id, ID_SP).map_err(|err| invalid_argument("id", err.to_string()))?;
        Ok(GaapHttpDomainState {
            id: str_value(id),
            listener_id: str_value(listener_id),
            domain: str_value(domain),
            ..Default::default()
        })
    }
}
