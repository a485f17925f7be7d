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

//! TC3-HMAC-SHA256 request signing

use crypto::digest::Digest;
use crypto::hmac::Hmac;
use crypto::mac::Mac;
use crypto::sha2::Sha256;
use time::OffsetDateTime;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

/// API key pair, with an optional temporary session token
#[derive(Clone, Default)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn sha256_hex(data: &str) -> String {
    let mut digest = Sha256::new();
    digest.input_str(data);
    digest.result_str()
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = Hmac::new(Sha256::new(), key);
    mac.input(data.as_bytes());
    mac.result().code().to_vec()
}

fn canonical_request(host: &str, payload: &str) -> String {
    format!(
        "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{host}\n\n{SIGNED_HEADERS}\n{}",
        sha256_hex(payload)
    )
}

/// Value of the `Authorization` header of a POST request with a JSON body
pub fn authorization(
    credential: &Credential,
    service: &str,
    host: &str,
    payload: &str,
    timestamp: OffsetDateTime,
) -> String {
    let date = timestamp.date().to_string();
    let scope = format!("{date}/{service}/tc3_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        timestamp.unix_timestamp(),
        sha256_hex(&canonical_request(host, payload))
    );

    let secret_date = hmac_sha256(format!("TC3{}", credential.secret_key).as_bytes(), &date);
    let secret_service = hmac_sha256(&secret_date, service);
    let secret_signing = hmac_sha256(&secret_service, "tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign));

    format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        credential.secret_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            secret_id: "AKIDEXAMPLE".into(),
            secret_key: "example-key".into(),
            token: Some("session".into()),
        }
    }

    fn at(ts: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(ts).unwrap()
    }

    #[test]
    fn canonical_request_layout() {
        let request = canonical_request("cvm.tencentcloudapi.com", "{}");
        let lines: Vec<&str> = request.split('\n').collect();
        assert_eq!(lines[0], "POST");
        assert_eq!(lines[1], "/");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "content-type:application/json; charset=utf-8");
        assert_eq!(lines[4], "host:cvm.tencentcloudapi.com");
        assert_eq!(lines[6], "content-type;host");
        assert_eq!(
            lines[7],
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn authorization_header_shape() {
        let header = authorization(
            &credential(),
            "cvm",
            "cvm.tencentcloudapi.com",
            r#"{"Limit":1}"#,
            at(1551113065),
        );

        let prefix = "TC3-HMAC-SHA256 Credential=AKIDEXAMPLE/2019-02-25/cvm/tc3_request, \
                      SignedHeaders=content-type;host, Signature=";
        assert!(header.starts_with(prefix), "{header}");
        assert_eq!(
            &header[prefix.len()..],
            "0d4750f2232115909c364478c656eb089f6ec7549548caff51e05d6148e8e042"
        );
    }

    #[test]
    fn signature_depends_on_every_input() {
        let base = authorization(&credential(), "cvm", "h", "{}", at(1551113065));
        assert_eq!(base, authorization(&credential(), "cvm", "h", "{}", at(1551113065)));
        assert_ne!(base, authorization(&credential(), "cvm", "h", "{ }", at(1551113065)));
        assert_ne!(base, authorization(&credential(), "cvm", "h", "{}", at(1551113066)));
        assert_ne!(base, authorization(&credential(), "redis", "h", "{}", at(1551113065)));
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", credential());
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("example-key"));
        assert!(!debug.contains("session"));
    }
}
