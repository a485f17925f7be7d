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

use thiserror::Error;

pub const NETWORK_ERROR: &str = "ClientError.NetworkError";
pub const HTTP_STATUS_ERROR: &str = "ClientError.HttpStatusCodeError";
pub const DECODE_ERROR: &str = "ClientError.ParseJsonError";
pub const ENCODE_ERROR: &str = "ClientError.EncodeError";

/// Failure of one cloud API call
#[derive(Debug, Error)]
pub enum SdkError {
    /// Error returned by the service inside the response envelope
    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("[TencentCloudSDKError] Code=ClientError.NetworkError, Message={0}")]
    Network(String),

    #[error("[TencentCloudSDKError] Code=ClientError.HttpStatusCodeError, Message=status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("[TencentCloudSDKError] Code=ClientError.ParseJsonError, Message=cannot decode {action} response: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("[TencentCloudSDKError] Code=ClientError.EncodeError, Message=cannot encode {action} request: {source}")]
    Encode {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SdkError {
    pub fn code(&self) -> &str {
        match self {
            SdkError::Api { code, .. } => code,
            SdkError::Network(_) => NETWORK_ERROR,
            SdkError::HttpStatus { .. } => HTTP_STATUS_ERROR,
            SdkError::Decode { .. } => DECODE_ERROR,
            SdkError::Encode { .. } => ENCODE_ERROR,
        }
    }

    /// The addressed object does not exist (any `ResourceNotFound*` code)
    pub fn is_not_found(&self) -> bool {
        self.code().starts_with("ResourceNotFound")
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(err: reqwest::Error) -> Self {
        SdkError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_of_client_side_errors() {
        assert_eq!(SdkError::Network("reset".into()).code(), NETWORK_ERROR);
        assert_eq!(
            SdkError::HttpStatus {
                status: 502,
                body: String::new()
            }
            .code(),
            HTTP_STATUS_ERROR
        );
    }

    #[test]
    fn not_found_matches_the_whole_category() {
        let err = SdkError::Api {
            code: "ResourceNotFound.InstanceNotExists".into(),
            message: "gone".into(),
            request_id: "r-1".into(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("RequestId=r-1"));
        assert!(!SdkError::Network("x".into()).is_not_found());
    }
}
