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

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::connection::SdkError;

const RETRYABLE_CODES: &[&str] = &[
    "ClientError.NetworkError",
    "ClientError.HttpStatusCodeError",
    "FailedOperation",
    "InternalError",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
];

/// Codes whose prefix is retryable but which never succeed on a second attempt
const NON_RETRYABLE_CODES: &[&str] = &["FailedOperation.SystemError", "FailedOperation.UnSupportError"];

const MIN_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("{0:#}")]
    Retryable(anyhow::Error),
    #[error("{0:#}")]
    NonRetryable(anyhow::Error),
}

impl RetryError {
    pub fn retryable(err: impl Into<anyhow::Error>) -> Self {
        Self::Retryable(err.into())
    }

    pub fn non_retryable(err: impl Into<anyhow::Error>) -> Self {
        Self::NonRetryable(err.into())
    }
}

/// `code` matches when it, or its category before the first `.`, is listed
fn is_expected_error(code: &str, expected: &[&str]) -> bool {
    let category = code.split('.').next().unwrap_or(code);
    expected
        .iter()
        .any(|candidate| *candidate == code || *candidate == category)
}

/// Classify an API error for [`retry`]; `additional` extends the transient codes
pub fn retry_error(err: SdkError, additional: &[&str]) -> RetryError {
    let code = err.code();
    if NON_RETRYABLE_CODES.contains(&code) {
        return RetryError::non_retryable(err);
    }
    if is_expected_error(code, RETRYABLE_CODES) || is_expected_error(code, additional) {
        tracing::debug!(code, "transient error, will retry");
        RetryError::retryable(err)
    } else {
        RetryError::non_retryable(err)
    }
}

/// Call `operation` until it succeeds, fails permanently, or `timeout` elapses.
///
/// The wait between attempts doubles from 500ms up to 10s and never overshoots
/// the deadline; the last error is returned once the budget is spent.
pub async fn retry<T, F, Fut>(timeout: Duration, mut operation: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let deadline = Instant::now() + timeout;
    let mut backoff = MIN_BACKOFF;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(err)) => return Err(err),
            Err(RetryError::Retryable(err)) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(err.context(format!(
                        "still failing after {attempt} attempts in {timeout:?}"
                    )));
                }
                tracing::debug!(attempt, reason = %format!("{err:#}"), "retrying");
                sleep(backoff.min(deadline - now)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}
