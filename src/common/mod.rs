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
use std::time::Instant;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use thiserror::Error;
use tracing::Instrument;

use crate::connection::SdkError;

mod ids;
mod output;
mod pages;
mod ratelimit;
mod retry;
mod state_change;

pub use ids::{build_id, data_resource_ids_hash, parse_id, FILED_SP};
pub use output::write_to_file;
pub use pages::paginate;
pub use ratelimit::RateLimiter;
pub use retry::{retry, retry_error, RetryError};
pub use state_change::StateChangeConf;

/// Argument rejected before reaching the API
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InvalidArgument {
    pub field: &'static str,
    pub message: String,
}

pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> anyhow::Error {
    InvalidArgument {
        field,
        message: message.into(),
    }
    .into()
}

/// Whether a handler error comes from a `ResourceNotFound` API answer
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SdkError>()
        .is_some_and(SdkError::is_not_found)
}

/// Random id correlating every log line of one operation
pub fn log_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Run one resource operation inside its own span and log how long it took
pub async fn instrumented<F: Future>(kind: &str, operation: &str, fut: F) -> F::Output {
    let span = tracing::info_span!("operation", kind, operation, log_id = %log_id());
    let start = Instant::now();
    let output = fut.instrument(span.clone()).await;
    span.in_scope(|| {
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "{kind}.{operation} finished"
        )
    });
    output
}
