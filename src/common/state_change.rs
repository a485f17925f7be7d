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
use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::{sleep, Instant};

/// Poll a refresh function until the observed status reaches a target.
///
/// Statuses are typed: each service exposes an enum for its task, flow or
/// instance states and the configuration lists which values end the wait.
#[derive(Debug, Clone)]
pub struct StateChangeConf<S> {
    what: String,
    pending: Vec<S>,
    target: Vec<S>,
    fail: Vec<S>,
    timeout: Duration,
    poll_interval: Duration,
}

impl<S: PartialEq + Debug> StateChangeConf<S> {
    pub fn new(what: impl Into<String>, target: impl IntoIterator<Item = S>, timeout: Duration) -> Self {
        Self {
            what: what.into(),
            pending: Vec::new(),
            target: target.into_iter().collect(),
            fail: Vec::new(),
            timeout,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Statuses allowed while waiting; anything else is an error.
    /// When empty, every non-target status keeps the wait going.
    pub fn pending(mut self, pending: impl IntoIterator<Item = S>) -> Self {
        self.pending = pending.into_iter().collect();
        self
    }

    pub fn fail_on(mut self, fail: impl IntoIterator<Item = S>) -> Self {
        self.fail = fail.into_iter().collect();
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn wait<T, F, Fut>(&self, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, S)>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            let (value, status) = refresh().await?;

            if self.target.contains(&status) {
                tracing::debug!(what = %self.what, ?status, "target state reached");
                return Ok(value);
            }
            if self.fail.contains(&status) {
                bail!("{} failed with status {status:?}", self.what);
            }
            if !self.pending.is_empty() && !self.pending.contains(&status) {
                bail!("{} reached unexpected status {status:?}", self.what);
            }

            if Instant::now() + self.poll_interval > deadline {
                bail!(
                    "{} is still processing after {:?}, last status {status:?}",
                    self.what,
                    self.timeout
                );
            }
            tracing::trace!(what = %self.what, ?status, "waiting for state change");
            sleep(self.poll_interval).await;
        }
    }
}
