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

use super::{retry, RetryError};

/// Fetch `Offset`/`Limit` pages until one comes back shorter than `page_size`.
///
/// Each page is fetched under [`retry`] with the given budget.
pub async fn paginate<T, F, Fut>(page_size: u64, timeout: Duration, mut fetch: F) -> anyhow::Result<Vec<T>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, RetryError>>,
{
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = retry(timeout, || fetch(offset)).await?;
        let count = page.len() as u64;
        items.extend(page);
        if count < page_size {
            return Ok(items);
        }
        offset += count;
    }
}
