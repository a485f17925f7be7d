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

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Dump a data source result as indented JSON, creating missing parent directories
pub async fn write_to_file(path: &str, data: &impl Serialize) -> Result<()> {
    let path = expand_home(path);
    let content = serde_json::to_string_pretty(data).context("failed to encode result")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory `{}`", parent.display()))?;
    }
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("failed to write `{}`", path.display()))?;

    tracing::debug!(path = %path.display(), "result written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_pretty_json_into_new_directory() {
        let dir = std::env::temp_dir().join(format!("tc-output-{}", crate::common::log_id()));
        let path = dir.join("nested").join("result.json");
        let rows = serde_json::json!([{ "redis_id": "crs-1" }]);

        write_to_file(path.to_str().unwrap(), &rows).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("\n"));
        assert_eq!(serde_json::from_str::<serde_json::Value>(&content).unwrap(), rows);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn home_prefix_is_expanded() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/out.json"), PathBuf::from(home).join("out.json"));
        }
        assert_eq!(expand_home("/tmp/out.json"), PathBuf::from("/tmp/out.json"));
    }
}
