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
use tf_provider::serve;
use tracing_subscriber::EnvFilter;

mod client;
mod common;
mod connection;
mod data_source;
mod resource;
mod services;
mod tencentcloud_provider;
mod utils;

use tencentcloud_provider::TencentCloudProvider;

/// Level used when `RUST_LOG` is not set, derived from Terraform's own `TF_LOG`
fn default_directive() -> &'static str {
    match std::env::var("TF_LOG")
        .unwrap_or_default()
        .to_ascii_uppercase()
        .as_str()
    {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for the plugin handshake
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    serve("tencentcloud", TencentCloudProvider::default()).await
}
