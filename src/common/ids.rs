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

use std::fmt::Display;

use anyhow::{anyhow, Result};
use crypto::{digest::Digest, md5::Md5};

/// Separator of the components of a composite resource id
pub const FILED_SP: &str = "#";

pub fn build_id<I, T>(parts: I, sep: &str) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    parts
        .into_iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Split a composite id back into exactly `N` non-empty components
pub fn parse_id<'a, const N: usize>(id: &'a str, sep: &str) -> Result<[&'a str; N]> {
    let parts: Vec<&str> = id.split(sep).collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(anyhow!("id is broken, {id}: empty component"));
    }
    parts.try_into().map_err(|parts: Vec<&str>| {
        anyhow!(
            "id is broken, {id}: expected {N} components separated by `{sep}`, got {}",
            parts.len()
        )
    })
}

/// Stable id for a data source result, derived from the ids of its rows
pub fn data_resource_ids_hash<T: AsRef<str>>(ids: &[T]) -> String {
    let joined = ids.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>().join("-");

    let mut digest = Md5::new();
    digest.input_str(&joined);
    let mut sum = [0u8; 16];
    digest.result(&mut sum);

    u32::from_be_bytes([sum[0], sum[1], sum[2], sum[3]]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_round_trip() {
        let id = build_id(["crs-X", "sg-Y"], FILED_SP);
        assert_eq!(id, "crs-X#sg-Y");

        let [instance_id, security_group_id] = parse_id::<2>(&id, FILED_SP).unwrap();
        assert_eq!(instance_id, "crs-X");
        assert_eq!(security_group_id, "sg-Y");
    }

    #[test]
    fn three_part_id_round_trip() {
        let id = build_id(["listener-1", "HTTPS", "www.qq.com"], "+");
        assert_eq!(
            parse_id::<3>(&id, "+").unwrap(),
            ["listener-1", "HTTPS", "www.qq.com"]
        );
    }

    #[test]
    fn broken_ids_are_rejected() {
        assert!(parse_id::<2>("crs-X", FILED_SP).is_err());
        assert!(parse_id::<2>("crs-X#sg-Y#extra", FILED_SP).is_err());
        assert!(parse_id::<2>("#sg-Y", FILED_SP).is_err());

        let err = parse_id::<2>("crs-X", FILED_SP).unwrap_err();
        assert!(err.to_string().contains("id is broken"));
    }

    #[test]
    fn ids_hash_is_stable_and_order_sensitive() {
        let first = data_resource_ids_hash(&["crs-1", "crs-2"]);
        assert_eq!(first, data_resource_ids_hash(&["crs-1", "crs-2"]));
        assert_ne!(first, data_resource_ids_hash(&["crs-2", "crs-1"]));
        assert!(first.parse::<u32>().is_ok());
    }

    #[test]
    fn empty_result_still_has_an_id() {
        let empty: [&str; 0] = [];
        assert!(!data_resource_ids_hash(&empty).is_empty());
    }
}
