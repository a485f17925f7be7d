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

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};

use crate::common::invalid_argument;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) type StringSet<'a> = Value<BTreeSet<ValueString<'a>>>;
pub(crate) type NumberSet = Value<BTreeSet<ValueNumber>>;

/// List the fields whose value differs between two states.
///
/// Field names are the schema attribute names, so the result can be matched
/// against immutable and force-new argument lists.
macro_rules! changed_fields {
    ($prior:expr, $planned:expr; $($field:ident),+ $(,)?) => {{
        let mut changed: Vec<&'static str> = Vec::new();
        $(
            if $prior.$field != $planned.$field {
                changed.push(stringify!($field));
            }
        )+
        changed
    }};
}
pub(crate) use changed_fields;

pub(crate) fn schema(
    description: &str,
    attributes: HashMap<String, Attribute>,
    blocks: HashMap<String, NestedBlock>,
) -> Schema {
    Schema {
        version: 1,
        block: Block {
            version: 1,
            attributes,
            blocks,
            description: Description::plain(description),
            ..Default::default()
        },
    }
}

pub(crate) fn block(description: &str, attributes: HashMap<String, Attribute>) -> Block {
    Block {
        attributes,
        description: Description::plain(description),
        ..Default::default()
    }
}

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn string(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(AttributeType::String, constraint, description)
}

pub(crate) fn number(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(AttributeType::Number, constraint, description)
}

pub(crate) fn boolean(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(AttributeType::Bool, constraint, description)
}

pub(crate) fn string_set(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::Set(AttributeType::String.into()),
        constraint,
        description,
    )
}

pub(crate) fn string_list(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::List(AttributeType::String.into()),
        constraint,
        description,
    )
}

pub(crate) fn number_set(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::Set(AttributeType::Number.into()),
        constraint,
        description,
    )
}

pub(crate) fn number_list(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::List(AttributeType::Number.into()),
        constraint,
        description,
    )
}

pub(crate) fn string_map(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::Map(AttributeType::String.into()),
        constraint,
        description,
    )
}

/// Computed list of objects, used by data sources to expose result sets
pub(crate) fn object_list(description: &str, attributes: HashMap<String, Attribute>) -> Attribute {
    attribute(
        AttributeType::AttributeList(attributes),
        AttributeConstraint::Computed,
        description,
    )
}

pub(crate) fn sensitive(mut attribute: Attribute) -> Attribute {
    attribute.sensitive = true;
    attribute
}

/// Known and non-empty string
pub(crate) fn get_str<'b>(value: &'b ValueString<'_>) -> Option<&'b str> {
    match value {
        Value::Value(s) if !s.is_empty() => Some(s.as_ref()),
        _ => None,
    }
}

pub(crate) fn get_i64(value: &ValueNumber) -> Option<i64> {
    match value {
        Value::Value(n) => Some(*n),
        _ => None,
    }
}

pub(crate) fn get_bool(value: &Value<bool>) -> bool {
    matches!(value, Value::Value(true))
}

pub(crate) fn get_str_list(value: &ValueList<ValueString<'_>>) -> Vec<String> {
    value
        .iter()
        .flatten()
        .filter_map(|item| get_str(item).map(str::to_owned))
        .collect()
}

pub(crate) fn get_str_set(value: &StringSet<'_>) -> Vec<String> {
    value
        .iter()
        .flatten()
        .filter_map(|item| get_str(item).map(str::to_owned))
        .collect()
}

/// Known entries of a string map, empty values included
pub(crate) fn get_str_map(value: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    value
        .iter()
        .flatten()
        .filter_map(|(key, item)| {
            item.as_ref_option()
                .map(|item| (key.to_string(), item.to_string()))
        })
        .collect()
}

pub(crate) fn get_i64_set(value: &NumberSet) -> Vec<i64> {
    value.iter().flatten().filter_map(get_i64).collect()
}

pub(crate) fn get_i64_list(value: &ValueList<ValueNumber>) -> Vec<i64> {
    value.iter().flatten().filter_map(get_i64).collect()
}

pub(crate) fn required_str<'b>(value: &'b ValueString<'_>, field: &'static str) -> Result<&'b str> {
    get_str(value).ok_or_else(|| invalid_argument(field, format!("`{field}` must be set")))
}

pub(crate) fn required_i64(value: &ValueNumber, field: &'static str) -> Result<i64> {
    get_i64(value).ok_or_else(|| invalid_argument(field, format!("`{field}` must be set")))
}

pub(crate) fn str_value<'a>(s: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(s.into()))
}

/// Null for absent or empty API strings
pub(crate) fn opt_str_value<'a>(s: Option<String>) -> ValueString<'a> {
    match s {
        Some(s) if !s.is_empty() => str_value(s),
        _ => Value::Null,
    }
}

pub(crate) fn str_list_value<'a>(items: impl IntoIterator<Item = String>) -> ValueList<ValueString<'a>> {
    Value::Value(items.into_iter().map(str_value).collect())
}

pub(crate) fn str_set_value<'a>(items: impl IntoIterator<Item = String>) -> StringSet<'a> {
    Value::Value(items.into_iter().map(str_value).collect())
}

pub(crate) fn str_map_value<'a>(items: impl IntoIterator<Item = (String, String)>) -> ValueMap<'a, ValueString<'a>> {
    Value::Value(
        items
            .into_iter()
            .map(|(key, item)| (Cow::Owned(key), str_value(item)))
            .collect(),
    )
}

pub(crate) fn i64_set_value(items: impl IntoIterator<Item = i64>) -> NumberSet {
    Value::Value(items.into_iter().map(Value::Value).collect())
}

pub(crate) fn set_default<T>(value: &mut Value<T>, default: T) {
    if value.is_null() {
        *value = Value::Value(default);
    }
}

/// Let the provider compute an optional attribute left out of the configuration
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample<'a> {
        name: ValueString<'a>,
        size: ValueNumber,
        flag: Value<bool>,
    }

    #[test]
    fn changed_fields_lists_differences_only() {
        let prior = Sample {
            name: str_value("a"),
            size: Value::Value(1),
            flag: Value::Value(false),
        };
        let planned = Sample {
            name: str_value("b"),
            size: Value::Value(1),
            flag: Value::Unknown,
        };

        let changed = changed_fields!(prior, planned; name, size, flag);
        assert_eq!(changed, vec!["name", "flag"]);
    }

    #[test]
    fn empty_strings_are_treated_as_unset() {
        assert_eq!(get_str(&str_value("")), None);
        assert_eq!(get_str(&Value::Unknown), None);
        assert_eq!(get_str(&str_value("x")), Some("x"));
        assert!(opt_str_value(Some(String::new())).is_null());
    }

    #[test]
    fn defaults_only_fill_null_values() {
        let mut sample = Sample {
            size: Value::Unknown,
            ..Default::default()
        };
        set_default(&mut sample.size, 3);
        set_default(&mut sample.flag, true);
        unknown_if_null(&mut sample.name);

        assert!(sample.size.is_unknown());
        assert_eq!(sample.flag, Value::Value(true));
        assert!(sample.name.is_unknown());
    }

    #[test]
    fn string_maps_skip_unknown_entries() {
        let mut map = str_map_value([("env".to_owned(), "prod".to_owned()), ("empty".to_owned(), String::new())]);
        if let Value::Value(entries) = &mut map {
            entries.insert(Cow::Borrowed("later"), Value::Unknown);
        }

        let read = get_str_map(&map);
        assert_eq!(read.len(), 2);
        assert_eq!(read["env"], "prod");
        assert_eq!(read["empty"], "");
        assert!(get_str_map(&Value::Null).is_empty());
    }
}
