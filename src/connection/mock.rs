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

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, Connection, SdkError};

#[derive(Debug, Clone)]
enum Canned {
    Response(Value),
    Error { code: String, message: String },
}

/// Scripted connection: each action replays its queued answers in order and
/// keeps repeating the last one.
#[derive(Debug, Default)]
pub struct MockConnection {
    answers: Mutex<HashMap<String, VecDeque<Canned>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the content of a successful `Response` object
    pub fn respond(&self, action: &str, response: Value) -> &Self {
        self.push(action, Canned::Response(response))
    }

    pub fn fail(&self, action: &str, code: &str, message: &str) -> &Self {
        self.push(
            action,
            Canned::Error {
                code: code.to_owned(),
                message: message.to_owned(),
            },
        )
    }

    fn push(&self, action: &str, canned: Canned) -> &Self {
        self.answers
            .lock()
            .unwrap()
            .entry(action.to_owned())
            .or_default()
            .push_back(canned);
        self
    }

    /// Every call received so far, with its decoded payload
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|(action, _)| action).collect()
    }

    /// Payloads sent to `action`
    pub fn payloads(&self, action: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(a, _)| a == action)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn call(&self, request: &ApiRequest<'_>) -> Result<Value, SdkError> {
        let payload = serde_json::from_str(&request.payload).unwrap_or(Value::Null);
        self.calls
            .lock()
            .unwrap()
            .push((request.action.to_owned(), payload));

        let canned = {
            let mut answers = self.answers.lock().unwrap();
            match answers.get_mut(request.action) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match canned {
            Some(Canned::Response(mut response)) => {
                if let Value::Object(map) = &mut response {
                    map.entry("RequestId")
                        .or_insert_with(|| Value::String("mock-request".into()));
                }
                Ok(response)
            }
            Some(Canned::Error { code, message }) => Err(SdkError::Api {
                code,
                message,
                request_id: "mock-request".into(),
            }),
            None => Err(SdkError::Api {
                code: "MockError.UnexpectedAction".into(),
                message: format!("no answer scripted for {}", request.action),
                request_id: "mock-request".into(),
            }),
        }
    }
}
