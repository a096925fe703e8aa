// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
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

//! The JSON messages that the calc http api accepts and returns.
//!
//! Protocol structs are always bare structs, methods get mixed in
//! by the server where needed.

use serde_derive::{Deserialize, Serialize};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The body of a calculate call.
///
/// A missing or malformed `expression` field causes the whole
/// request to be rejected, there is no default.
#[derive(Serialize, Deserialize, Debug)]
pub struct CalculateRequest {
    pub expression: String,
}

/// The envelope for a successful evaluation.
///
/// The result is formatted by the server rather than returned as a
/// raw number so that clients see a stable rendering regardless of
/// how they parse floats.
#[derive(Serialize, Deserialize, Debug)]
pub struct CalculateResponse {
    pub result: String,
}

/// The envelope for any failed call.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
