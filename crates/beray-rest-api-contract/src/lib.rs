// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! BeRay REST API contract types
//!
//! This crate defines the request and response bodies exchanged with the
//! BeRay task orchestration service under `/api/v1`. The types are shared
//! between the REST client, the CLI and the mock servers used in tests.
//!
//! Response types keep any fields they do not model in an `extra` map, so a
//! value read from the server serializes back to the same JSON object.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
