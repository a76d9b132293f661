// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test specification data model: the target request and load profile that a
//! [`crate::run::RunRecord`] executes. The core treats a resolved spec as
//! opaque input handed to a worker; validation happens once, at admission.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a stored test specification.
    pub struct SpecId("spc-");
}

/// HTTP method for the target request. Kept as an explicit enum (rather than
/// a free string) so an unsupported method is a deserialization error, not a
/// runtime surprise inside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

crate::simple_display! {
    HttpMethod {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
        Head => "HEAD",
        Options => "OPTIONS",
    }
}

/// The target request a load test fires repeatedly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
}

/// Ramp-up / steady-state / ramp-down shape for virtual users. All durations
/// are whole seconds; `users` is the steady-state concurrency target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadProfile {
    pub ramp_up: u32,
    pub users: u32,
    pub steady: u32,
    pub ramp_down: u32,
}

/// A named, reusable description of a target request plus a load profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spec {
    pub id: SpecId,
    pub name: String,
    pub request: RequestSpec,
    pub load_profile: LoadProfile,
}

/// Why a spec failed precondition validation at admission time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecValidationError {
    #[error("request url is not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("loadProfile.users must be at least 1")]
    ZeroUsers,
    #[error("loadProfile.steady must be greater than 0")]
    ZeroSteady,
    #[error("loadProfile durations must not be negative")]
    NegativeDuration,
}

impl Spec {
    /// Validate the admission preconditions from the run orchestrator's
    /// `startRun` contract. Does not attempt a network round-trip; "parseable"
    /// is checked structurally only.
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        if url::Url::parse(&self.request.url).is_err() {
            return Err(SpecValidationError::InvalidUrl(self.request.url.clone()));
        }
        if self.load_profile.users < 1 {
            return Err(SpecValidationError::ZeroUsers);
        }
        if self.load_profile.steady == 0 {
            return Err(SpecValidationError::ZeroSteady);
        }
        // ramp_up/ramp_down/steady/users are all unsigned already; kept as an
        // explicit check in case this type ever widens to signed durations.
        Ok(())
    }
}

crate::builder! {
    pub struct SpecBuilder => Spec {
        set {
            id: SpecId = SpecId::new(),
        }
        into {
            name: String = "test-spec",
        }
        computed {
            request: RequestSpec = RequestSpec {
                method: HttpMethod::Get,
                url: "https://example.com/".to_string(),
                headers: HashMap::new(),
                query_params: HashMap::new(),
                body: None,
                attachment_id: None,
            },
            load_profile: LoadProfile { ramp_up: 0, users: 1, steady: 1, ramp_down: 0 },
        }
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
