// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Spec Resolver (§4.5): the collaborator boundary between the core
//! orchestrator and wherever specs actually live (a CRUD service, schema
//! validator, and attachment store — all out of scope per §1). The core only
//! ever sees `resolve`.

use loadtest_core::{Spec, SpecId, SpecValidationError};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("spec not found")]
    NotFound,
    #[error("spec invalid: {0}")]
    Invalid(#[from] SpecValidationError),
}

#[async_trait::async_trait]
pub trait SpecResolver: Send + Sync {
    async fn resolve(&self, id: SpecId) -> Result<Spec, ResolveError>;
}

/// In-memory `SpecResolver` used by the Orchestrator's own tests so admission
/// and validation logic is testable without a real CRUD backend. A
/// production deployment supplies its own resolver instead.
pub struct StaticSpecResolver {
    specs: Mutex<HashMap<SpecId, Spec>>,
}

impl StaticSpecResolver {
    pub fn new() -> Self {
        Self { specs: Mutex::new(HashMap::new()) }
    }

    pub fn insert(&self, spec: Spec) {
        self.specs.lock().insert(spec.id, spec);
    }
}

impl Default for StaticSpecResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpecResolver for StaticSpecResolver {
    async fn resolve(&self, id: SpecId) -> Result<Spec, ResolveError> {
        let spec = self.specs.lock().get(&id).cloned().ok_or(ResolveError::NotFound)?;
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
