// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loadtest_core::test_support::test_spec;

#[tokio::test]
async fn resolves_an_inserted_spec() {
    let resolver = StaticSpecResolver::new();
    let spec = test_spec("s1", 2, 4);
    resolver.insert(spec.clone());

    let resolved = resolver.resolve(spec.id).await.expect("resolve");
    assert_eq!(resolved.id, spec.id);
}

#[tokio::test]
async fn unknown_spec_id_is_not_found() {
    let resolver = StaticSpecResolver::new();
    let err = resolver.resolve(loadtest_core::SpecId::new()).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound));
}

#[tokio::test]
async fn invalid_spec_is_rejected_at_resolve_time() {
    let resolver = StaticSpecResolver::new();
    let mut spec = test_spec("s2", 0, 4);
    spec.load_profile.users = 0;
    resolver.insert(spec.clone());

    let err = resolver.resolve(spec.id).await.unwrap_err();
    assert!(matches!(err, ResolveError::Invalid(_)));
}
