//! Pre-built fixtures for deploy scenarios.

use fnship_cloud::{DeploymentTarget, RemoteResource, ResourceKind};
use serde_json::json;
use std::path::Path;

/// A python function named `hello` shipped from `dir`.
pub fn sample_target(dir: &Path) -> DeploymentTarget {
    DeploymentTarget::new("hello", dir, "python3.9", "handler")
}

/// `{ "items": [{ "id", "name" }] }` listing body.
pub fn listing(items: &[(&str, &str)]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|(name, id)| json!({ "id": id, "name": name }))
        .collect();
    json!({ "items": items })
}

/// `{ "id" }` body returned by create commands.
pub fn created(id: &str) -> serde_json::Value {
    json!({ "id": id, "name": "fnship-apigateway" })
}

/// A routing resource confirmed to exist.
pub fn routing_resource(id: &str) -> RemoteResource {
    RemoteResource::present(ResourceKind::RoutingResource, "fnship-apigateway", Some(id.to_string()))
}
