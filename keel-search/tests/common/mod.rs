#![allow(dead_code)]

use async_trait::async_trait;
use keel_core::BoxError;
use keel_search::{Collection, CountQuery, FieldResolver, MemoryCollection, SelectQuery};
use serde_json::json;
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

pub fn admin_resolver() -> FieldResolver {
    FieldResolver::new(["id", "created", "updated", "name", "email"]).unwrap()
}

/// Ten admins: `admin0` .. `admin9`, all at `acme.io`.
pub fn admins() -> MemoryCollection {
    let admins = MemoryCollection::new("admins");
    for i in 0..10 {
        admins.insert_json(json!({
            "id": format!("id{i}"),
            "name": format!("admin{i}"),
            "email": format!("admin{i}@acme.io"),
            "created": format!("2024-01-{:02} 10:00:00", i + 1),
        }));
    }
    admins
}

// ============================================================================
// Misbehaving stores
// ============================================================================

pub struct BrokenCollection;

#[async_trait]
impl Collection for BrokenCollection {
    type Item = ();

    fn name(&self) -> &str {
        "broken"
    }

    async fn fetch(&self, _query: &SelectQuery) -> Result<Vec<()>, BoxError> {
        Err("connection reset".into())
    }

    async fn count(&self, _query: &CountQuery) -> Result<u64, BoxError> {
        Ok(0)
    }
}

pub struct SlowCollection(pub Duration);

#[async_trait]
impl Collection for SlowCollection {
    type Item = ();

    fn name(&self) -> &str {
        "slow"
    }

    async fn fetch(&self, _query: &SelectQuery) -> Result<Vec<()>, BoxError> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }

    async fn count(&self, _query: &CountQuery) -> Result<u64, BoxError> {
        tokio::time::sleep(self.0).await;
        Ok(0)
    }
}
