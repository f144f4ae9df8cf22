#![allow(dead_code)]

use futures::future::BoxFuture;
use keel::{
    BoxError, FieldDef, FieldResolver, Hook, MemoryCollection, Next, Terminal,
    events::ModelEvent,
    keel_search::{Value, parse_filter},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub created: String,
}

impl Admin {
    pub fn new(email: &str, created: &str) -> Self {
        Self {
            id: String::new(),
            email: email.to_string(),
            created: created.to_string(),
        }
    }

    pub fn from_row(row: serde_json::Value) -> Self {
        serde_json::from_value(row).unwrap()
    }
}

pub fn admin_resolver() -> FieldResolver {
    FieldResolver::builder()
        .field(FieldDef::text("id"))
        .field(FieldDef::text("email"))
        .field(FieldDef::datetime("created"))
        .search_on("email")
        .build()
        .unwrap()
}

// ============================================================================
// Store + Terminal
// ============================================================================

#[derive(Clone)]
pub struct AdminTable(pub Arc<MemoryCollection>);

impl AdminTable {
    pub fn new() -> Self {
        Self(Arc::new(MemoryCollection::new("admins")))
    }
}

/// Assigns an id and stores the admin.
pub struct SaveAdmin(pub AdminTable);

impl Terminal<ModelEvent<Admin>> for SaveAdmin {
    fn commit<'a>(
        &'a self,
        event: &'a mut ModelEvent<Admin>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            event.model.id = format!("a{}", self.0.0.len() + 1);
            self.0.0.insert_json(serde_json::to_value(&event.model)?);
            Ok(())
        })
    }
}

// ============================================================================
// Hooks
// ============================================================================

pub struct RejectDuplicateEmail {
    pub table: AdminTable,
    pub resolver: FieldResolver,
}

impl Hook<ModelEvent<Admin>> for RejectDuplicateEmail {
    async fn handle(
        &self,
        event: &mut ModelEvent<Admin>,
        next: Next<'_, ModelEvent<Admin>>,
    ) -> Result<(), BoxError> {
        let email = Value::from(event.model.email.as_str());
        let taken = parse_filter(&self.resolver, &format!("email = {email}"))?;
        if self.table.0.any(&taken) {
            return Err(format!("email {} is already in use", event.model.email).into());
        }
        next.run(event).await
    }
}

/// Captures what a response-producing terminal wrote.
#[derive(Clone, Default)]
pub struct Response(pub Arc<Mutex<Option<serde_json::Value>>>);

impl Response {
    pub fn body(&self) -> Option<serde_json::Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn write(&self, body: serde_json::Value) {
        *self.0.lock().unwrap() = Some(body);
    }
}
