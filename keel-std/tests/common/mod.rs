#![allow(dead_code)]

use futures::future::BoxFuture;
use keel_std::keel_core::{BoxError, Event, Hook, Next, OperationContext, Terminal};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Event Types
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct CreateAdmin {
    pub ctx: OperationContext,
    pub email: String,
    pub id: Option<usize>,
}

impl CreateAdmin {
    pub fn new(email: &str) -> Self {
        Self {
            ctx: OperationContext::new(),
            email: email.to_string(),
            id: None,
        }
    }
}

impl Event for CreateAdmin {
    fn context(&self) -> &OperationContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut OperationContext {
        &mut self.ctx
    }
}

// ============================================================================
// Store + Terminal
// ============================================================================

#[derive(Clone, Default)]
pub struct AdminStore {
    pub emails: Arc<Mutex<Vec<String>>>,
}

impl AdminStore {
    pub fn contains(&self, email: &str) -> bool {
        self.emails.lock().unwrap().iter().any(|e| e == email)
    }

    pub fn len(&self) -> usize {
        self.emails.lock().unwrap().len()
    }
}

/// Terminal that persists the admin and fills in its id.
pub struct SaveAdmin(pub AdminStore);

impl Terminal<CreateAdmin> for SaveAdmin {
    fn commit<'a>(&'a self, event: &'a mut CreateAdmin) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let mut emails = self.0.emails.lock().unwrap();
            emails.push(event.email.clone());
            event.id = Some(emails.len());
            Ok(())
        })
    }
}

// ============================================================================
// Hooks
// ============================================================================

pub struct RejectDuplicates(pub AdminStore);

impl Hook<CreateAdmin> for RejectDuplicates {
    async fn handle(
        &self,
        event: &mut CreateAdmin,
        next: Next<'_, CreateAdmin>,
    ) -> Result<(), BoxError> {
        if self.0.contains(&event.email) {
            return Err(format!("email `{}` is already in use", event.email).into());
        }
        next.run(event).await
    }
}

pub struct Lowercase;

impl Hook<CreateAdmin> for Lowercase {
    async fn handle(
        &self,
        event: &mut CreateAdmin,
        next: Next<'_, CreateAdmin>,
    ) -> Result<(), BoxError> {
        event.email = event.email.to_lowercase();
        next.run(event).await
    }
}
