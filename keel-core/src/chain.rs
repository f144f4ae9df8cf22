//! # Interceptor Chain
//!
//! Composition of hooks around a terminal action.
//!
//! The chain is a slice of hooks in registration order plus a terminal. It is
//! not a tower of closures: [`Next`] holds the *remaining* slice and, when
//! run, hands the head hook a `Next` over the tail. When the slice is empty,
//! running `Next` commits the terminal.
//!
//! ```text
//! run(A) ─► A.handle(e, next[B]) ─► B.handle(e, next[]) ─► terminal.commit(e)
//!              ◄── post-process ◄────────── result ◄───────────────┘
//! ```
//!
//! `Next` is consumed by [`Next::run`], so each layer can continue the chain
//! at most once and the terminal commits at most once per [`Chain::run`].

use crate::{
    error::BoxError,
    hook::{DynHook, Terminal},
    message::Message,
};
use futures::future::BoxFuture;
use std::sync::Arc;

/// The continuation handed to each hook.
pub struct Next<'a, E: Message> {
    rest: &'a [Arc<dyn DynHook<E>>],
    terminal: &'a dyn Terminal<E>,
}

impl<'a, E: Message> Next<'a, E> {
    /// Continue with the inner layers of the chain.
    pub fn run(self, event: &'a mut E) -> BoxFuture<'a, Result<(), BoxError>> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle_dyn(
                event,
                Next {
                    rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.commit(event),
        }
    }

    /// Number of layers still ahead, terminal excluded.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

impl<E: Message> Next<'static, E> {
    /// A continuation that ends the chain without any side effect.
    ///
    /// Used to invoke a single hook in isolation (after-phases, tests).
    pub fn noop() -> Self {
        Next {
            rest: &[],
            terminal: &Noop,
        }
    }
}

/// Terminal that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl<E> Terminal<E> for Noop {
    fn commit<'a>(&'a self, _event: &'a mut E) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async { Ok(()) })
    }
}

/// An ordered list of hooks wrapped around a terminal action.
pub struct Chain<'a, E: Message> {
    hooks: &'a [Arc<dyn DynHook<E>>],
    terminal: &'a dyn Terminal<E>,
}

impl<'a, E: Message> Chain<'a, E> {
    /// Build a chain. `hooks[0]` is the outermost layer.
    pub fn new(hooks: &'a [Arc<dyn DynHook<E>>], terminal: &'a dyn Terminal<E>) -> Self {
        Self { hooks, terminal }
    }

    /// Number of hook layers.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the chain is only the terminal.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Invoke the chain once.
    pub async fn run(self, event: &mut E) -> Result<(), BoxError> {
        Next {
            rest: self.hooks,
            terminal: self.terminal,
        }
        .run(event)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{Hook, terminal_fn};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Trace {
        steps: Vec<String>,
    }

    struct Layer {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Hook<Trace> for Layer {
        async fn handle(&self, event: &mut Trace, next: Next<'_, Trace>) -> Result<(), BoxError> {
            event.steps.push(format!("{}:in", self.name));
            let result = next.run(event).await;
            event.steps.push(format!("{}:out", self.name));
            self.log.lock().unwrap().push(self.name.to_string());
            result
        }
    }

    struct Veto;

    impl Hook<Trace> for Veto {
        async fn handle(&self, event: &mut Trace, _next: Next<'_, Trace>) -> Result<(), BoxError> {
            event.steps.push("veto".into());
            Err("vetoed".into())
        }
    }

    fn commit_terminal() -> impl Terminal<Trace> {
        terminal_fn(|event: &mut Trace| {
            Box::pin(async move {
                event.steps.push("commit".into());
                Ok::<_, BoxError>(())
            })
        })
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Arc<dyn DynHook<Trace>>> = vec![
            Arc::new(Layer {
                name: "a",
                log: log.clone(),
            }),
            Arc::new(Layer {
                name: "b",
                log: log.clone(),
            }),
        ];
        let terminal = commit_terminal();
        let mut event = Trace::default();

        Chain::new(&hooks, &terminal).run(&mut event).await.unwrap();

        assert_eq!(
            event.steps,
            vec!["a:in", "b:in", "commit", "b:out", "a:out"]
        );
        assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Arc<dyn DynHook<Trace>>> = vec![
            Arc::new(Layer {
                name: "a",
                log: log.clone(),
            }),
            Arc::new(Veto),
        ];
        let terminal = commit_terminal();
        let mut event = Trace::default();

        let result = Chain::new(&hooks, &terminal).run(&mut event).await;

        assert_eq!(result.unwrap_err().to_string(), "vetoed");
        assert_eq!(event.steps, vec!["a:in", "veto", "a:out"]);
    }

    #[tokio::test]
    async fn test_empty_chain_commits() {
        let hooks: Vec<Arc<dyn DynHook<Trace>>> = Vec::new();
        let terminal = commit_terminal();
        let chain = Chain::new(&hooks, &terminal);
        assert!(chain.is_empty());

        let mut event = Trace::default();
        chain.run(&mut event).await.unwrap();
        assert_eq!(event.steps, vec!["commit"]);
    }

    #[tokio::test]
    async fn test_noop_next() {
        let next = Next::<Trace>::noop();
        assert_eq!(next.remaining(), 0);
        let mut event = Trace::default();
        next.run(&mut event).await.unwrap();
        assert!(event.steps.is_empty());
    }
}
