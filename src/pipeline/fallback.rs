// src/pipeline/fallback.rs

//! Ordered "first success wins" chains of alternative methods.

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::Result;

/// A named alternative. `Ok(Some(_))` is success; `Ok(None)` and `Err`
/// both move on to the next alternative.
pub type Step<'a, T> = (&'static str, BoxFuture<'a, Result<Option<T>>>);

/// Wrap a future as a named step. The future is not polled until its turn.
pub fn step<'a, T, F>(name: &'static str, future: F) -> Step<'a, T>
where
    F: Future<Output = Result<Option<T>>> + Send + 'a,
{
    (name, future.boxed())
}

/// Result of running a chain of steps.
#[derive(Debug)]
pub enum Outcome<T> {
    Succeeded { value: T, method: &'static str },
    /// Every step failed; one entry per step, in order
    Exhausted { tried: Vec<String> },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// Run `steps` in order and stop at the first success.
pub async fn first_success<T>(context: &str, steps: Vec<Step<'_, T>>) -> Outcome<T> {
    let mut tried = Vec::with_capacity(steps.len());

    for (name, future) in steps {
        match future.await {
            Ok(Some(value)) => {
                log::info!("[{context}] succeeded via {name}");
                return Outcome::Succeeded {
                    value,
                    method: name,
                };
            }
            Ok(None) => {
                log::debug!("[{context}] {name} had no effect");
                tried.push(name.to_string());
            }
            Err(e) => {
                log::debug!("[{context}] {name} failed: {e}");
                tried.push(format!("{name}: {e}"));
            }
        }
    }

    log::warn!("[{context}] every method failed");
    Outcome::Exhausted { tried }
}
