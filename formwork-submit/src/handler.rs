//! Submission handlers and their registry.

use async_trait::async_trait;
use formwork_common::{FieldValues, Registration, Registry};
use formwork_fields::FormInstance;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Error type handlers may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler answered.
///
/// An empty reply (no message, or only blank messages) means the submission
/// succeeded. Any message means it failed with that message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HandlerReply {
    #[default]
    Accepted,
    Message(String),
    Messages(Vec<String>),
}

impl HandlerReply {
    /// The failure messages carried by the reply, blank ones dropped.
    pub fn failures(self) -> Vec<String> {
        let messages = match self {
            HandlerReply::Accepted => Vec::new(),
            HandlerReply::Message(message) => vec![message],
            HandlerReply::Messages(messages) => messages,
        };
        messages
            .into_iter()
            .filter(|m| !m.trim().is_empty())
            .collect()
    }
}

impl From<()> for HandlerReply {
    fn from(_: ()) -> Self {
        HandlerReply::Accepted
    }
}

impl From<String> for HandlerReply {
    fn from(message: String) -> Self {
        HandlerReply::Message(message)
    }
}

impl From<&str> for HandlerReply {
    fn from(message: &str) -> Self {
        HandlerReply::Message(message.to_string())
    }
}

impl From<Vec<String>> for HandlerReply {
    fn from(messages: Vec<String>) -> Self {
        HandlerReply::Messages(messages)
    }
}

impl<T: Into<HandlerReply>> From<Option<T>> for HandlerReply {
    fn from(reply: Option<T>) -> Self {
        reply.map(Into::into).unwrap_or_default()
    }
}

/// Receives the transformed values of a form that passed validation.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(
        &self,
        instance: &FormInstance,
        values: &FieldValues,
    ) -> Result<HandlerReply, HandlerError>;
}

/// Closure adapter for [`SubmitHandler`]. The closure receives its own copy
/// of the values so the returned future can own them.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> SubmitHandler for FnHandler<F>
where
    F: Fn(FieldValues) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerReply, HandlerError>> + Send + 'static,
{
    async fn submit(
        &self,
        _instance: &FormInstance,
        values: &FieldValues,
    ) -> Result<HandlerReply, HandlerError> {
        (self.0)(values.clone()).await
    }
}

/// Wrap an async closure as a submission handler.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(FieldValues) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerReply, HandlerError>> + Send + 'static,
{
    FnHandler(f)
}

/// Named submission handlers. Open: later registrations replace earlier ones.
pub struct HandlerRegistry {
    handlers: Registry<dyn SubmitHandler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Registry::new("submission handler"),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn SubmitHandler>) -> Registration {
        self.handlers.register(name, handler)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SubmitHandler>> {
        self.handlers.get(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.handlers.list()
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn SubmitHandler>> {
        self.handlers.unregister(name)
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.list())
            .finish()
    }
}
