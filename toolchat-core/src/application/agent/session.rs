use crate::model::{FunctionDeclaration, ModelRequest};
use crate::types::{ChatMessage, MessageRole};
use tracing::debug;
use uuid::Uuid;

/// Conversation context carried across turns.
///
/// History only grows; the one exception is [`ModelSession::rollback`], which discards the
/// messages of a turn that failed.
#[derive(Debug, Clone)]
pub struct ModelSession {
    id: String,
    provider: String,
    model: String,
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
}

impl ModelSession {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            id: new_session_id(),
            provider: provider.into(),
            model: model.into(),
            system_prompt,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.history.push(message);
    }

    /// Truncates history back to `len` messages.
    pub fn rollback(&mut self, len: usize) {
        if len < self.history.len() {
            debug!(
                session_id = self.id.as_str(),
                dropped = self.history.len() - len,
                "Rolling back session history"
            );
            self.history.truncate(len);
        }
    }

    /// Starts a fresh conversation under a new id, keeping provider, model and system prompt.
    pub fn reset(&mut self) {
        self.history.clear();
        self.id = new_session_id();
    }

    /// Full conversation for the next model call, system prompt first.
    pub fn request(&self, tools: Vec<FunctionDeclaration>) -> ModelRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        if let Some(system) = self.system_prompt.as_deref() {
            messages.push(ChatMessage::new(MessageRole::System, system));
        }
        messages.extend(self.history.iter().cloned());
        ModelRequest {
            provider: self.provider.clone(),
            model: self.model.clone(),
            messages,
            tools,
            session_id: Some(self.id.clone()),
        }
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
