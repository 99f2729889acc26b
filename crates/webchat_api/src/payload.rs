use serde::{Deserialize, Serialize};

/// Continuation ids threading one conversation across turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub conversation_id: Option<String>,
    pub response_id: Option<String>,
    pub choice_id: Option<String>,
}

impl ConversationContext {
    pub fn new(
        conversation_id: impl Into<String>,
        response_id: impl Into<String>,
        choice_id: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            response_id: Some(response_id.into()),
            choice_id: Some(choice_id.into()),
        }
    }

    /// True for a first turn: no continuation id is set.
    pub fn is_fresh(&self) -> bool {
        self.conversation_id.is_none() && self.response_id.is_none() && self.choice_id.is_none()
    }

    /// Ids from `recovered` win; the rest are echoed from `self`.
    pub fn merged_with(&self, recovered: ConversationContext) -> ConversationContext {
        ConversationContext {
            conversation_id: recovered
                .conversation_id
                .or_else(|| self.conversation_id.clone()),
            response_id: recovered.response_id.or_else(|| self.response_id.clone()),
            choice_id: recovered.choice_id.or_else(|| self.choice_id.clone()),
        }
    }
}

/// One outgoing chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub message: String,
    pub system_prompt: Option<String>,
    pub context: ConversationContext,
    /// Overrides the configured `hl` language for this turn.
    pub language: Option<String>,
}

impl ChatTurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            system_prompt: None,
            context: ConversationContext::default(),
            language: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Text extracted from a chat reply plus the ids to continue from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurnResult {
    pub text: String,
    #[serde(flatten)]
    pub context: ConversationContext,
}
