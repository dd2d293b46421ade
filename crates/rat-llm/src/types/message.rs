use serde::{Deserialize, Serialize};
use super::content::Content;

/// Conversation roles understood by every provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Provider-agnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,
    },

    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        content: Content,
    },
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Create AI message
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::Human { .. } => Role::User,
            Self::AI { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Self::System { content } | Self::Human { content } | Self::AI { content } => content,
        }
    }

    /// Same role, new content
    pub fn with_content(&self, content: impl Into<Content>) -> Self {
        match self {
            Self::System { .. } => Self::system(content),
            Self::Human { .. } => Self::human(content),
            Self::AI { .. } => Self::ai(content),
        }
    }
}
