use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domain::{ChatMessage, MessageDraft},
    id::IdGenerator,
    state::{DocumentBackend, DocumentStore, JsonFileBackend, StoreError},
};

pub const CHAT_DOCUMENT_FILE: &str = "chat.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatDocument {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

pub struct ChatStore {
    doc: DocumentStore<ChatDocument>,
    ids: IdGenerator,
}

impl ChatStore {
    pub fn new(backend: impl DocumentBackend<ChatDocument> + 'static) -> Self {
        Self {
            doc: DocumentStore::new(backend),
            ids: IdGenerator::new(),
        }
    }

    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let backend =
            JsonFileBackend::<ChatDocument>::open_or_init(data_dir.join(CHAT_DOCUMENT_FILE))?;
        Ok(Self::new(backend))
    }

    pub fn list_messages(&self) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self.doc.read()?.messages)
    }

    pub fn post_message(&mut self, draft: MessageDraft) -> Result<ChatMessage, StoreError> {
        let new_message = draft.validate()?;
        let message = ChatMessage {
            id: self.ids.next_id(),
            wallet: new_message.wallet,
            text: new_message.text,
        };

        self.doc.update(|doc| {
            doc.messages.push(message.clone());
            Ok(())
        })?;

        debug!(message_id = message.id, wallet = %message.wallet, "chat message posted");
        Ok(message)
    }
}
