use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    domain::{DomainError, Poll, PollDraft, VoteDraft, VoteRecord, parse_poll_id},
    id::IdGenerator,
    state::{DocumentBackend, DocumentStore, JsonFileBackend, StoreError},
};

pub const POLL_DOCUMENT_FILE: &str = "data.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollDocument {
    #[serde(default)]
    pub polls: Vec<Poll>,
    #[serde(default)]
    pub votes: Vec<VoteRecord>,
}

impl PollDocument {
    /// Every poll must carry exactly one counter per option.
    pub fn check(&self) -> Result<(), StoreError> {
        match self
            .polls
            .iter()
            .find(|poll| poll.votes.len() != poll.options.len())
        {
            Some(poll) => Err(StoreError::InvalidDocument {
                reason: format!(
                    "poll {} has {} vote counters for {} options",
                    poll.id,
                    poll.votes.len(),
                    poll.options.len()
                ),
            }),
            None => Ok(()),
        }
    }
}

pub struct PollStore {
    doc: DocumentStore<PollDocument>,
    ids: IdGenerator,
}

impl PollStore {
    pub fn new(backend: impl DocumentBackend<PollDocument> + 'static) -> Self {
        Self {
            doc: DocumentStore::new(backend),
            ids: IdGenerator::new(),
        }
    }

    /// Opens `<data_dir>/data.json`, creating it if absent.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let backend =
            JsonFileBackend::<PollDocument>::open_or_init(data_dir.join(POLL_DOCUMENT_FILE))?;
        Ok(Self::new(backend))
    }

    pub fn list_polls(&self) -> Result<Vec<Poll>, StoreError> {
        let doc = self.doc.read()?;
        doc.check()?;
        Ok(doc.polls)
    }

    pub fn create_poll(&mut self, draft: PollDraft) -> Result<Poll, StoreError> {
        let new_poll = draft.validate()?;
        let poll = Poll::new(self.ids.next_id(), new_poll);

        self.doc.update(|doc| {
            doc.check()?;
            doc.polls.push(poll.clone());
            Ok(())
        })?;

        info!(
            poll_id = poll.id,
            options = poll.options.len(),
            poster = %poll.poster,
            "poll created"
        );
        Ok(poll)
    }

    /// Records one vote and returns the poll with its updated counts.
    ///
    /// Checks run in a fixed order: input presence, poll lookup, duplicate
    /// vote, option bounds.
    pub fn cast_vote(&mut self, raw_poll_id: &str, draft: VoteDraft) -> Result<Poll, StoreError> {
        let vote = draft.validate()?;
        let not_found = || DomainError::PollNotFound {
            poll_id: raw_poll_id.to_string(),
        };
        let poll_id = parse_poll_id(raw_poll_id).ok_or_else(not_found)?;

        let poll = self.doc.update(|doc| {
            doc.check()?;
            let poll = doc
                .polls
                .iter_mut()
                .find(|poll| poll.id == poll_id)
                .ok_or_else(not_found)?;

            let has_voted = doc
                .votes
                .iter()
                .any(|v| v.wallet == vote.wallet && v.poll_id == poll_id);
            if has_voted {
                return Err(DomainError::AlreadyVoted {
                    wallet: vote.wallet.clone(),
                    poll_id,
                }
                .into());
            }

            let idx = poll.option_index(&vote.option)?;
            poll.votes[idx] += 1;
            let poll = poll.clone();

            doc.votes.push(VoteRecord {
                wallet: vote.wallet.clone(),
                poll_id,
            });
            Ok(poll)
        })?;

        debug!(poll_id, wallet = %vote.wallet, votes = ?poll.votes, "vote registered");
        Ok(poll)
    }
}
