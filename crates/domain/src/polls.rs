use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::groups::ensure_member;
use crate::identity::ActorIdentity;
use crate::ports::groups::GroupRepository;
use crate::ports::polls::PollRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

const MAX_POLL_OPTIONS: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOption {
    pub text: String,
    pub voters: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub poll_id: String,
    pub group_id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub active: bool,
    pub expires_at_ms: Option<i64>,
    pub created_by: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct PollCreate {
    pub question: String,
    pub options: Vec<String>,
    pub expires_at_ms: Option<i64>,
}

#[derive(Clone)]
pub struct PollService {
    groups: Arc<dyn GroupRepository>,
    polls: Arc<dyn PollRepository>,
}

impl PollService {
    pub fn new(groups: Arc<dyn GroupRepository>, polls: Arc<dyn PollRepository>) -> Self {
        Self { groups, polls }
    }

    pub async fn create(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        input: PollCreate,
    ) -> DomainResult<Poll> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        let input = validate_poll_input(input)?;

        let poll = Poll {
            poll_id: uuid_v7_without_dashes(),
            group_id: group_id.to_string(),
            question: input.question,
            options: input
                .options
                .into_iter()
                .map(|text| PollOption {
                    text,
                    voters: Vec::new(),
                })
                .collect(),
            active: true,
            expires_at_ms: input.expires_at_ms,
            created_by: actor.user_id.clone(),
            created_at_ms: now_ms(),
        };
        self.polls.create_poll(&poll).await
    }

    pub async fn list(&self, actor: &ActorIdentity, group_id: &str) -> DomainResult<Vec<Poll>> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        self.polls.list_polls(group_id).await
    }

    /// A vote is exclusive: it removes the voter from every other option
    /// of the poll. Expiry is evaluated lazily here; a vote against a
    /// past-deadline poll deactivates it as a side effect and fails.
    pub async fn vote(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        poll_id: &str,
        option_index: usize,
    ) -> DomainResult<Poll> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        let mut poll = self
            .polls
            .get_poll(group_id, poll_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        if !poll.active {
            return Err(DomainError::Expired("poll is closed".into()));
        }
        if let Some(expires_at_ms) = poll.expires_at_ms {
            if now_ms() >= expires_at_ms {
                poll.active = false;
                self.polls.update_poll(&poll).await?;
                return Err(DomainError::Expired("poll expired".into()));
            }
        }
        if option_index >= poll.options.len() {
            return Err(DomainError::Validation("invalid poll option index".into()));
        }

        for option in &mut poll.options {
            option.voters.retain(|voter| voter != &actor.user_id);
        }
        poll.options[option_index].voters.push(actor.user_id.clone());

        self.polls.update_poll(&poll).await
    }
}

fn validate_poll_input(mut input: PollCreate) -> DomainResult<PollCreate> {
    input.question = input.question.trim().to_string();
    if input.question.is_empty() {
        return Err(DomainError::Validation("question is required".into()));
    }

    input.options = input
        .options
        .into_iter()
        .map(|option| option.trim().to_string())
        .collect();
    if input.options.len() < 2 {
        return Err(DomainError::Validation("a poll needs at least 2 options".into()));
    }
    if input.options.len() > MAX_POLL_OPTIONS {
        return Err(DomainError::Validation(format!(
            "a poll allows at most {MAX_POLL_OPTIONS} options"
        )));
    }
    if input.options.iter().any(String::is_empty) {
        return Err(DomainError::Validation("poll options must be non-empty".into()));
    }
    Ok(input)
}
