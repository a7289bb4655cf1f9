use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

pub const MIN_POLL_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    InvalidPollData,
    InvalidVoteData,
    PollNotFound { poll_id: String },
    AlreadyVoted { wallet: String, poll_id: i64 },
    InvalidOptionIndex { poll_id: i64, option: String },
    InvalidMessageData,
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPollData
            | Self::InvalidVoteData
            | Self::InvalidOptionIndex { .. }
            | Self::InvalidMessageData => "invalid_request",
            Self::PollNotFound { .. } => "not_found",
            Self::AlreadyVoted { .. } => "conflict",
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPollData => write!(
                f,
                "Invalid poll data. Title, description, options, and poster address are required."
            ),
            Self::InvalidVoteData => write!(
                f,
                "Invalid vote data. Wallet address and option are required."
            ),
            Self::PollNotFound { .. } => write!(f, "Poll not found."),
            Self::AlreadyVoted { .. } => write!(f, "You have already voted on this poll."),
            Self::InvalidOptionIndex { .. } => write!(f, "Invalid option index."),
            Self::InvalidMessageData => write!(
                f,
                "Invalid message data. Wallet address and message text are required."
            ),
        }
    }
}

impl std::error::Error for DomainError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
    pub poster: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRecord {
    pub wallet: String,
    #[serde(rename = "pollId", deserialize_with = "deserialize_poll_id")]
    pub poll_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: i64,
    pub wallet: String,
    pub text: String,
}

/// Client input for a new poll. Every field is optional so that absent
/// fields surface as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteDraft {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub option: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDraft {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub poster: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVote {
    pub wallet: String,
    pub option: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub wallet: String,
    pub text: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl PollDraft {
    pub fn validate(self) -> Result<NewPoll, DomainError> {
        let (Some(title), Some(description), Some(options), Some(poster)) = (
            non_empty(self.title),
            non_empty(self.description),
            self.options,
            non_empty(self.poster),
        ) else {
            return Err(DomainError::InvalidPollData);
        };
        if options.len() < MIN_POLL_OPTIONS {
            return Err(DomainError::InvalidPollData);
        }
        Ok(NewPoll {
            title,
            description,
            options,
            poster,
        })
    }
}

impl VoteDraft {
    pub fn validate(self) -> Result<NewVote, DomainError> {
        match (non_empty(self.wallet), self.option) {
            (Some(wallet), Some(option)) => Ok(NewVote { wallet, option }),
            _ => Err(DomainError::InvalidVoteData),
        }
    }
}

impl MessageDraft {
    pub fn validate(self) -> Result<NewMessage, DomainError> {
        match (non_empty(self.wallet), non_empty(self.text)) {
            (Some(wallet), Some(text)) => Ok(NewMessage { wallet, text }),
            _ => Err(DomainError::InvalidMessageData),
        }
    }
}

impl Poll {
    pub fn new(id: i64, new_poll: NewPoll) -> Self {
        let votes = vec![0; new_poll.options.len()];
        Self {
            id,
            title: new_poll.title,
            description: new_poll.description,
            options: new_poll.options,
            votes,
            poster: new_poll.poster,
        }
    }

    /// Resolves a client-supplied option to a position in `options`.
    pub fn option_index(&self, option: &Value) -> Result<usize, DomainError> {
        parse_option_index(option)
            .and_then(|idx| usize::try_from(idx).ok())
            .filter(|idx| *idx < self.options.len())
            .ok_or_else(|| DomainError::InvalidOptionIndex {
                poll_id: self.id,
                option: option.to_string(),
            })
    }
}

/// Interprets a poll id taken from a request path.
///
/// Ids are compared by numeric value: `" 17 "` and `"17.0"` both name poll
/// `17`. Anything that is not an integral number names no poll.
pub fn parse_poll_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    integral_f64(raw.parse::<f64>().ok()?)
}

fn parse_option_index(option: &Value) -> Option<i64> {
    match option {
        Value::Number(n) => n.as_i64().or_else(|| integral_f64(n.as_f64()?)),
        Value::String(s) if is_canonical_index(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

/// `"0"` or a run of digits without a leading zero or sign.
fn is_canonical_index(s: &str) -> bool {
    match s.as_bytes() {
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

fn integral_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn deserialize_poll_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPollId {
        Number(i64),
        Text(String),
    }

    match RawPollId::deserialize(deserializer)? {
        RawPollId::Number(id) => Ok(id),
        RawPollId::Text(raw) => parse_poll_id(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid pollId: {raw:?}"))),
    }
}
