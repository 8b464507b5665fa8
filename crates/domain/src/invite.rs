use std::sync::Arc;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::groups::GroupRepository;
use crate::util::now_ms;

const JOIN_CODE_LEN: usize = 6;
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Serialize, Deserialize)]
struct InviteClaims {
    gid: String,
    exp: usize,
}

/// Generates join codes and signs/verifies invite tokens. Tokens are
/// stateless: verification says nothing about whether the group still
/// exists, so callers must re-resolve the group afterwards.
#[derive(Clone)]
pub struct InviteCodec {
    repository: Arc<dyn GroupRepository>,
    secret: String,
    token_ttl_days: i64,
    max_code_attempts: u32,
}

impl InviteCodec {
    pub fn new(
        repository: Arc<dyn GroupRepository>,
        secret: impl Into<String>,
        token_ttl_days: i64,
        max_code_attempts: u32,
    ) -> Self {
        Self {
            repository,
            secret: secret.into(),
            token_ttl_days,
            max_code_attempts,
        }
    }

    /// Samples 6-char uppercase alphanumeric codes until one is free in
    /// the store. Collisions are vanishingly rare at realistic group
    /// counts; the attempt cap guards against a corrupted store.
    pub async fn generate_join_code(&self) -> DomainResult<String> {
        for attempt in 1..=self.max_code_attempts {
            let code = sample_join_code();
            if !self.repository.join_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::warn!(attempt, code, "join code collision, resampling");
        }
        Err(DomainError::Conflict)
    }

    pub fn issue_invite_token(&self, group_id: &str) -> DomainResult<String> {
        let exp = now_ms() / 1_000 + self.token_ttl_days * 86_400;
        let claims = InviteClaims {
            gid: group_id.to_string(),
            exp: exp.max(0) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| DomainError::Validation(format!("failed to sign invite token: {err}")))
    }

    /// Returns the group id the token was bound to.
    pub fn verify_invite_token(&self, token: &str) -> DomainResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<InviteClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims.gid)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => DomainError::Expired("invite token expired".into()),
            _ => DomainError::Validation("invalid invite token".into()),
        })
    }
}

fn sample_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
            JOIN_CODE_ALPHABET[idx] as char
        })
        .collect()
}
