// Inbound interactions: request signature checks, payload decoding, and replies.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::{deserialize_optional_snowflake, parse_snowflake, Snowflake, MESSAGE_FLAG_EPHEMERAL};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
const RESPONSE_DEFERRED_CHANNEL_MESSAGE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature headers")]
    Missing,

    #[error("malformed signature or key: {0}")]
    Malformed(String),

    #[error("signature does not match request body")]
    Invalid,
}

/// Decode the application's hex-encoded Ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, SignatureError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| SignatureError::Malformed("public key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| SignatureError::Malformed(e.to_string()))
}

/// Check a request against the signature Discord attaches to every interaction.
///
/// The signed message is the timestamp header followed by the raw body.
pub fn verify_request(
    key: &VerifyingKey,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<(), SignatureError> {
    let raw = hex::decode(signature_hex).map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let signature =
        Signature::from_slice(&raw).map_err(|e| SignatureError::Malformed(e.to_string()))?;

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|_| SignatureError::Invalid)
}

// ── Payload ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, deserialize_with = "deserialize_optional_snowflake")]
    pub guild_id: Option<Snowflake>,
    #[serde(default, deserialize_with = "deserialize_optional_snowflake")]
    pub channel_id: Option<Snowflake>,
    #[serde(default, deserialize_with = "deserialize_optional_snowflake")]
    pub application_id: Option<Snowflake>,
    /// Credential for follow-up messages, valid for 15 minutes.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

impl Interaction {
    /// Where follow-ups for this interaction are posted, when Discord sent both parts.
    pub fn followup_target(&self) -> Option<(Snowflake, &str)> {
        Some((self.application_id?, self.token.as_deref()?))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOptionValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOptionValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl CommandData {
    fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(|v| v.as_str())
    }

    /// Channel, user, and role options all arrive as snowflake strings.
    pub fn snowflake(&self, name: &str) -> Option<Snowflake> {
        self.option(name).and_then(parse_snowflake)
    }
}

// ── Response ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub flags: u64,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    /// A reply only the invoking user sees.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: Some(content.into()),
                flags: MESSAGE_FLAG_EPHEMERAL,
            }),
        }
    }

    /// Acknowledge now and answer later with a follow-up. The user sees a
    /// private "thinking" state until then.
    pub fn deferred_ephemeral() -> Self {
        Self {
            kind: RESPONSE_DEFERRED_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: None,
                flags: MESSAGE_FLAG_EPHEMERAL,
            }),
        }
    }
}
