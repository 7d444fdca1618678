//! Records exchanged with the build/channel API.
//!
//! The API owns these records; the front end only holds transient copies and
//! sends whole records (PUT) or JSON-Patch lists (PATCH). Field declaration
//! order matters: it is the order the patch builder walks fields in.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two mutually exclusive build schemas a build uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Killer,
    Survivor,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Killer => "killer",
            BuildType::Survivor => "survivor",
        }
    }

    pub fn parse(s: &str) -> Option<BuildType> {
        match s {
            "killer" => Some(BuildType::Killer),
            "survivor" => Some(BuildType::Survivor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildType::Killer => "Killer",
            BuildType::Survivor => "Survivor",
        }
    }
}

/// A streamer's build-collection space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Catalogue values the owner turned off.
    #[serde(default)]
    pub disabled_options: Vec<String>,
    /// Twitch logins allowed to moderate the channel.
    #[serde(default)]
    pub mods: Vec<String>,
    #[serde(default)]
    pub build_count: u32,
    #[serde(default)]
    pub completed_count: u32,
}

/// Body of `POST /channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChannel {
    pub name: String,
}

/// A submitted loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub build_type: BuildType,
    pub character: String,
    /// Survivor builds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub addon1: String,
    pub addon2: String,
    pub perk1: String,
    pub perk2: String,
    pub perk3: String,
    pub perk4: String,
    pub offering: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub submitter: String,
    /// Timestamps stay exactly as the API sent them: they are echoed back
    /// as `test` values in patches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl BuildRecord {
    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed.as_deref().and_then(parse_timestamp)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires.as_deref().and_then(parse_timestamp)
    }

    pub fn perks(&self) -> [&str; 4] {
        [
            self.perk1.as_str(),
            self.perk2.as_str(),
            self.perk3.as_str(),
            self.perk4.as_str(),
        ]
    }
}

/// RFC 3339 timestamp in the API's format: UTC, millisecond precision.
pub fn api_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
}

/// Body of `POST /channels/{id}/tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBuildToken {
    pub submitter: String,
}

/// A moderator-minted credential authorizing one viewer submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildToken {
    pub token: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub submitter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// Result of asking the API to validate a Twitch access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub status: ValidationStatus,
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    /// Whether this signed-in user may moderate `channel`: the owner, or a
    /// login in the channel's mod list. The API enforces this again.
    pub fn can_moderate(&self, channel: &ChannelRecord) -> bool {
        if !self.is_valid() {
            return false;
        }
        let owner = self.id.as_deref() == Some(channel.id.as_str());
        let listed = self
            .name
            .as_deref()
            .is_some_and(|name| channel.mods.iter().any(|m| m.eq_ignore_ascii_case(name)));
        owner || listed
    }
}
