//! Sport types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sport an event is organised around.
///
/// Serialized with the display names users pick from ("Track & Field").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SportType {
    Soccer,
    Basketball,
    Tennis,
    Baseball,
    Football,
    Volleyball,
    Golf,
    Swimming,
    #[serde(rename = "Track & Field")]
    TrackAndField,
    Other,
}

impl SportType {
    pub const ALL: [SportType; 10] = [
        SportType::Soccer,
        SportType::Basketball,
        SportType::Tennis,
        SportType::Baseball,
        SportType::Football,
        SportType::Volleyball,
        SportType::Golf,
        SportType::Swimming,
        SportType::TrackAndField,
        SportType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Soccer => "Soccer",
            SportType::Basketball => "Basketball",
            SportType::Tennis => "Tennis",
            SportType::Baseball => "Baseball",
            SportType::Football => "Football",
            SportType::Volleyball => "Volleyball",
            SportType::Golf => "Golf",
            SportType::Swimming => "Swimming",
            SportType::TrackAndField => "Track & Field",
            SportType::Other => "Other",
        }
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SportType::ALL
            .into_iter()
            .find(|sport| sport.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown sport type: {}", wanted))
    }
}
