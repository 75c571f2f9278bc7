//! Action response envelope
//!
//! Wire shape:
//! - success: `{"success": true, "data": ...}`
//! - failure: `{"success": false, "error": "..."}`

use std::fmt::Display;

use serde::de::{self, Deserializer, IntoDeserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Uniform result of every data-reading or data-mutating operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResponse<T> {
    Success { data: T },
    Failure { error: String },
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ActionResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for ActionResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActionResponse", 2)?;
        match self {
            Self::Success { data } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure { error } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawActionResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<'de, T> Deserialize<'de> for ActionResponse<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawActionResponse::<T>::deserialize(deserializer)?;
        if raw.success {
            // `()` and other unit-like payloads serialize as null
            let data = match raw.data {
                Some(data) => data,
                None => {
                    let unit: de::value::UnitDeserializer<D::Error> = ().into_deserializer();
                    T::deserialize(unit).map_err(|_| de::Error::missing_field("data"))?
                }
            };
            Ok(Self::Success { data })
        } else {
            let error = raw.error.ok_or_else(|| de::Error::missing_field("error"))?;
            Ok(Self::Failure { error })
        }
    }
}
