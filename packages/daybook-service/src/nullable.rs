//! Keeps an explicit JSON `null` apart from an absent field.
//!
//! Pair with `#[serde(default)]`: an absent field stays `None`, `null` becomes `Some(None)`.

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}
