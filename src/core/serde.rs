/*!
 * Serde Helpers
 * Custom serialization for timestamps
 */

use serde::{Deserialize, Deserializer, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// Serialize SystemTime as microseconds since UNIX epoch
pub mod system_time_micros {
    use super::*;

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(duration.as_micros() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_micros(micros))
    }
}

/// Serialize Duration as whole milliseconds
pub mod duration_millis {
    use super::*;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Skip serializing empty Vec (for use with skip_serializing_if)
pub fn is_empty_vec<T>(value: &[T]) -> bool {
    value.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::time::Duration;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Stamped {
        #[serde(with = "system_time_micros")]
        at: SystemTime,
        #[serde(with = "duration_millis")]
        took: Duration,
    }

    #[test]
    fn test_timestamp_serializes_as_micros() {
        let value = Stamped {
            at: UNIX_EPOCH + Duration::from_micros(1_500),
            took: Duration::from_millis(42),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"at":1500,"took":42}"#);

        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_is_empty_vec() {
        assert!(is_empty_vec::<u32>(&[]));
        assert!(!is_empty_vec(&[1]));
    }
}
