//! Load state of a single dashboard value

use serde::{Deserialize, Serialize};

/// A value that is either still being fetched or has resolved.
///
/// `Ready` with an empty payload means "resolved with no data", which the
/// presentation layer renders differently from `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Slot<T> {
    Pending,
    Ready(T),
}

impl<T> Slot<T> {
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            Slot::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_and_empty_serialize_differently() {
        let pending: Slot<Vec<u32>> = Slot::Pending;
        let empty: Slot<Vec<u32>> = Slot::Ready(Vec::new());

        assert_eq!(serde_json::to_string(&pending).unwrap(), r#"{"status":"pending"}"#);
        assert_eq!(
            serde_json::to_string(&empty).unwrap(),
            r#"{"status":"ready","data":[]}"#
        );
    }

    #[test]
    fn test_as_ready() {
        let pending: Slot<u32> = Slot::Pending;
        assert_eq!(pending.as_ready(), None);
        assert_eq!(Slot::Ready(4).as_ready(), Some(&4));
    }
}
