//! Manual one-shot sync between devices.
//!
//! A [`SyncPayload`] carries the main goal and both task lists. Weekly
//! history and the reward balance stay on the device. The payload travels
//! as a text code (`base64` of its JSON), which is what an external QR
//! encoder carries; [`SyncPayload::decode`] also accepts the raw JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(default)]
    pub main_task: String,
    #[serde(default)]
    pub completed_tasks: Vec<Task>,
    #[serde(default)]
    pub planned_tasks: Vec<Task>,
}

impl SyncPayload {
    pub fn to_json(&self) -> String {
        // Plain strings and integers only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Text code for transport.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_json())
    }

    /// Parse a text code or raw JSON.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidFormat`] when the input is neither.
    pub fn decode(data: &str) -> Result<Self, SyncError> {
        let data = data.trim();
        if data.starts_with('{') {
            return serde_json::from_str(data).map_err(|e| SyncError::InvalidFormat(e.to_string()));
        }
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| SyncError::InvalidFormat(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SyncError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;

    fn payload() -> SyncPayload {
        SyncPayload {
            main_task: "Ship the beta".into(),
            completed_tasks: vec![Task {
                id: 1,
                kind: TaskKind::Consume,
                text: "read feedback".into(),
            }],
            planned_tasks: vec![Task {
                id: 2,
                kind: TaskKind::Consume,
                text: "outline fixes".into(),
            }],
        }
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json: serde_json::Value = serde_json::from_str(&payload().to_json()).unwrap();
        assert_eq!(json["mainTask"], "Ship the beta");
        assert_eq!(json["completedTasks"][0]["type"], "input");
        assert_eq!(json["plannedTasks"][0]["id"], 2);
    }

    #[test]
    fn text_code_decodes_back() {
        let code = payload().encode();
        assert!(!code.contains('{'));
        assert_eq!(SyncPayload::decode(&code).unwrap(), payload());
    }

    #[test]
    fn older_exports_with_extra_fields_are_accepted() {
        let raw = r#"{"mainTask":"x","completedTasks":[],"plannedTasks":[],"moneyEarned":3}"#;
        let decoded = SyncPayload::decode(raw).unwrap();
        assert_eq!(decoded.main_task, "x");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            SyncPayload::decode("%%%not-a-code"),
            Err(SyncError::InvalidFormat(_))
        ));
        assert!(SyncPayload::decode(r#"{"mainTask": 5}"#).is_err());
    }
}
