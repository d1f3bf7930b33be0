//! Wire Protocol
//!
//! JSON envelopes exchanged with clients. Inbound frames carry a `type` tag
//! (`ADD_OPTION`, `VOTE`, `REORDER`); the only outbound frame is
//! `STATUS_UPDATE` with a full session snapshot.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::option::{OptionId, VoteOption};
use crate::state::SessionSnapshot;

/// Messages sent FROM the client TO the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Append an option to the shared list.
    AddOption { option: VoteOption },
    /// Cast this participant's single vote.
    Vote {
        #[serde(rename = "optionId")]
        option_id: OptionId,
    },
    /// Replace the whole option list with a client-supplied ordering.
    Reorder { options: Vec<VoteOption> },
}

impl ClientMessage {
    /// Decode one inbound text frame.
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        serde_json::from_str(text).map_err(|e| SessionError::MalformedMessage(e.to_string()))
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::AddOption { .. } => "ADD_OPTION",
            ClientMessage::Vote { .. } => "VOTE",
            ClientMessage::Reorder { .. } => "REORDER",
        }
    }
}

/// Messages sent FROM the server TO clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    StatusUpdate { data: SessionSnapshot },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(SessionError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_add_option() {
        let msg = ClientMessage::from_json(r#"{"type":"ADD_OPTION","option":{"label":"Pizza"}}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::AddOption {
                option: VoteOption::labeled("Pizza")
            }
        );
        assert_eq!(msg.kind(), "ADD_OPTION");
    }

    #[test]
    fn parses_vote_with_numeric_or_string_id() {
        let msg = ClientMessage::from_json(r#"{"type":"VOTE","optionId":0}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Vote {
                option_id: OptionId::Index(0)
            }
        );

        let msg = ClientMessage::from_json(r#"{"type":"VOTE","optionId":"pizza"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Vote {
                option_id: OptionId::Text("pizza".into())
            }
        );
    }

    #[test]
    fn vote_accepts_fractional_and_large_ids() {
        for (text, id) in [
            (r#"{"type":"VOTE","optionId":1.5}"#, "1.5"),
            (r#"{"type":"VOTE","optionId":1e3}"#, "1000.0"),
            (
                r#"{"type":"VOTE","optionId":18446744073709551615}"#,
                "18446744073709551615",
            ),
        ] {
            match ClientMessage::from_json(text) {
                Ok(ClientMessage::Vote { option_id }) => {
                    assert!(matches!(option_id, OptionId::Number(_)), "{text}");
                    assert_eq!(option_id.to_string(), id);
                }
                other => panic!("Expected Vote for {text}, got {:?}", other),
            }
        }
    }

    #[test]
    fn parses_reorder() {
        let msg = ClientMessage::from_json(
            r#"{"type":"REORDER","options":[{"label":"B"},{"label":"A","votes":2}]}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Reorder { options } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].label(), Some("B"));
                assert_eq!(options[1].fields.get("votes"), Some(&json!(2)));
            }
            other => panic!("Expected Reorder, got {:?}", other),
        }
    }

    #[test]
    fn extra_fields_are_ignored() {
        let msg =
            ClientMessage::from_json(r#"{"type":"VOTE","optionId":1,"clientTs":123}"#).unwrap();
        assert_eq!(msg.kind(), "VOTE");
    }

    #[test]
    fn rejects_malformed_frames() {
        for text in [
            "not json",
            r#"{"type":"DELETE_OPTION","optionId":0}"#,
            r#"{"option":{"label":"no type"}}"#,
            r#"{"type":"ADD_OPTION"}"#,
            r#"{"type":"ADD_OPTION","option":"Pizza"}"#,
            r#"{"type":"VOTE"}"#,
            r#"{"type":"VOTE","optionId":{"nested":true}}"#,
            r#"{"type":"REORDER","options":{"label":"A"}}"#,
            r#"{"type":"vote","optionId":0}"#,
        ] {
            match ClientMessage::from_json(text) {
                Err(SessionError::MalformedMessage(_)) => {}
                other => panic!("Expected MalformedMessage for {text}, got {:?}", other),
            }
        }
    }

    #[test]
    fn status_update_envelope_shape() {
        let msg = ServerMessage::StatusUpdate {
            data: SessionSnapshot {
                options: vec![VoteOption::labeled("Pizza")],
                total_votes: 1,
                active_users: 2,
            },
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "STATUS_UPDATE",
                "data": {
                    "options": [{"label": "Pizza"}],
                    "totalVotes": 1,
                    "activeUsers": 2
                }
            })
        );
    }
}
