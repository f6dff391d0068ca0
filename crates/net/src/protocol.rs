use plaza_common::{AvatarKind, Direction, PlayerId};
use plaza_kernel::{AvatarDescriptor, PlayerSnapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure to decode or encode a protocol message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no string `action` field")]
    MissingAction,
    #[error("successful join-result without a playerId")]
    MissingPlayerId,
    #[error("{action} carries a player without an id")]
    AnonymousPlayer { action: &'static str },
}

/// Messages the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        username: String,
    },
    Move {
        direction: Direction,
        /// Omitted from the wire unless set.
        #[serde(default, skip_serializing_if = "is_false")]
        fast: bool,
    },
    Stop,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Result of the join handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Accepted {
        player_id: PlayerId,
        players: BTreeMap<PlayerId, PlayerSnapshot>,
        avatars: BTreeMap<AvatarKind, AvatarDescriptor>,
    },
    Rejected {
        reason: String,
    },
}

/// Messages the server sends, fully decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    JoinResult(JoinOutcome),
    /// Partial map of players that moved. Keys are authoritative ids.
    BulkMove {
        players: BTreeMap<PlayerId, PlayerSnapshot>,
    },
    EntityJoined {
        player: PlayerSnapshot,
        avatar: Option<AvatarDescriptor>,
    },
    EntityLeft {
        player_id: PlayerId,
    },
    /// A well-formed message with an action this client does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinResultBody {
    success: bool,
    player_id: Option<PlayerId>,
    #[serde(default)]
    players: BTreeMap<PlayerId, PlayerSnapshot>,
    #[serde(default)]
    avatars: BTreeMap<AvatarKind, AvatarDescriptor>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct BulkMoveBody {
    players: BTreeMap<PlayerId, PlayerSnapshot>,
}

#[derive(Deserialize)]
struct EntityJoinedBody {
    player: PlayerSnapshot,
    avatar: Option<AvatarDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityLeftBody {
    player_id: PlayerId,
}

impl ServerMessage {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let action = value
            .get("action")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtocolError::MissingAction)?
            .to_owned();

        match action.as_str() {
            "join-result" => {
                let body: JoinResultBody = body(value)?;
                if !body.success {
                    return Ok(ServerMessage::JoinResult(JoinOutcome::Rejected {
                        reason: body.error.unwrap_or_else(|| "join rejected".to_owned()),
                    }));
                }
                let player_id = body
                    .player_id
                    .filter(|id| !id.is_empty())
                    .ok_or(ProtocolError::MissingPlayerId)?;
                Ok(ServerMessage::JoinResult(JoinOutcome::Accepted {
                    player_id,
                    players: body.players,
                    avatars: body.avatars,
                }))
            }
            "bulk-move" => {
                let body: BulkMoveBody = body(value)?;
                Ok(ServerMessage::BulkMove {
                    players: body.players,
                })
            }
            "entity-joined" => {
                let body: EntityJoinedBody = body(value)?;
                if body.player.id.is_empty() {
                    return Err(ProtocolError::AnonymousPlayer {
                        action: "entity-joined",
                    });
                }
                Ok(ServerMessage::EntityJoined {
                    player: body.player,
                    avatar: body.avatar,
                })
            }
            "entity-left" => {
                let body: EntityLeftBody = body(value)?;
                Ok(ServerMessage::EntityLeft {
                    player_id: body.player_id,
                })
            }
            _ => Ok(ServerMessage::Unknown(action)),
        }
    }

    /// The wire `action` this message was decoded from.
    pub fn action(&self) -> &str {
        match self {
            ServerMessage::JoinResult(_) => "join-result",
            ServerMessage::BulkMove { .. } => "bulk-move",
            ServerMessage::EntityJoined { .. } => "entity-joined",
            ServerMessage::EntityLeft { .. } => "entity-left",
            ServerMessage::Unknown(action) => action,
        }
    }
}

fn body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ProtocolError> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_common::Facing;
    use serde_json::json;

    #[test]
    fn outbound_wire_format() {
        let join = ClientMessage::Join {
            username: "alice".into(),
        };
        assert_eq!(join.to_json().unwrap(), r#"{"action":"join","username":"alice"}"#);

        let walk = ClientMessage::Move {
            direction: Direction::Left,
            fast: false,
        };
        assert_eq!(walk.to_json().unwrap(), r#"{"action":"move","direction":"left"}"#);

        let run = ClientMessage::Move {
            direction: Direction::Up,
            fast: true,
        };
        assert_eq!(
            run.to_json().unwrap(),
            r#"{"action":"move","direction":"up","fast":true}"#
        );
        assert_eq!(ClientMessage::Stop.to_json().unwrap(), r#"{"action":"stop"}"#);
    }

    #[test]
    fn join_result_success() {
        let text = json!({
            "action": "join-result",
            "success": true,
            "playerId": "p1",
            "players": {"p1": {"x": 100, "y": 100, "facing": "south", "avatar": "fox", "username": "alice"}},
            "avatars": {"fox": {"frames": {"south": ["fox_s0.png"]}}}
        })
        .to_string();
        match ServerMessage::decode(&text).unwrap() {
            ServerMessage::JoinResult(JoinOutcome::Accepted {
                player_id,
                players,
                avatars,
            }) => {
                assert_eq!(player_id, PlayerId::from("p1"));
                let p1 = &players[&PlayerId::from("p1")];
                assert_eq!((p1.x, p1.y), (100.0, 100.0));
                assert_eq!(p1.facing, Facing::South);
                assert_eq!(
                    avatars[&AvatarKind::from("fox")].frame(Facing::South, 0),
                    Some("fox_s0.png")
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn join_result_rejection_carries_reason() {
        let text = r#"{"action":"join-result","success":false,"error":"name taken"}"#;
        assert_eq!(
            ServerMessage::decode(text).unwrap(),
            ServerMessage::JoinResult(JoinOutcome::Rejected {
                reason: "name taken".into()
            })
        );
    }

    #[test]
    fn join_success_without_id_is_a_fault() {
        let text = r#"{"action":"join-result","success":true,"players":{}}"#;
        assert!(matches!(
            ServerMessage::decode(text),
            Err(ProtocolError::MissingPlayerId)
        ));
    }

    #[test]
    fn bulk_move_is_all_or_nothing() {
        let good = json!({
            "action": "bulk-move",
            "players": {"p1": {"x": 110, "y": 100, "facing": "east", "avatar": "fox", "animationFrame": 2}}
        })
        .to_string();
        match ServerMessage::decode(&good).unwrap() {
            ServerMessage::BulkMove { players } => {
                assert_eq!(players[&PlayerId::from("p1")].animation_frame, 2);
            }
            other => panic!("unexpected {other:?}"),
        }

        // One bad entry rejects the whole message.
        let bad = json!({
            "action": "bulk-move",
            "players": {
                "p1": {"x": 110, "y": 100, "facing": "east", "avatar": "fox"},
                "p2": {"x": "nope", "y": 100, "facing": "east", "avatar": "fox"}
            }
        })
        .to_string();
        assert!(matches!(ServerMessage::decode(&bad), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn entity_joined_and_left() {
        let joined = json!({
            "action": "entity-joined",
            "player": {"id": "p2", "x": 5, "y": 6, "facing": "west", "avatar": "owl"},
            "avatar": {"name": "owl", "frames": {"east": ["owl_e0.png"]}}
        })
        .to_string();
        match ServerMessage::decode(&joined).unwrap() {
            ServerMessage::EntityJoined { player, avatar } => {
                assert_eq!(player.id, PlayerId::from("p2"));
                assert_eq!(avatar.unwrap().name, AvatarKind::from("owl"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let anonymous = r#"{"action":"entity-joined","player":{"x":1,"y":1,"facing":"north","avatar":"owl"}}"#;
        assert!(matches!(
            ServerMessage::decode(anonymous),
            Err(ProtocolError::AnonymousPlayer { .. })
        ));

        let left = r#"{"action":"entity-left","playerId":"p2"}"#;
        assert_eq!(
            ServerMessage::decode(left).unwrap(),
            ServerMessage::EntityLeft {
                player_id: PlayerId::from("p2")
            }
        );
    }

    #[test]
    fn unknown_action_is_not_an_error() {
        let msg = ServerMessage::decode(r#"{"action":"chat","text":"hi"}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown("chat".into()));
        assert_eq!(msg.action(), "chat");
    }

    #[test]
    fn malformed_frames() {
        assert!(matches!(ServerMessage::decode("not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            ServerMessage::decode(r#"{"players":{}}"#),
            Err(ProtocolError::MissingAction)
        ));
        assert!(matches!(
            ServerMessage::decode(r#"{"action":42}"#),
            Err(ProtocolError::MissingAction)
        ));
    }
}
