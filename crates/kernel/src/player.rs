use glam::Vec2;
use plaza_common::{AvatarKind, Facing, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state of one player as last asserted by the server.
///
/// `id` and `username` may be omitted on the wire when the snapshot sits under
/// a map key; the world fills the id from the key on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub id: PlayerId,
    #[serde(default)]
    pub username: String,
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub avatar: AvatarKind,
    #[serde(default)]
    pub animation_frame: u32,
}

impl PlayerSnapshot {
    pub fn new(id: impl Into<PlayerId>, avatar: impl Into<AvatarKind>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
            x,
            y,
            facing: Facing::default(),
            avatar: avatar.into(),
            animation_frame: 0,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Appearance definition: ordered frame image references for each facing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AvatarDescriptor {
    #[serde(default)]
    pub name: AvatarKind,
    #[serde(default)]
    pub frames: BTreeMap<Facing, Vec<String>>,
}

impl AvatarDescriptor {
    pub fn new(name: impl Into<AvatarKind>) -> Self {
        Self {
            name: name.into(),
            frames: BTreeMap::new(),
        }
    }

    pub fn with_frames(mut self, facing: Facing, frames: Vec<String>) -> Self {
        self.frames.insert(facing, frames);
        self
    }

    /// Image reference for one frame, if the descriptor has it.
    pub fn frame(&self, facing: Facing, index: u32) -> Option<&str> {
        self.frames
            .get(&facing)
            .and_then(|frames| frames.get(index as usize))
            .map(String::as_str)
    }
}
