use plaza_common::{AvatarKind, Facing, PlayerId};
use plaza_kernel::World;

/// Read-only queries against the world store for debugging and the CLI.
pub struct StoreInspector;

impl StoreInspector {
    pub fn summary(world: &World, local: Option<&PlayerId>) -> StoreSummary {
        StoreSummary {
            players: world.player_count(),
            avatars: world.avatar_count(),
            local: local.cloned(),
            local_present: local.is_some_and(|id| world.contains(id)),
            dirty: world.is_dirty(),
            pending_events: world.events().len(),
        }
    }

    pub fn inspect_player(world: &World, id: &PlayerId) -> Option<PlayerInfo> {
        world.get(id).map(|p| PlayerInfo {
            id: p.id.clone(),
            username: p.username.clone(),
            position: [p.x, p.y],
            facing: p.facing,
            avatar: p.avatar.clone(),
            avatar_known: world.avatar(&p.avatar).is_some(),
            animation_frame: p.animation_frame,
        })
    }

    pub fn list_players(world: &World) -> Vec<PlayerId> {
        world.all().map(|p| p.id.clone()).collect()
    }

    /// Players whose avatar kind has no descriptor yet.
    pub fn orphans(world: &World) -> Vec<PlayerId> {
        world
            .all()
            .filter(|p| world.avatar(&p.avatar).is_none())
            .map(|p| p.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary {
    pub players: usize,
    pub avatars: usize,
    pub local: Option<PlayerId>,
    /// The tracked player is in the store.
    pub local_present: bool,
    pub dirty: bool,
    pub pending_events: usize,
}

impl std::fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let local = match (&self.local, self.local_present) {
            (Some(id), true) => id.to_string(),
            (Some(id), false) => format!("{id} (absent)"),
            (None, _) => "-".to_owned(),
        };
        write!(
            f,
            "Store: players={} avatars={} local={} dirty={} pending_events={}",
            self.players, self.avatars, local, self.dirty, self.pending_events
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub username: String,
    pub position: [f32; 2],
    pub facing: Facing,
    pub avatar: AvatarKind,
    pub avatar_known: bool,
    pub animation_frame: u32,
}

impl std::fmt::Display for PlayerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Player [{}] {:?} pos=({:.2}, {:.2}) facing={} avatar={}{} frame={}",
            self.id,
            self.username,
            self.position[0],
            self.position[1],
            self.facing,
            self.avatar,
            if self.avatar_known { "" } else { "?" },
            self.animation_frame,
        )
    }
}
