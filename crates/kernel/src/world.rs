use plaza_common::{AvatarKind, Facing, PlayerId};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::player::{AvatarDescriptor, PlayerSnapshot};

/// A change record produced by every mutation of the world.
///
/// The reactor drains these to decide whether the tracked player moved and
/// the camera needs a recompute.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// Every player was replaced by a join snapshot.
    Replaced { players: usize },
    /// A player was inserted or replaced.
    Upserted(PlayerId),
    /// A player was removed.
    Removed(PlayerId),
    /// A new avatar descriptor was stored.
    AvatarAdded(AvatarKind),
    /// The local facing prediction was written.
    FacingPredicted { id: PlayerId, facing: Facing },
}

/// The client's local copy of the shared world.
///
/// All mutations go through explicit operations. The server owns the truth;
/// this mirror only applies what it is told, in arrival order.
///
/// Uses BTreeMap so debug output and tests see a stable order. Callers must
/// not rely on it.
#[derive(Debug, Clone, Default)]
pub struct World {
    players: BTreeMap<PlayerId, PlayerSnapshot>,
    avatars: BTreeMap<AvatarKind, Arc<AvatarDescriptor>>,
    dirty: bool,
    /// Append-only log of mutations since the last drain.
    event_log: Vec<WorldEvent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of known avatar descriptors.
    pub fn avatar_count(&self) -> usize {
        self.avatars.len()
    }

    /// True when a mutation happened since the last `clear_dirty`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Drain and return the change log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the change log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    /// Iterate current snapshots. Restartable; order is not part of the contract.
    pub fn all(&self) -> impl Iterator<Item = &PlayerSnapshot> + Clone {
        self.players.values()
    }

    pub fn avatar(&self, kind: &AvatarKind) -> Option<&Arc<AvatarDescriptor>> {
        self.avatars.get(kind)
    }

    pub fn avatars(&self) -> impl Iterator<Item = &Arc<AvatarDescriptor>> {
        self.avatars.values()
    }

    /// Replace every player with a full join snapshot.
    ///
    /// Descriptors accumulate: kinds already known keep their stored
    /// descriptor, new kinds are added.
    pub fn replace_all(
        &mut self,
        players: impl IntoIterator<Item = (PlayerId, PlayerSnapshot)>,
        avatars: impl IntoIterator<Item = (AvatarKind, AvatarDescriptor)>,
    ) {
        self.players = players
            .into_iter()
            .map(|(id, snap)| (id.clone(), keyed(id, snap)))
            .collect();
        for (kind, descriptor) in avatars {
            self.add_avatar(kind, descriptor);
        }
        self.dirty = true;
        self.event_log.push(WorldEvent::Replaced {
            players: self.players.len(),
        });
        tracing::debug!(
            players = self.players.len(),
            avatars = self.avatars.len(),
            "world replaced"
        );
    }

    /// Insert or wholesale-replace each given player. Others are untouched.
    pub fn upsert_many(&mut self, players: impl IntoIterator<Item = (PlayerId, PlayerSnapshot)>) {
        for (id, snap) in players {
            self.players.insert(id.clone(), keyed(id.clone(), snap));
            self.event_log.push(WorldEvent::Upserted(id));
            self.dirty = true;
        }
    }

    /// Insert or replace one player, storing its descriptor if the kind is new.
    ///
    /// Returns true when the descriptor was added.
    pub fn upsert_one(
        &mut self,
        player: PlayerSnapshot,
        descriptor: Option<AvatarDescriptor>,
    ) -> bool {
        let added = match descriptor {
            Some(d) => {
                let kind = if d.name.is_empty() {
                    player.avatar.clone()
                } else {
                    d.name.clone()
                };
                self.add_avatar(kind, d)
            }
            None => false,
        };
        let id = player.id.clone();
        self.players.insert(id.clone(), player);
        self.event_log.push(WorldEvent::Upserted(id));
        self.dirty = true;
        added
    }

    /// Remove a player. Removing an absent id is a no-op on the contents.
    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerSnapshot> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            self.event_log.push(WorldEvent::Removed(id.clone()));
        }
        self.dirty = true;
        removed
    }

    /// Write a locally predicted facing. The next server snapshot overwrites it.
    pub fn set_facing(&mut self, id: &PlayerId, facing: Facing) -> bool {
        match self.players.get_mut(id) {
            Some(snap) => {
                snap.facing = facing;
                self.event_log.push(WorldEvent::FacingPredicted {
                    id: id.clone(),
                    facing,
                });
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    fn add_avatar(&mut self, kind: AvatarKind, mut descriptor: AvatarDescriptor) -> bool {
        if self.avatars.contains_key(&kind) {
            return false;
        }
        descriptor.name = kind.clone();
        self.avatars.insert(kind.clone(), Arc::new(descriptor));
        self.event_log.push(WorldEvent::AvatarAdded(kind));
        true
    }
}

fn keyed(id: PlayerId, mut snap: PlayerSnapshot) -> PlayerSnapshot {
    snap.id = id;
    snap
}
