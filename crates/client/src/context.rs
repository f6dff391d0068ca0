use glam::Vec2;
use plaza_assets::SpriteCatalog;
use plaza_common::{PlayerId, Rgba};
use plaza_input::IntentReducer;
use plaza_kernel::World;
use plaza_render::{Camera, Compositor, StatusBadge};

/// State of the low-level link as last reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Where the join handshake stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No join sent yet.
    Idle,
    /// Join sent, waiting for `join-result`.
    Joining,
    Joined { local: PlayerId },
    /// The server refused the join. Terminal for this session.
    Rejected { reason: String },
}

impl SessionState {
    /// The tracked player id once joined.
    pub fn local(&self) -> Option<&PlayerId> {
        match self {
            SessionState::Joined { local } => Some(local),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SessionState::Rejected { .. })
    }
}

/// Everything the client knows. Owned by the reactor, never global.
pub struct ClientContext {
    pub world: World,
    pub camera: Camera,
    pub reducer: IntentReducer,
    pub catalog: SpriteCatalog,
    pub compositor: Compositor,
    pub link: LinkStatus,
    pub session: SessionState,
    pub username: String,
    pub surface: Vec2,
    pub world_size: Vec2,
    /// Set by camera, link, session and asset changes; world mutations carry their own flag.
    pub dirty: bool,
    /// Frames produced so far.
    pub redraws: u64,
}

impl ClientContext {
    pub fn new(
        username: impl Into<String>,
        catalog: SpriteCatalog,
        surface: Vec2,
        world_size: Vec2,
    ) -> Self {
        Self {
            world: World::new(),
            camera: Camera::new(surface),
            reducer: IntentReducer::new(),
            catalog,
            compositor: Compositor::default(),
            link: LinkStatus::Connecting,
            session: SessionState::Idle,
            username: username.into(),
            surface,
            world_size,
            dirty: true,
            redraws: 0,
        }
    }

    /// Whether the next tick will produce a frame.
    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.world.is_dirty()
    }

    /// Connection indicator for the current link and session.
    pub fn status_badge(&self) -> StatusBadge {
        match (&self.session, self.link) {
            (SessionState::Rejected { reason }, _) => {
                StatusBadge::new(format!("Rejected: {reason}"), Rgba::RED)
            }
            (_, LinkStatus::Disconnected) => StatusBadge::new("Disconnected", Rgba::RED),
            (_, LinkStatus::Connecting) => StatusBadge::new("Connecting", Rgba::ORANGE),
            (SessionState::Joined { .. }, LinkStatus::Connected) => {
                StatusBadge::new("Connected", Rgba::GREEN)
            }
            (_, LinkStatus::Connected) => StatusBadge::new("Joining", Rgba::ORANGE),
        }
    }

    /// Position the camera should follow, if the tracked player is known.
    pub fn camera_target(&self) -> Option<Vec2> {
        let local = self.session.local()?;
        self.world.get(local).map(|p| p.position())
    }
}
