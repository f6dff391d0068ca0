use glam::Vec2;
use plaza_assets::{AssetError, Image, ImageKey, SpriteCatalog, SpriteLoader};
use plaza_common::PlayerId;
use plaza_input::{InputEvent, Intent};
use plaza_kernel::WorldEvent;
use plaza_net::{ClientMessage, JoinOutcome, LinkEvent, Outbox, ServerMessage};
use plaza_render::{Frame, Scene};

use crate::config::ClientConfig;
use crate::context::{ClientContext, LinkStatus, SessionState};

/// One unit of work for the reactor.
#[derive(Debug)]
pub enum Event {
    Link(LinkEvent),
    Input(InputEvent),
    /// Input focus lost; every held key counts as released.
    Blur,
    Resize { width: f32, height: f32 },
    SpriteResolved {
        key: ImageKey,
        result: Result<Image, AssetError>,
    },
    /// Render cadence. Produces a frame only when something changed.
    Tick,
}

/// The reactor: applies events to the context and talks to the outbox.
pub struct Client<O> {
    ctx: ClientContext,
    outbox: O,
}

impl<O: Outbox> Client<O> {
    pub fn new(ctx: ClientContext, outbox: O) -> Self {
        Self { ctx, outbox }
    }

    pub fn from_config(
        config: &ClientConfig,
        loader: impl SpriteLoader + 'static,
        outbox: O,
    ) -> Self {
        let mut catalog = SpriteCatalog::new(loader);
        if let Some(background) = &config.background {
            catalog = catalog.with_backdrop(background.clone());
        }
        let ctx = ClientContext::new(
            config.username.clone(),
            catalog,
            config.surface_size(),
            config.world_size(),
        );
        Self::new(ctx, outbox)
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn session(&self) -> &SessionState {
        &self.ctx.session
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }

    /// Apply one event to completion. Returns a frame for a tick that had work.
    pub fn handle(&mut self, event: Event) -> Option<Frame> {
        match event {
            Event::Link(link) => self.on_link(link),
            Event::Input(input) => {
                if let Some(intent) = self.ctx.reducer.apply(input) {
                    self.on_intent(intent);
                }
            }
            Event::Blur => {
                if let Some(intent) = self.ctx.reducer.release_all() {
                    self.on_intent(intent);
                }
            }
            Event::Resize { width, height } => self.on_resize(Vec2::new(width, height)),
            Event::SpriteResolved { key, result } => {
                if self.ctx.catalog.complete(key, result) {
                    self.ctx.dirty = true;
                }
            }
            Event::Tick => return self.tick(),
        }
        None
    }

    /// Compose a frame if anything changed since the last one.
    pub fn tick(&mut self) -> Option<Frame> {
        if !self.ctx.needs_redraw() {
            return None;
        }
        let status = self.ctx.status_badge();
        let scene = Scene {
            world: &self.ctx.world,
            viewport: self.ctx.camera.viewport(),
            world_size: self.ctx.world_size,
            local: self.ctx.session.local(),
            status: &status,
        };
        let frame = self.ctx.compositor.compose(&scene, &mut self.ctx.catalog);
        self.ctx.world.clear_dirty();
        self.ctx.dirty = false;
        self.ctx.redraws += 1;
        Some(frame)
    }

    fn on_link(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened => {
                self.ctx.link = LinkStatus::Connected;
                self.ctx.dirty = true;
                if let SessionState::Rejected { reason } = &self.ctx.session {
                    tracing::info!(%reason, "link open; join was rejected earlier, not rejoining");
                    return;
                }
                let join = ClientMessage::Join {
                    username: self.ctx.username.clone(),
                };
                if self.send(&join) && self.ctx.session == SessionState::Idle {
                    self.ctx.session = SessionState::Joining;
                }
            }
            LinkEvent::Closed => {
                if self.ctx.link != LinkStatus::Disconnected {
                    tracing::info!("link lost; keeping last known world");
                }
                self.ctx.link = LinkStatus::Disconnected;
                self.ctx.dirty = true;
            }
            LinkEvent::Error(error) => tracing::warn!(%error, "link error"),
            LinkEvent::Message(text) => self.on_message(&text),
        }
    }

    fn on_message(&mut self, text: &str) {
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(%error, "dropping malformed message");
                return;
            }
        };
        tracing::trace!(action = message.action(), "inbound");

        match message {
            ServerMessage::JoinResult(outcome) => self.on_join_result(outcome),
            ServerMessage::BulkMove { players } => self.ctx.world.upsert_many(players),
            ServerMessage::EntityJoined { player, avatar } => {
                tracing::debug!(player = %player.id, kind = %player.avatar, "player joined");
                self.ctx.world.upsert_one(player, avatar);
            }
            ServerMessage::EntityLeft { player_id } => {
                tracing::debug!(player = %player_id, "player left");
                self.ctx.world.remove(&player_id);
            }
            ServerMessage::Unknown(action) => {
                tracing::warn!(%action, "ignoring message with unknown action");
            }
        }
        self.follow_tracked(false);
    }

    fn on_join_result(&mut self, outcome: JoinOutcome) {
        if self.ctx.session.is_rejected() {
            tracing::warn!("ignoring join-result after rejection");
            return;
        }
        match outcome {
            JoinOutcome::Accepted {
                player_id,
                players,
                avatars,
            } => {
                tracing::info!(
                    player = %player_id,
                    players = players.len(),
                    avatars = avatars.len(),
                    "joined"
                );
                if !players.contains_key(&player_id) {
                    tracing::warn!(player = %player_id, "join snapshot does not include the local player");
                }
                self.ctx.world.replace_all(players, avatars);
                self.ctx.session = SessionState::Joined { local: player_id };
            }
            JoinOutcome::Rejected { reason } => {
                tracing::error!(%reason, "join rejected");
                self.ctx.session = SessionState::Rejected { reason };
            }
        }
        self.ctx.dirty = true;
    }

    fn on_intent(&mut self, intent: Intent) {
        let message = match intent {
            Intent::Move { direction, fast } => ClientMessage::Move { direction, fast },
            Intent::Stop => ClientMessage::Stop,
        };
        self.send(&message);

        if let Some(facing) = intent.facing() {
            if let Some(local) = self.ctx.session.local() {
                self.ctx.world.set_facing(local, facing);
            }
            self.follow_tracked(true);
        }
    }

    fn on_resize(&mut self, surface: Vec2) {
        if !(surface.x > 0.0 && surface.y > 0.0) {
            tracing::warn!(width = surface.x, height = surface.y, "ignoring degenerate resize");
            return;
        }
        tracing::debug!(width = surface.x, height = surface.y, "surface resized");
        self.ctx.surface = surface;
        self.ctx.dirty = true;
        self.follow_tracked(true);
    }

    /// Send fire-and-forget. Returns false when the message was dropped.
    fn send(&mut self, message: &ClientMessage) -> bool {
        if self.ctx.link != LinkStatus::Connected {
            tracing::debug!(?message, "link down; dropping outbound message");
            return false;
        }
        match self.outbox.send(message) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(%error, ?message, "outbound message dropped");
                false
            }
        }
    }

    /// Drain world changes and recompute the viewport when the tracked
    /// player changed, or unconditionally when `force` is set.
    fn follow_tracked(&mut self, force: bool) {
        let events = self.ctx.world.drain_events();
        let tracked_changed = match self.ctx.session.local() {
            Some(local) => events.iter().any(|e| touches(e, local)),
            None => false,
        };
        if !(force || tracked_changed) {
            return;
        }
        let target = self.ctx.camera_target();
        let before = self.ctx.camera.viewport();
        let after = self
            .ctx
            .camera
            .recompute(target, self.ctx.surface, self.ctx.world_size);
        if after != before {
            self.ctx.dirty = true;
        }
    }
}

fn touches(event: &WorldEvent, local: &PlayerId) -> bool {
    match event {
        WorldEvent::Replaced { .. } => true,
        WorldEvent::Upserted(id) | WorldEvent::Removed(id) => id == local,
        WorldEvent::FacingPredicted { id, .. } => id == local,
        WorldEvent::AvatarAdded(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_assets::{LoadQueue, QueuedLoader};
    use plaza_common::{Direction, Facing, Rect};
    use plaza_net::RecordingOutbox;
    use serde_json::json;

    fn client() -> (Client<RecordingOutbox>, LoadQueue) {
        let config = ClientConfig {
            username: "alice".into(),
            background: Some("world.png".into()),
            ..ClientConfig::default()
        };
        let loader = QueuedLoader::new();
        let queue = loader.queue();
        (Client::from_config(&config, loader, RecordingOutbox::new()), queue)
    }

    fn inbound(value: serde_json::Value) -> Event {
        Event::Link(LinkEvent::Message(value.to_string()))
    }

    fn join_result(id: &str, x: f32, y: f32) -> Event {
        inbound(json!({
            "action": "join-result",
            "success": true,
            "playerId": id,
            "players": {id: {"x": x, "y": y, "facing": "south", "avatar": "fox", "username": "alice"}},
            "avatars": {"fox": {"frames": {"south": ["fox_s0.png"], "east": ["fox_e0.png"]}}}
        }))
    }

    fn bulk_move(id: &str, x: f32, y: f32, facing: &str) -> Event {
        inbound(json!({
            "action": "bulk-move",
            "players": {id: {"x": x, "y": y, "facing": facing, "avatar": "fox"}}
        }))
    }

    /// Connected and joined as p1 at (x, y), with the first frame already drawn.
    fn joined_at(x: f32, y: f32) -> Client<RecordingOutbox> {
        let (mut c, _queue) = client();
        c.handle(Event::Link(LinkEvent::Opened));
        c.handle(join_result("p1", x, y));
        assert!(c.handle(Event::Tick).is_some());
        c.outbox_mut().take();
        c
    }

    fn p1() -> PlayerId {
        PlayerId::from("p1")
    }

    #[test]
    fn link_open_sends_join() {
        let (mut c, _queue) = client();
        assert_eq!(c.session(), &SessionState::Idle);
        c.handle(Event::Link(LinkEvent::Opened));
        assert_eq!(
            c.outbox().sent(),
            &[ClientMessage::Join {
                username: "alice".into()
            }]
        );
        assert_eq!(c.session(), &SessionState::Joining);
        assert_eq!(c.context().status_badge().text, "Joining");
    }

    #[test]
    fn join_then_bulk_move_scenario() {
        let (mut c, _queue) = client();
        c.handle(Event::Link(LinkEvent::Opened));
        c.handle(join_result("p1", 100.0, 100.0));

        let ctx = c.context();
        assert_eq!(ctx.world.player_count(), 1);
        assert!(ctx.world.contains(&p1()));
        assert_eq!(ctx.session.local(), Some(&p1()));
        assert_eq!(ctx.camera.viewport(), Rect::new(0.0, 0.0, 800.0, 600.0));
        assert!(c.handle(Event::Tick).is_some());

        let recomputes = c.context().camera.recomputes();
        let redraws = c.context().redraws;
        c.handle(bulk_move("p1", 110.0, 100.0, "south"));
        assert_eq!(c.context().world.get(&p1()).unwrap().x, 110.0);
        assert_eq!(c.context().camera.recomputes(), recomputes + 1);

        assert!(c.handle(Event::Tick).is_some());
        assert!(c.handle(Event::Tick).is_none());
        assert_eq!(c.context().redraws, redraws + 1);
    }

    #[test]
    fn many_mutations_one_redraw() {
        let mut c = joined_at(1024.0, 1024.0);
        let redraws = c.context().redraws;
        for i in 0..5 {
            c.handle(bulk_move("p1", 1000.0 + i as f32, 1024.0, "east"));
            c.handle(bulk_move("p2", 10.0 * i as f32, 20.0, "west"));
        }
        c.handle(inbound(json!({"action": "entity-left", "playerId": "p2"})));

        assert!(c.handle(Event::Tick).is_some());
        assert!(c.handle(Event::Tick).is_none());
        assert_eq!(c.context().redraws, redraws + 1);
    }

    #[test]
    fn camera_follows_tracked_player_only() {
        let mut c = joined_at(1024.0, 1024.0);
        assert_eq!(c.context().camera.viewport().top_left(), Vec2::new(624.0, 724.0));

        let recomputes = c.context().camera.recomputes();
        c.handle(bulk_move("p2", 5.0, 5.0, "north"));
        assert_eq!(c.context().camera.recomputes(), recomputes);

        c.handle(bulk_move("p1", 2048.0, 2048.0, "north"));
        assert_eq!(c.context().camera.viewport().top_left(), Vec2::new(1248.0, 1448.0));
    }

    #[test]
    fn removed_tracked_player_freezes_viewport() {
        let mut c = joined_at(1024.0, 1024.0);
        c.handle(inbound(json!({"action": "entity-left", "playerId": "p1"})));
        assert!(!c.context().world.contains(&p1()));
        assert_eq!(c.context().camera.viewport().top_left(), Vec2::new(624.0, 724.0));
        // Still renders without a target.
        assert!(c.handle(Event::Tick).is_some());
    }

    #[test]
    fn rejection_is_terminal() {
        let (mut c, _queue) = client();
        c.handle(Event::Link(LinkEvent::Opened));
        c.handle(inbound(json!({
            "action": "join-result",
            "success": false,
            "error": "name taken"
        })));
        assert_eq!(
            c.session(),
            &SessionState::Rejected {
                reason: "name taken".into()
            }
        );
        assert!(c.context().status_badge().text.contains("name taken"));

        c.handle(Event::Link(LinkEvent::Closed));
        c.handle(Event::Link(LinkEvent::Opened));
        assert_eq!(c.outbox().sent().len(), 1, "no second join");

        // A late success does not revive the session.
        c.handle(join_result("p1", 1.0, 1.0));
        assert!(c.session().is_rejected());
        assert_eq!(c.context().world.player_count(), 0);
    }

    #[test]
    fn reconnect_rejoins_and_keeps_world() {
        let mut c = joined_at(100.0, 100.0);
        c.handle(Event::Link(LinkEvent::Error("reset".into())));
        c.handle(Event::Link(LinkEvent::Closed));
        assert_eq!(c.context().link, LinkStatus::Disconnected);
        assert_eq!(c.context().status_badge().text, "Disconnected");
        assert_eq!(c.context().world.player_count(), 1);

        c.handle(Event::Link(LinkEvent::Opened));
        assert_eq!(
            c.outbox().sent(),
            &[ClientMessage::Join {
                username: "alice".into()
            }]
        );
        assert_eq!(c.session().local(), Some(&p1()));
    }

    #[test]
    fn unknown_action_is_ignored() {
        let mut c = joined_at(100.0, 100.0);
        c.handle(inbound(json!({"action": "chat", "text": "hello"})));
        assert_eq!(c.context().world.player_count(), 1);
        assert!(!c.context().needs_redraw());
    }

    #[test]
    fn malformed_message_leaves_world_untouched() {
        let mut c = joined_at(100.0, 100.0);
        c.handle(inbound(json!({
            "action": "bulk-move",
            "players": {
                "p1": {"x": 500, "y": 500, "facing": "east", "avatar": "fox"},
                "p2": {"x": 1, "facing": "east", "avatar": "fox"}
            }
        })));
        c.handle(Event::Link(LinkEvent::Message("{not json".into())));

        let world = &c.context().world;
        assert_eq!(world.get(&p1()).unwrap().position(), Vec2::new(100.0, 100.0));
        assert!(!world.contains(&PlayerId::from("p2")));
        assert!(!c.context().needs_redraw());
    }

    #[test]
    fn sends_are_dropped_while_disconnected() {
        let (mut c, _queue) = client();
        c.handle(Event::Input(InputEvent::Press(Direction::Up)));
        c.handle(Event::Input(InputEvent::Release(Direction::Up)));
        assert!(c.outbox().sent().is_empty());

        c.handle(Event::Link(LinkEvent::Opened));
        c.handle(Event::Link(LinkEvent::Closed));
        c.outbox_mut().take();
        c.handle(Event::Input(InputEvent::Press(Direction::Down)));
        assert!(c.outbox().sent().is_empty());
    }

    #[test]
    fn move_intent_predicts_facing_until_server_says_otherwise() {
        let mut c = joined_at(1024.0, 1024.0);
        let recomputes = c.context().camera.recomputes();

        c.handle(Event::Input(InputEvent::Press(Direction::Left)));
        assert_eq!(
            c.outbox().sent(),
            &[ClientMessage::Move {
                direction: Direction::Left,
                fast: false
            }]
        );
        assert_eq!(c.context().world.get(&p1()).unwrap().facing, Facing::West);
        assert_eq!(c.context().camera.recomputes(), recomputes + 1);

        // Last write wins: the server snapshot replaces the prediction.
        c.handle(bulk_move("p1", 1020.0, 1024.0, "south"));
        assert_eq!(c.context().world.get(&p1()).unwrap().facing, Facing::South);

        c.handle(Event::Input(InputEvent::ToggleFast));
        c.handle(Event::Blur);
        let sent = c.outbox_mut().take();
        assert_eq!(
            &sent[1..],
            &[
                ClientMessage::Move {
                    direction: Direction::Left,
                    fast: true
                },
                ClientMessage::Stop
            ]
        );
    }

    #[test]
    fn resize_recomputes_viewport() {
        let mut c = joined_at(1024.0, 1024.0);
        c.handle(Event::Resize {
            width: 1024.0,
            height: 768.0,
        });
        assert_eq!(
            c.context().camera.viewport(),
            Rect::new(512.0, 640.0, 1024.0, 768.0)
        );
        assert!(c.context().needs_redraw());

        let recomputes = c.context().camera.recomputes();
        c.handle(Event::Resize {
            width: 0.0,
            height: 768.0,
        });
        assert_eq!(c.context().camera.recomputes(), recomputes);
    }

    #[test]
    fn resolved_sprite_triggers_redraw() {
        let (mut c, queue) = client();
        c.handle(Event::Link(LinkEvent::Opened));
        c.handle(join_result("p1", 100.0, 100.0));
        let first = c.handle(Event::Tick).unwrap();
        assert_eq!(first.sprites().count(), 0);
        assert!(!c.context().needs_redraw());

        for (key, source) in queue.drain() {
            let image = Image::blank(source, 32, 32);
            c.handle(Event::SpriteResolved {
                key,
                result: Ok(image),
            });
        }
        assert!(c.context().needs_redraw());
        let second = c.handle(Event::Tick).unwrap();
        assert_eq!(second.sprites().count(), 1);
        assert!(second.has_minimap());
    }
}
