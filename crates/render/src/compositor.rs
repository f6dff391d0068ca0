use glam::Vec2;
use plaza_assets::{SpriteCatalog, SpriteKey};
use plaza_common::{AvatarKind, Facing, PlayerId, Rect, Rgba};
use plaza_kernel::{PlayerSnapshot, World};
use std::collections::HashSet;

use crate::frame::{DrawCommand, Frame, TextAlign};

/// On-screen sprite width in pixels; height follows the image aspect ratio.
pub const AVATAR_SIZE: f32 = 64.0;

const GLOW_PADDING: f32 = 5.0;
const GLOW_COLOR: Rgba = Rgba::rgb(0, 255, 0).with_alpha(77);
const LABEL_GAP: f32 = 5.0;
const STATUS_ORIGIN: Vec2 = Vec2::new(10.0, 10.0);
const STATUS_SWATCH: f32 = 10.0;
const MINIMAP_DOT_RADIUS: f32 = 3.0;

/// Fixed connection-status indicator content.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBadge {
    pub text: String,
    pub color: Rgba,
}

impl StatusBadge {
    pub fn new(text: impl Into<String>, color: Rgba) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorConfig {
    /// Uniform world-to-minimap scale.
    pub minimap_scale: f32,
    /// Distance of the minimap from the top-right corner.
    pub minimap_margin: f32,
    pub clear_color: Rgba,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            minimap_scale: 0.1,
            minimap_margin: 10.0,
            clear_color: Rgba::GRAY,
        }
    }
}

/// Everything a frame is composed from.
pub struct Scene<'a> {
    pub world: &'a World,
    /// Current viewport; its size is the output size.
    pub viewport: Rect,
    pub world_size: Vec2,
    /// The locally controlled player, once joined.
    pub local: Option<&'a PlayerId>,
    pub status: &'a StatusBadge,
}

/// Source facing and mirroring for a sprite.
///
/// Avatar art is authored facing east; west-facing players reuse the east
/// frames mirrored.
pub fn sprite_facing(facing: Facing) -> (Facing, bool) {
    match facing {
        Facing::West => (Facing::East, true),
        other => (other, false),
    }
}

/// Turns world state into a [`Frame`].
#[derive(Debug, Default)]
pub struct Compositor {
    config: CompositorConfig,
    warned_kinds: HashSet<AvatarKind>,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            config,
            warned_kinds: HashSet::new(),
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Compose one frame. Requests missing images from the catalog as a side effect.
    pub fn compose(&mut self, scene: &Scene<'_>, catalog: &mut SpriteCatalog) -> Frame {
        let _span = tracing::info_span!("compose").entered();
        let output = scene.viewport.size();
        let mut frame = Frame::new(output);

        let backdrop = catalog.backdrop();
        match &backdrop {
            Some(image) => frame.main.push(DrawCommand::Image {
                source: image.source().to_owned(),
                src: scene.viewport,
                dst: Rect::new(0.0, 0.0, output.x, output.y),
            }),
            None => frame.main.push(DrawCommand::Clear {
                color: self.config.clear_color,
            }),
        }

        let local = scene.local.and_then(|id| scene.world.get(id));

        // Peers first so the local player paints above them.
        let peers = scene
            .world
            .all()
            .filter(|p| Some(&p.id) != scene.local);
        for player in peers.chain(local) {
            self.draw_player(scene, catalog, &mut frame, player, Some(&player.id) == scene.local);
        }

        self.draw_status(scene.status, &mut frame);

        if let (Some(image), Some(_)) = (&backdrop, local) {
            self.draw_minimap(scene, image.source(), &mut frame);
        }

        tracing::trace!(
            drawn = frame.stats.drawn,
            culled = frame.stats.culled,
            missing = frame.stats.missing,
            "frame composed"
        );
        frame
    }

    fn draw_player(
        &mut self,
        scene: &Scene<'_>,
        catalog: &mut SpriteCatalog,
        frame: &mut Frame,
        player: &PlayerSnapshot,
        is_local: bool,
    ) {
        let screen = player.position() - scene.viewport.top_left();
        if is_culled(screen, frame.size) {
            frame.stats.culled += 1;
            return;
        }

        if is_local {
            frame.main.push(DrawCommand::Circle {
                center: screen,
                radius: AVATAR_SIZE / 2.0 + GLOW_PADDING,
                fill: GLOW_COLOR,
                additive: true,
            });
        }

        let Some(descriptor) = scene.world.avatar(&player.avatar) else {
            if self.warned_kinds.insert(player.avatar.clone()) {
                tracing::warn!(
                    player = %player.id,
                    kind = %player.avatar,
                    "no descriptor for avatar kind; not drawing players using it"
                );
            }
            frame.stats.missing += 1;
            return;
        };

        let (source_facing, mirrored) = sprite_facing(player.facing);
        let Some(source) = descriptor.frame(source_facing, player.animation_frame) else {
            tracing::trace!(player = %player.id, facing = %source_facing, frame = player.animation_frame, "descriptor has no such frame");
            frame.stats.missing += 1;
            return;
        };
        let key = SpriteKey::new(player.avatar.clone(), source_facing, player.animation_frame);
        let Some(image) = catalog.sprite(&key, source) else {
            frame.stats.missing += 1;
            return;
        };

        let width = AVATAR_SIZE;
        let height = AVATAR_SIZE * image.aspect();
        frame.main.push(DrawCommand::Sprite {
            source: image.source().to_owned(),
            dst: Rect::new(screen.x - width / 2.0, screen.y - height / 2.0, width, height),
            mirrored,
        });
        frame.main.push(DrawCommand::Text {
            text: player.username.clone(),
            position: Vec2::new(screen.x, screen.y - height / 2.0 - LABEL_GAP),
            align: TextAlign::Center,
            fill: Rgba::WHITE,
            stroke: Some(Rgba::BLACK),
        });
        frame.stats.drawn += 1;
    }

    fn draw_status(&self, status: &StatusBadge, frame: &mut Frame) {
        frame.main.push(DrawCommand::FillRect {
            rect: Rect::new(STATUS_ORIGIN.x, STATUS_ORIGIN.y, STATUS_SWATCH, STATUS_SWATCH),
            color: status.color,
        });
        frame.main.push(DrawCommand::Text {
            text: status.text.clone(),
            position: Vec2::new(
                STATUS_ORIGIN.x + STATUS_SWATCH + 6.0,
                STATUS_ORIGIN.y + STATUS_SWATCH,
            ),
            align: TextAlign::Left,
            fill: Rgba::WHITE,
            stroke: None,
        });
    }

    fn draw_minimap(&self, scene: &Scene<'_>, backdrop: &str, frame: &mut Frame) {
        let scale = self.config.minimap_scale;
        let size = scene.world_size * scale;
        let origin = Vec2::new(
            frame.size.x - size.x - self.config.minimap_margin,
            self.config.minimap_margin,
        );

        frame.minimap.push(DrawCommand::Image {
            source: backdrop.to_owned(),
            src: Rect::new(0.0, 0.0, scene.world_size.x, scene.world_size.y),
            dst: Rect::new(origin.x, origin.y, size.x, size.y),
        });
        for player in scene.world.all() {
            let fill = if Some(&player.id) == scene.local {
                Rgba::GREEN
            } else {
                Rgba::RED
            };
            frame.minimap.push(DrawCommand::Circle {
                center: origin + player.position() * scale,
                radius: MINIMAP_DOT_RADIUS,
                fill,
                additive: false,
            });
        }
        let view = scene.viewport.scaled(scale);
        frame.minimap.push(DrawCommand::StrokeRect {
            rect: Rect::new(origin.x + view.x, origin.y + view.y, view.width, view.height),
            color: Rgba::WHITE,
            width: 1.0,
        });
    }
}

/// True when the screen position lies more than one avatar size outside the output.
fn is_culled(screen: Vec2, output: Vec2) -> bool {
    screen.x < -AVATAR_SIZE
        || screen.x > output.x + AVATAR_SIZE
        || screen.y < -AVATAR_SIZE
        || screen.y > output.y + AVATAR_SIZE
}
