use glam::Vec2;
use plaza_common::{Rect, Rgba};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// One drawing operation in screen space (pixels, top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole layer with a color.
    Clear { color: Rgba },
    /// Copy the `src` region of an image (image pixels) into `dst` (screen).
    Image { source: String, src: Rect, dst: Rect },
    /// Draw a whole sprite into `dst`, mirrored horizontally about the
    /// center of `dst` when `mirrored` is set.
    Sprite {
        source: String,
        dst: Rect,
        mirrored: bool,
    },
    /// Filled circle; `additive` blends by adding light.
    Circle {
        center: Vec2,
        radius: f32,
        fill: Rgba,
        additive: bool,
    },
    FillRect { rect: Rect, color: Rgba },
    StrokeRect { rect: Rect, color: Rgba, width: f32 },
    /// Text anchored at `position` (baseline); `stroke` draws an outline first.
    Text {
        text: String,
        position: Vec2,
        align: TextAlign,
        fill: Rgba,
        stroke: Option<Rgba>,
    },
}

/// Per-frame composition counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Entities whose sprite was drawn.
    pub drawn: usize,
    /// Entities skipped by the visibility cull.
    pub culled: usize,
    /// Entities skipped because their descriptor or sprite is not available.
    pub missing: usize,
}

/// A composed frame: the main scene layer and the minimap overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub size: Vec2,
    pub main: Vec<DrawCommand>,
    pub minimap: Vec<DrawCommand>,
    pub stats: FrameStats,
}

impl Frame {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Every command in paint order: main scene, then minimap.
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.main.iter().chain(self.minimap.iter())
    }

    /// Sprite commands in the main layer.
    pub fn sprites(&self) -> impl Iterator<Item = &DrawCommand> {
        self.main
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { .. }))
    }

    pub fn has_minimap(&self) -> bool {
        !self.minimap.is_empty()
    }
}
