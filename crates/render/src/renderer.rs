use std::fmt::Write as _;

use crate::frame::{DrawCommand, Frame, TextAlign};

/// Backend-agnostic presentation of a composed [`Frame`].
///
/// Renderers only consume display lists; world truth is never visible here.
pub trait Renderer {
    /// What one presented frame produces.
    type Output;

    fn render(&mut self, frame: &Frame) -> Self::Output;
}

/// Renders frames as a line-per-command text dump.
///
/// Used by the CLI and by tests to see what would be painted.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &Frame) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) drawn={} culled={} missing={} ===",
            self.frames,
            frame.size.x,
            frame.size.y,
            frame.stats.drawn,
            frame.stats.culled,
            frame.stats.missing
        );
        for cmd in &frame.main {
            describe(&mut out, cmd);
        }
        if frame.has_minimap() {
            out.push_str("--- minimap ---\n");
            for cmd in &frame.minimap {
                describe(&mut out, cmd);
            }
        }
        out
    }
}

fn describe(out: &mut String, cmd: &DrawCommand) {
    let _ = match cmd {
        DrawCommand::Clear { color } => {
            writeln!(out, "  clear rgba({},{},{},{})", color.r, color.g, color.b, color.a)
        }
        DrawCommand::Image { source, src, dst } => writeln!(
            out,
            "  image {source} src=({:.1}, {:.1} {:.1}x{:.1}) dst=({:.1}, {:.1} {:.1}x{:.1})",
            src.x, src.y, src.width, src.height, dst.x, dst.y, dst.width, dst.height
        ),
        DrawCommand::Sprite {
            source,
            dst,
            mirrored,
        } => writeln!(
            out,
            "  sprite {source} at=({:.1}, {:.1}) size={:.1}x{:.1}{}",
            dst.x,
            dst.y,
            dst.width,
            dst.height,
            if *mirrored { " mirrored" } else { "" }
        ),
        DrawCommand::Circle {
            center,
            radius,
            additive,
            ..
        } => writeln!(
            out,
            "  circle center=({:.1}, {:.1}) r={radius:.1}{}",
            center.x,
            center.y,
            if *additive { " additive" } else { "" }
        ),
        DrawCommand::FillRect { rect, .. } => writeln!(
            out,
            "  fill ({:.1}, {:.1} {:.1}x{:.1})",
            rect.x, rect.y, rect.width, rect.height
        ),
        DrawCommand::StrokeRect { rect, .. } => writeln!(
            out,
            "  outline ({:.1}, {:.1} {:.1}x{:.1})",
            rect.x, rect.y, rect.width, rect.height
        ),
        DrawCommand::Text {
            text,
            position,
            align,
            ..
        } => {
            let align = match align {
                TextAlign::Left => "left",
                TextAlign::Center => "center",
            };
            writeln!(
                out,
                "  text {text:?} at=({:.1}, {:.1}) {align}",
                position.x, position.y
            )
        }
    };
}
