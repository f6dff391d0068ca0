use glam::Vec2;
use plaza_common::Rect;

/// Center an `output`-sized viewport on `target`, clamped inside the world.
///
/// Each axis is clamped independently to `[0, world - output]`. When the
/// output is larger than the world on an axis, that axis is pinned to 0 and
/// the viewport overflows the world on the far side.
pub fn compute_viewport(target: Vec2, output: Vec2, world: Vec2) -> Rect {
    let top_left = target - output / 2.0;
    Rect::new(
        clamp_axis(top_left.x, output.x, world.x),
        clamp_axis(top_left.y, output.y, world.y),
        output.x,
        output.y,
    )
}

fn clamp_axis(value: f32, output: f32, world: f32) -> f32 {
    value.clamp(0.0, (world - output).max(0.0))
}

/// Follows the tracked player. No smoothing: every recompute snaps.
#[derive(Debug, Clone)]
pub struct Camera {
    viewport: Rect,
    recomputes: u64,
}

impl Camera {
    pub fn new(output: Vec2) -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, output.x, output.y),
            recomputes: 0,
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Number of recomputes so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Recompute the viewport.
    ///
    /// With no target the last top-left is kept (re-clamped for the new size).
    pub fn recompute(&mut self, target: Option<Vec2>, output: Vec2, world: Vec2) -> Rect {
        self.recomputes += 1;
        self.viewport = match target {
            Some(position) => compute_viewport(position, output, world),
            None => {
                let held = self.viewport.top_left() + output / 2.0;
                compute_viewport(held, output, world)
            }
        };
        tracing::trace!(
            x = self.viewport.x,
            y = self.viewport.y,
            tracked = target.is_some(),
            "viewport recomputed"
        );
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: Vec2 = Vec2::new(2048.0, 2048.0);
    const OUTPUT: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn clamps_at_origin() {
        let r = compute_viewport(Vec2::ZERO, OUTPUT, WORLD);
        assert_eq!(r.top_left(), Vec2::ZERO);
        assert_eq!(r.size(), OUTPUT);
    }

    #[test]
    fn clamps_at_far_corner() {
        let r = compute_viewport(WORLD, OUTPUT, WORLD);
        assert_eq!(r.top_left(), Vec2::new(1248.0, 1448.0));
    }

    #[test]
    fn centers_when_unclamped() {
        let r = compute_viewport(Vec2::new(1024.0, 1024.0), OUTPUT, WORLD);
        assert_eq!(r.top_left(), Vec2::new(624.0, 724.0));
    }

    #[test]
    fn world_smaller_than_output_pins_to_zero() {
        let small = Vec2::new(500.0, 2048.0);
        let r = compute_viewport(Vec2::new(400.0, 1024.0), OUTPUT, small);
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 724.0);

        let tiny = Vec2::new(100.0, 100.0);
        let r = compute_viewport(Vec2::new(90.0, 90.0), OUTPUT, tiny);
        assert_eq!(r.top_left(), Vec2::ZERO);
        assert!(r.x >= 0.0 && r.y >= 0.0);
    }

    #[test]
    fn camera_freezes_without_target() {
        let mut cam = Camera::new(OUTPUT);
        cam.recompute(Some(Vec2::new(1024.0, 1024.0)), OUTPUT, WORLD);
        let frozen = cam.recompute(None, OUTPUT, WORLD);
        assert_eq!(frozen.top_left(), Vec2::new(624.0, 724.0));
        assert_eq!(cam.recomputes(), 2);
    }

    #[test]
    fn frozen_camera_stays_clamped_after_resize() {
        let mut cam = Camera::new(OUTPUT);
        cam.recompute(Some(WORLD), OUTPUT, WORLD);
        let bigger = Vec2::new(1600.0, 1200.0);
        let r = cam.recompute(None, bigger, WORLD);
        assert_eq!(r.size(), bigger);
        assert!(r.right() <= WORLD.x && r.bottom() <= WORLD.y);
    }
}
