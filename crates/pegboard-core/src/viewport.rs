//! Viewport state: zoom scale and scroll offset.

use crate::config::BoardConfig;
use crate::coords::CoordinateSpace;
use crate::placement::DEFAULT_VIEW_SIZE;
use kurbo::{Point, Rect, Size, Vec2};

/// Owns the zoom scale and scroll offset of the board's scroll container.
///
/// The container geometry (client origin and size) is supplied by the host
/// through [`set_viewport`](Self::set_viewport); nothing is looked up.
#[derive(Debug, Clone)]
pub struct ViewportController {
    scale: f64,
    /// Scroll offset in screen pixels.
    scroll: Vec2,
    /// Client position of the container's top-left corner.
    origin: Point,
    /// Client size of the container.
    size: Size,
    /// Whether the host has supplied real container geometry.
    live: bool,
    board_size: Size,
    min_scale: f64,
    max_scale: f64,
    wheel_zoom_divisor: f64,
}

impl ViewportController {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            scale: config.clamp_scale(1.0),
            scroll: Vec2::ZERO,
            origin: Point::ZERO,
            size: DEFAULT_VIEW_SIZE,
            live: false,
            board_size: config.board_size,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            wheel_zoom_divisor: config.wheel_zoom_divisor,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Whether [`set_viewport`](Self::set_viewport) has been called.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Update the container geometry after a layout change.
    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        self.origin = origin;
        self.size = size;
        self.live = true;
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// The current client/board mapping.
    pub fn space(&self) -> CoordinateSpace {
        CoordinateSpace::new(self.origin, self.scroll, self.scale)
    }

    pub fn to_board(&self, client: Point) -> Point {
        self.space().to_board(client)
    }

    pub fn to_screen(&self, board: Point) -> Point {
        self.space().to_screen(board)
    }

    /// Largest scroll offset the container allows at the current scale.
    pub fn max_scroll(&self) -> Vec2 {
        Vec2::new(
            (self.board_size.width * self.scale - self.size.width).max(0.0),
            (self.board_size.height * self.scale - self.size.height).max(0.0),
        )
    }

    fn clamp_scroll(&self, scroll: Vec2) -> Vec2 {
        let max = self.max_scroll();
        Vec2::new(scroll.x.clamp(0.0, max.x), scroll.y.clamp(0.0, max.y))
    }

    /// Set the scroll offset, limited to what the container permits.
    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = self.clamp_scroll(scroll);
    }

    /// Scroll by `delta` screen pixels.
    pub fn scroll_by(&mut self, delta: Vec2) {
        self.set_scroll(self.scroll + delta);
    }

    /// Pan so the content follows a pointer that moved by `pointer_delta`.
    pub fn pan(&mut self, pointer_delta: Vec2) {
        self.scroll_by(-pointer_delta);
    }

    /// Zoom to `target_scale`, keeping the board point under `focal` (client) in place.
    ///
    /// Returns `false` if the clamped scale did not change. The focal point stays
    /// anchored as long as the adjusted offset is inside the scroll limits.
    pub fn zoom_at(&mut self, focal: Point, target_scale: f64) -> bool {
        let new_scale = target_scale.clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let board = self.to_board(focal);
        self.scale = new_scale;

        let local = focal - self.origin;
        self.set_scroll(Vec2::new(
            board.x * new_scale - local.x,
            board.y * new_scale - local.y,
        ));
        log::debug!("zoomed to {new_scale:.3} at {focal:?}");
        true
    }

    /// Zoom by a wheel delta with an exponential response.
    pub fn wheel_zoom(&mut self, focal: Point, delta_y: f64) -> bool {
        let factor = (-delta_y / self.wheel_zoom_divisor).exp();
        self.zoom_at(focal, self.scale * factor)
    }

    /// The part of the board currently visible, in board coordinates.
    pub fn visible_region(&self) -> Rect {
        Rect::new(
            self.scroll.x / self.scale,
            self.scroll.y / self.scale,
            (self.scroll.x + self.size.width) / self.scale,
            (self.scroll.y + self.size.height) / self.scale,
        )
    }
}
