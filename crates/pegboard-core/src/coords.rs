//! Conversion between client (pointer) pixels and board coordinates.

use kurbo::{Affine, Point, Vec2};

/// A snapshot of the values needed to map between client and board space.
///
/// `origin` is the client position of the scroll container's top-left corner,
/// `scroll` its scroll offset in screen pixels, and `scale` the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSpace {
    pub origin: Point,
    pub scroll: Vec2,
    pub scale: f64,
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            scroll: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl CoordinateSpace {
    pub fn new(origin: Point, scroll: Vec2, scale: f64) -> Self {
        Self { origin, scroll, scale }
    }

    /// Map a client point to board coordinates.
    pub fn to_board(&self, client: Point) -> Point {
        let (x, y) = to_board(
            client.x,
            client.y,
            self.origin.x,
            self.origin.y,
            self.scroll.x,
            self.scroll.y,
            self.scale,
        );
        Point::new(x, y)
    }

    /// Map a board point to client coordinates.
    pub fn to_screen(&self, board: Point) -> Point {
        let (x, y) = to_screen(
            board.x,
            board.y,
            self.origin.x,
            self.origin.y,
            self.scroll.x,
            self.scroll.y,
            self.scale,
        );
        Point::new(x, y)
    }

    /// Board-to-client transform, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2() - self.scroll) * Affine::scale(self.scale)
    }
}

/// `board = (client - origin + scroll) / scale`, per axis.
pub fn to_board(
    client_x: f64,
    client_y: f64,
    origin_left: f64,
    origin_top: f64,
    scroll_left: f64,
    scroll_top: f64,
    scale: f64,
) -> (f64, f64) {
    (
        (client_x - origin_left + scroll_left) / scale,
        (client_y - origin_top + scroll_top) / scale,
    )
}

/// Inverse of [`to_board`].
pub fn to_screen(
    board_x: f64,
    board_y: f64,
    origin_left: f64,
    origin_top: f64,
    scroll_left: f64,
    scroll_top: f64,
    scale: f64,
) -> (f64, f64) {
    (
        board_x * scale - scroll_left + origin_left,
        board_y * scale - scroll_top + origin_top,
    )
}
