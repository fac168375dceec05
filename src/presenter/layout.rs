//! Floating panel placement.
//!
//! The panel is rendered hidden at a provisional width, measured by the host,
//! then placed here: right of and below the anchor when it fits, flipped left
//! or above when it does not, and height-capped with internal scrolling when
//! neither side has room.

use serde::Serialize;

use crate::geometry::{Point, Size};

/// Affordance icon offset from the anchor, both axes.
pub const AFFORDANCE_OFFSET: f64 = 10.0;
/// Panel offset from the anchor, both axes.
pub const PANEL_OFFSET: f64 = 15.0;
/// Minimum distance kept from viewport edges.
pub const EDGE_MARGIN: f64 = 10.0;

const VIEWPORT_WIDTH_SHARE: f64 = 0.8;
const ABOVE_MIN_SPACE: f64 = 300.0;
const CAPPED_TOP: f64 = 20.0;
const CAPPED_HEIGHT_SHARE: f64 = 0.8;
const CAPPED_ANCHOR_GAP: f64 = 40.0;
const CAPPED_BOTTOM_GAP: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelLayout {
    pub position: Point,
    pub width: f64,
    /// Set when content must scroll inside the panel.
    pub max_height: Option<f64>,
}

impl PanelLayout {
    /// Height actually occupied on screen by content of `content_height`.
    pub fn visible_height(&self, content_height: f64) -> f64 {
        self.max_height
            .map_or(content_height, |cap| cap.min(content_height))
    }
}

/// Width the panel is rendered at, before and after measurement.
pub fn provisional_width(viewport: Size, max_width: f64) -> f64 {
    (viewport.width * VIEWPORT_WIDTH_SHARE).min(max_width).max(0.0)
}

pub fn affordance_position(anchor: Point) -> Point {
    anchor.offset(AFFORDANCE_OFFSET, AFFORDANCE_OFFSET)
}

/// Place a panel whose content measured `measured` at the provisional width.
pub fn place(anchor: Point, measured: Size, viewport: Size, max_width: f64) -> PanelLayout {
    let width = provisional_width(viewport, max_width);
    let (vw, vh) = (viewport.width, viewport.height);
    let h = measured.height;

    let mut x = anchor.x + PANEL_OFFSET;
    if x + measured.width > vw {
        x = (anchor.x - measured.width - PANEL_OFFSET).max(EDGE_MARGIN);
    }

    let mut y = anchor.y + PANEL_OFFSET;
    let mut max_height = None;
    let space_below = vh - y;
    let space_above = anchor.y - EDGE_MARGIN;

    if h > space_below {
        if space_above > space_below && space_above > ABOVE_MIN_SPACE.min(h / 2.0) {
            y = (anchor.y - h - PANEL_OFFSET).max(EDGE_MARGIN);
            let room = anchor.y - PANEL_OFFSET - y;
            if h > room {
                max_height = Some(room.max(0.0));
            }
        } else if anchor.y > vh / 2.0 {
            y = CAPPED_TOP;
            max_height = Some((vh * CAPPED_HEIGHT_SHARE).min(anchor.y - CAPPED_ANCHOR_GAP).max(0.0));
        } else {
            max_height = Some((vh * CAPPED_HEIGHT_SHARE).min(vh - y - CAPPED_BOTTOM_GAP).max(0.0));
        }
    }

    let mut visible = max_height.map_or(h, |cap| cap.min(h));
    if y + visible > vh && visible > vh - 2.0 * EDGE_MARGIN {
        let cap = (vh - 2.0 * EDGE_MARGIN).max(0.0);
        max_height = Some(cap);
        visible = visible.min(cap);
    }

    PanelLayout {
        position: Point::new(fit(x, width, vw), fit(y, visible, vh)),
        width,
        max_height,
    }
}

/// Pull `start` back inside `[0, limit]` for a span of `extent`, keeping the
/// edge margin when there is room for it. In-bounds starts are untouched.
fn fit(start: f64, extent: f64, limit: f64) -> f64 {
    if start >= 0.0 && start + extent <= limit {
        return start;
    }
    let latest = (limit - extent - EDGE_MARGIN).max(0.0);
    start.clamp(EDGE_MARGIN.min(latest), latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: Size = Size::new(1280.0, 800.0);

    fn assert_inside(layout: &PanelLayout, content_height: f64, viewport: Size) {
        let p = layout.position;
        let visible = layout.visible_height(content_height);
        assert!(p.x >= 0.0 && p.y >= 0.0, "{layout:?}");
        assert!(p.x + layout.width <= viewport.width + 1e-9, "{layout:?} in {viewport:?}");
        assert!(p.y + visible <= viewport.height + 1e-9, "{layout:?} h={content_height} in {viewport:?}");
    }

    #[test]
    fn width_is_capped_by_setting_and_viewport() {
        assert_eq!(provisional_width(DESKTOP, 400.0), 400.0);
        assert_eq!(provisional_width(Size::new(300.0, 600.0), 400.0), 240.0);
    }

    #[test]
    fn fits_below_right() {
        let layout = place(Point::new(100.0, 100.0), Size::new(400.0, 200.0), DESKTOP, 400.0);
        assert_eq!(
            layout,
            PanelLayout { position: Point::new(115.0, 115.0), width: 400.0, max_height: None }
        );
    }

    #[test]
    fn flips_left_near_right_edge() {
        let layout = place(Point::new(1200.0, 100.0), Size::new(400.0, 200.0), DESKTOP, 400.0);
        assert_eq!(layout.position, Point::new(785.0, 115.0));
    }

    #[test]
    fn flips_left_clamped_to_margin() {
        let narrow = Size::new(500.0, 800.0);
        let layout = place(Point::new(200.0, 100.0), Size::new(400.0, 100.0), narrow, 400.0);
        assert_eq!(layout.position.x, EDGE_MARGIN);
    }

    #[test]
    fn goes_above_when_room_above() {
        let layout = place(Point::new(600.0, 700.0), Size::new(400.0, 300.0), DESKTOP, 400.0);
        assert_eq!(layout.position, Point::new(615.0, 385.0));
        assert_eq!(layout.max_height, None);
    }

    #[test]
    fn above_placement_caps_oversized_content() {
        let layout = place(Point::new(600.0, 500.0), Size::new(400.0, 1500.0), DESKTOP, 400.0);
        assert_eq!(layout.position.y, EDGE_MARGIN);
        assert_eq!(layout.max_height, Some(475.0));
    }

    #[test]
    fn upper_half_anchor_scrolls_below() {
        let layout = place(Point::new(600.0, 200.0), Size::new(400.0, 1500.0), DESKTOP, 400.0);
        assert_eq!(layout.position.y, 215.0);
        assert_eq!(layout.max_height, Some(565.0));
    }

    #[test]
    fn lower_half_anchor_scrolls_from_top() {
        let short = Size::new(1280.0, 400.0);
        let layout = place(Point::new(600.0, 250.0), Size::new(400.0, 1000.0), short, 400.0);
        assert_eq!(layout.position.y, CAPPED_TOP);
        assert_eq!(layout.max_height, Some(210.0));
    }

    #[test]
    fn sweep_stays_inside_viewport() {
        let viewports = [DESKTOP, Size::new(390.0, 844.0), Size::new(1024.0, 300.0)];
        for viewport in viewports {
            for ax in (0..=20).map(|i| viewport.width * i as f64 / 20.0) {
                for ay in (0..=20).map(|i| viewport.height * i as f64 / 20.0) {
                    for w in [50.0, 300.0, viewport.width * 0.8, viewport.width * 1.5] {
                        for h in [20.0, 150.0, 400.0, viewport.height, viewport.height * 3.0] {
                            let layout = place(Point::new(ax, ay), Size::new(w, h), viewport, 600.0);
                            assert_inside(&layout, h, viewport);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn affordance_offset() {
        assert_eq!(affordance_position(Point::new(5.0, 7.0)), Point::new(15.0, 17.0));
    }
}
