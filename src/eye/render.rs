//! Eye rasterizer
//!
//! Pure functions from a frame description to an RGBA image. Shapes are
//! drawn with signed-distance coverage so the curved edges stay smooth at
//! tray-icon sizes.

use image::{Rgba, RgbaImage};
use tray_icon::Icon;

use crate::eye::geometry::EyeGeometry;
use crate::eye::state::{EyeFrame, PupilOffset, RenderRequest};

const EYE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([16, 16, 16, 255]);
const PUPIL: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LID: Rgba<u8> = Rgba([128, 128, 128, 255]);

const OUTLINE_WIDTH: f32 = 2.0;
/// Half-height of the closed-eye slit and of the sleepy lid.
const SLIT_HALF_HEIGHT: f32 = 5.0;

/// Rasterize one frame: both eyes composited onto a transparent canvas.
pub fn render_eyes(request: &RenderRequest, geometry: &EyeGeometry) -> RgbaImage {
    let mut img = RgbaImage::new(geometry.canvas_width(), geometry.canvas_height());
    draw_eye(&mut img, geometry.left_center(), &request.left, request.sleepy, geometry);
    draw_eye(&mut img, geometry.right_center(), &request.right, request.sleepy, geometry);
    img
}

/// A frame of the roll gesture: both pupils riding the max-offset circle.
pub fn render_roll_frame(step: u32, total_steps: u32, geometry: &EyeGeometry) -> RgbaImage {
    let angle = step as f32 / total_steps.max(1) as f32 * std::f32::consts::TAU;
    let pupil = PupilOffset {
        dx: angle.cos() * geometry.max_pupil_offset(),
        dy: angle.sin() * geometry.max_pupil_offset(),
    };
    let frame = EyeFrame { blink: false, pupil };
    render_eyes(&RenderRequest { sleepy: false, left: frame, right: frame }, geometry)
}

/// Convert a rendered frame into a tray icon.
pub fn to_tray_icon(image: RgbaImage) -> anyhow::Result<Icon> {
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height)
        .map_err(|e| anyhow::anyhow!("failed to build tray icon: {e}"))
}

fn draw_eye(
    img: &mut RgbaImage,
    center: (f32, f32),
    frame: &EyeFrame,
    sleepy: bool,
    geometry: &EyeGeometry,
) {
    let (cx, cy) = center;
    let r = geometry.eye_radius;

    // Closed-eye slit replaces the whole eye this frame.
    if frame.blink {
        fill_rect(img, cx - r, cy - SLIT_HALF_HEIGHT, cx + r, cy + SLIT_HALF_HEIGHT, PUPIL);
        return;
    }

    fill_circle(img, cx, cy, r, OUTLINE);
    fill_circle(img, cx, cy, r - OUTLINE_WIDTH, EYE_WHITE);

    // Half-closed lid; no pupil while sleepy.
    if sleepy {
        fill_ellipse(img, cx, cy + 1.0, r, SLIT_HALF_HEIGHT, LID);
        return;
    }

    fill_circle(img, cx + frame.pupil.dx, cy + frame.pupil.dy, geometry.pupil_radius, PUPIL);
}

/// Filled circle with ~1px antialiased rim.
fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let (min_x, max_x, min_y, max_y) =
        clip_box(img, cx - radius, cy - radius, cx + radius, cy + radius);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let d = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy);
            let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(img, x, y, color, coverage);
            }
        }
    }
}

/// Filled axis-aligned ellipse; edge feathered by the shorter semi-axis.
fn fill_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba<u8>) {
    let (min_x, max_x, min_y, max_y) = clip_box(img, cx - rx, cy - ry, cx + rx, cy + ry);
    let feather = rx.min(ry);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let nx = (x as f32 + 0.5 - cx) / rx;
            let ny = (y as f32 + 0.5 - cy) / ry;
            let edge = (1.0 - nx.hypot(ny)) * feather;
            let coverage = (edge + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(img, x, y, color, coverage);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, left: f32, top: f32, right: f32, bottom: f32, color: Rgba<u8>) {
    let (min_x, max_x, min_y, max_y) = clip_box(img, left, top, right, bottom);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            blend(img, x, y, color, 1.0);
        }
    }
}

/// Clamp a float bounding box to valid pixel coordinates.
fn clip_box(img: &RgbaImage, left: f32, top: f32, right: f32, bottom: f32) -> (u32, u32, u32, u32) {
    let min_x = (left.floor().max(0.0)) as u32;
    let min_y = (top.floor().max(0.0)) as u32;
    let max_x = (right.ceil().max(0.0) as u32).min(img.width().saturating_sub(1));
    let max_y = (bottom.ceil().max(0.0) as u32).min(img.height().saturating_sub(1));
    (min_x, max_x, min_y, max_y)
}

/// Source-over blend of `color` at `coverage` onto the existing pixel.
fn blend(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
    let base = *img.get_pixel(x, y);
    let sa = color[3] as f32 / 255.0 * coverage;
    let ba = base[3] as f32 / 255.0;

    let out_a = sa + ba * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }

    let ch = |s: u8, b: u8| -> u8 {
        ((s as f32 * sa + b as f32 * ba * (1.0 - sa)) / out_a).round() as u8
    };
    img.put_pixel(
        x,
        y,
        Rgba([
            ch(color[0], base[0]),
            ch(color[1], base[1]),
            ch(color[2], base[2]),
            (out_a * 255.0).round() as u8,
        ]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> EyeGeometry {
        EyeGeometry::default()
    }

    fn px(img: &RgbaImage, x: u32, y: u32) -> Rgba<u8> {
        *img.get_pixel(x, y)
    }

    #[test]
    fn test_canvas_size_and_transparent_corners() {
        let img = render_eyes(&RenderRequest::neutral(), &geom());
        assert_eq!(img.dimensions(), (360, 160));
        for (x, y) in [(0, 0), (359, 0), (0, 159), (359, 159)] {
            assert_eq!(px(&img, x, y)[3], 0, "corner ({x},{y}) should be transparent");
        }
    }

    #[test]
    fn test_gap_between_eyes_is_transparent() {
        let img = render_eyes(&RenderRequest::neutral(), &geom());
        assert_eq!(px(&img, 180, 80)[3], 0);
    }

    #[test]
    fn test_centered_pupil_is_black_on_white() {
        let img = render_eyes(&RenderRequest::neutral(), &geom());
        // Pupil covers the eye center...
        assert_eq!(px(&img, 80, 80), PUPIL);
        assert_eq!(px(&img, 280, 80), PUPIL);
        // ...and the sclera shows between pupil edge and outline.
        assert_eq!(px(&img, 80, 35), EYE_WHITE);
    }

    #[test]
    fn test_blink_draws_slit_instead_of_eye() {
        let mut request = RenderRequest::neutral();
        request.left.blink = true;
        let img = render_eyes(&request, &geom());

        // Slit across the left eye midline; nothing above it.
        assert_eq!(px(&img, 80, 80), PUPIL);
        assert_eq!(px(&img, 80, 35)[3], 0);
        // Right eye unaffected.
        assert_eq!(px(&img, 280, 80), PUPIL);
        assert_eq!(px(&img, 280, 35), EYE_WHITE);
    }

    #[test]
    fn test_sleepy_lid_replaces_pupil() {
        let mut request = RenderRequest::neutral();
        request.sleepy = true;
        let img = render_eyes(&request, &geom());

        // Lid gray at the midline, plain sclera where the pupil would be.
        assert_eq!(px(&img, 80, 80), LID);
        assert_eq!(px(&img, 80, 60), EYE_WHITE);
        assert_eq!(px(&img, 80, 35), EYE_WHITE);
    }

    #[test]
    fn test_roll_frame_puts_pupil_on_max_offset_circle() {
        let g = geom();
        // Step 0: pupil due right of center at max offset 37.
        let img = render_roll_frame(0, 12, &g);
        assert_eq!(px(&img, 117, 80), PUPIL);
        assert_eq!(px(&img, 43, 80), EYE_WHITE);

        // Quarter turn: pupil straight down.
        let img = render_roll_frame(3, 12, &g);
        assert_eq!(px(&img, 80, 117), PUPIL);
    }

    #[test]
    fn test_to_tray_icon_accepts_rendered_frame() {
        let img = render_eyes(&RenderRequest::neutral(), &geom());
        assert!(to_tray_icon(img).is_ok());
    }
}
