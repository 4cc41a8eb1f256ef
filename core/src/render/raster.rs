//! Scan-converting triangle rasterizer.
//!
//! One triangle at a time: reject, perspective divide and viewport map,
//! bounding-box reject, cull, sort by y, then split at the middle vertex
//! and walk the two sub-triangles scanline by scanline. Attributes enter
//! scaled by 1/w so plain linear interpolation in screen space is
//! perspective correct; each covered pixel divides by the interpolated
//! 1/w to recover the true values, runs the depth test, shades, and
//! writes through the blend and write-mask logic.
//!
//! There is no clipping against the view frustum planes: a triangle with
//! any `w <= 0` vertex is rejected whole, and everything else is handled
//! by the screen-space bounding-box test and the draw-area clamp.

use crate::math::color::Color4;
use crate::math::vec::{vec4, Vec4};
use crate::render::ctx::{Context, DepthFn, Flags};
use crate::render::target::Framebuf;
use crate::render::tl;
use crate::render::vertex::{Attr, Vertex};

struct Edge {
    v: Vertex,
    dvdy: Vertex,
}

struct EdgeData {
    left: usize,
    right: usize,
    edge: [Edge; 2],
}

/// Maps a clip-space vertex to screen space.
///
/// Every used attribute is scaled by 1/w; the position is remapped to
/// pixel coordinates with y growing downward, the depth range applied to
/// z, and 1/w stored in the w component for per-pixel reconstruction.
fn prepare_vertex(ctx: &Context, v: &Vertex) -> Vertex {
    let w = v.pos().w().recip();
    let mut out = *v;
    out.scale_used(w);

    let vp = ctx.viewport();
    let ndc = out.pos();
    let d = (1.0 - ndc.z()) * 0.5;

    let x = (1.0 + ndc.x()) * 0.5 * vp.width as f32 + vp.x as f32;
    let y = (1.0 - ndc.y()) * 0.5 * vp.height as f32 + vp.y as f32;
    let z = d * ctx.depth_far + (1.0 - d) * ctx.depth_near;

    out.attribs[Attr::Position as usize] = vec4(x, y, z, w);
    out
}

/// True if all three vertices lie beyond the same edge of the draw area.
fn offscreen(ctx: &Context, a: &Vertex, b: &Vertex, c: &Vertex) -> bool {
    let area = ctx.draw_area();
    let (ax, ay) = (a.pos().x() as i32, a.pos().y() as i32);
    let (bx, by) = (b.pos().x() as i32, b.pos().y() as i32);
    let (cx, cy) = (c.pos().x() as i32, c.pos().y() as i32);

    (ay > area.max_y && by > area.max_y && cy > area.max_y)
        || (ax > area.max_x && bx > area.max_x && cx > area.max_x)
        || (ay < area.min_y && by < area.min_y && cy < area.min_y)
        || (ax < area.min_x && bx < area.min_x && cx < area.min_x)
}

/// True if the triangle faces away per the winding and cull flags.
fn culled(ctx: &Context, a: &Vertex, b: &Vertex, c: &Vertex) -> bool {
    let (a, b, c) = (a.pos(), b.pos(), c.pos());
    let area = (c.x() - a.x()) * (c.y() - b.y())
        - (c.y() - a.y()) * (c.x() - b.x());
    let ccw = area < 0.0;

    let front_ccw = ctx.flags.contains(Flags::FRONT_CCW);
    let cull_front = ctx.flags.contains(Flags::CULL_FRONT);
    let cull_back = ctx.flags.contains(Flags::CULL_BACK);

    let cull_ccw = (front_ccw && cull_front) || (!front_ccw && cull_back);
    let cull_cw = (front_ccw && cull_back) || (!front_ccw && cull_front);

    (ccw && cull_ccw) || (!ccw && cull_cw)
}

/// Depth acceptance for one fragment: the depth-range clip when
/// enabled, then the comparison against the stored value when the depth
/// test is on.
fn depth_test(ctx: &Context, frag: f32, stored: f32) -> bool {
    if ctx.flags.contains(Flags::DEPTH_CLIP) {
        let (lo, hi) = if ctx.depth_near <= ctx.depth_far {
            (ctx.depth_near, ctx.depth_far)
        } else {
            (ctx.depth_far, ctx.depth_near)
        };
        if frag < lo || frag > hi {
            return false;
        }
    }
    !ctx.flags.contains(Flags::DEPTH_TEST) || ctx.depth_fn.test(frag, stored)
}

/// Writes one fragment through blending and the channel write masks.
fn write_fragment(
    ctx: &Context,
    fb: &mut Framebuf,
    x: usize,
    y: usize,
    color: Vec4,
    depth: f32,
) {
    if ctx.flags.intersects(Flags::WRITE_COLOR) {
        let dst = &mut fb.color_mut()[y][x];
        let src = if ctx.flags.contains(Flags::BLEND) {
            let a = color.w();
            color * a + dst.to_vec4() * (1.0 - a)
        } else {
            color
        };
        let packed = Color4::from_vec4(src);

        const CHANNELS: [Flags; 4] = [
            Flags::WRITE_RED,
            Flags::WRITE_GREEN,
            Flags::WRITE_BLUE,
            Flags::WRITE_ALPHA,
        ];
        for (i, &ch) in CHANNELS.iter().enumerate() {
            if ctx.flags.contains(ch) {
                dst.0[i] = packed.0[i];
            }
        }
    }

    if ctx.flags.contains(Flags::DEPTH_WRITE) {
        fb.depth_mut()[y][x] = depth;
    }
}

fn draw_scanline(ctx: &Context, fb: &mut Framebuf, y: i32, s: &EdgeData) {
    let area = ctx.draw_area();
    let lx = s.edge[s.left].v.pos().x();
    let rx = s.edge[s.right].v.pos().x();

    let mut x0 = lx.ceil() as i32;
    let mut x1 = rx.ceil() as i32;
    let sub_pixel = x0 as f32 - lx;

    let pixelscale = (rx - lx).recip();
    let dvdx = Vertex::diff_scaled(&s.edge[s.right].v, &s.edge[s.left].v, pixelscale);
    let mut v = Vertex::add_scaled(&s.edge[s.left].v, &dvdx, sub_pixel);

    if x0 < area.min_x {
        v = Vertex::add_scaled(&v, &dvdx, (area.min_x - x0) as f32);
        x0 = area.min_x;
    }
    if x1 > area.max_x {
        x1 = area.max_x;
    }
    if x1 < x0 || x0 > area.max_x || x1 < area.min_x {
        return;
    }

    // The right edge is exclusive, per the fill convention.
    for x in x0..x1 {
        let z = v.pos().z();
        let stored = fb.depth()[y as usize][x as usize];

        if depth_test(ctx, z, stored) {
            // Undo the 1/w scaling to recover the true attributes.
            let w = v.pos().w().recip();
            let mut frag = v;
            frag.scale_used(w);

            let c = tl::shade_fragment(ctx, &frag);
            write_fragment(ctx, fb, x as usize, y as usize, c, z);
        }

        v = Vertex::add_scaled(&v, &dvdx, 1.0);
    }
}

fn advance(s: &mut EdgeData, scale: f32) {
    s.edge[0].v = Vertex::add_scaled(&s.edge[0].v, &s.edge[0].dvdy, scale);
    s.edge[1].v = Vertex::add_scaled(&s.edge[1].v, &s.edge[1].dvdy, scale);
}

/// Walks the scanlines between the y coordinates of `a` and `b`,
/// stepping both active edges per line.
fn draw_half(
    ctx: &Context,
    fb: &mut Framebuf,
    s: &mut EdgeData,
    a: &Vertex,
    b: &Vertex,
) {
    let area = ctx.draw_area();

    // Top-left fill convention.
    let mut y0 = a.pos().y().ceil() as i32;
    let y1 = b.pos().y().ceil() as i32 - 1;

    advance(s, y0 as f32 - a.pos().y());

    if y0 < area.min_y {
        advance(s, (area.min_y - y0) as f32);
        y0 = area.min_y;
    }

    let mut y = y0;
    while y <= y1 && y <= area.max_y {
        draw_scanline(ctx, fb, y, s);
        advance(s, 1.0);
        y += 1;
    }
}

/// Scan-converts a y-sorted triangle, split at the middle vertex.
fn scan_triangle(
    ctx: &Context,
    fb: &mut Framebuf,
    a: &Vertex,
    b: &Vertex,
    c: &Vertex,
) {
    let (ay, by, cy) = (a.pos().y(), b.pos().y(), c.pos().y());

    let linescale = [
        (cy - ay).recip(),
        (by - ay).recip(),
        (cy - by).recip(),
    ];
    if linescale[0] <= 0.0 {
        return;
    }

    // Which of the two walked edges is the left one.
    let cross = (a.pos().x() - c.pos().x()) * (by - ay)
        - (ay - cy) * (b.pos().x() - a.pos().x());
    let left = if cross > 0.0 { 0 } else { 1 };

    let mut s = EdgeData {
        left,
        right: 1 - left,
        edge: [
            Edge {
                v: *a,
                dvdy: Vertex::diff_scaled(c, a, linescale[0]),
            },
            Edge {
                v: *a,
                dvdy: Vertex::diff_scaled(b, a, linescale[1]),
            },
        ],
    };

    // Upper sub-triangle, top vertex to middle vertex.
    if linescale[1] > 0.0 {
        draw_half(ctx, fb, &mut s, a, b);
    }

    // Lower sub-triangle, middle vertex to bottom vertex.
    if linescale[2] > 0.0 {
        if linescale[1] > 0.0 {
            s.edge[0].v = Vertex::add_scaled(a, &s.edge[0].dvdy, by - ay);
        }
        s.edge[1].v = *b;
        s.edge[1].dvdy = Vertex::diff_scaled(c, b, linescale[2]);

        draw_half(ctx, fb, &mut s, b, c);
    }
}

/// Rasterizes one clip-space triangle into `fb`.
pub(crate) fn rasterize(
    ctx: &Context,
    fb: &mut Framebuf,
    v0: &Vertex,
    v1: &Vertex,
    v2: &Vertex,
) {
    // Configurations that reject everything.
    if ctx.flags.contains(Flags::CULL_FRONT | Flags::CULL_BACK) {
        return;
    }
    if ctx.flags.contains(Flags::DEPTH_TEST) && ctx.depth_fn == DepthFn::Never {
        return;
    }

    // Whole-triangle reject behind the eye plane.
    if v0.pos().w() <= 0.0 || v1.pos().w() <= 0.0 || v2.pos().w() <= 0.0 {
        return;
    }

    let area = ctx.draw_area();
    if area.min_x >= area.max_x || area.min_y >= area.max_y {
        return;
    }

    let a = prepare_vertex(ctx, v0);
    let b = prepare_vertex(ctx, v1);
    let c = prepare_vertex(ctx, v2);

    if offscreen(ctx, &a, &b, &c) || culled(ctx, &a, &b, &c) {
        return;
    }

    // Sort by ascending screen-space y.
    let mut v = [&a, &b, &c];
    if v[0].pos().y() > v[1].pos().y() {
        v.swap(0, 1);
    }
    if v[1].pos().y() > v[2].pos().y() {
        v.swap(1, 2);
    }
    if v[0].pos().y() > v[1].pos().y() {
        v.swap(0, 1);
    }

    scan_triangle(ctx, fb, v[0], v[1], v[2]);
}

#[cfg(test)]
mod tests {
    use crate::math::color::rgba;
    use crate::math::vec::vec4;
    use crate::render::vertex::AttrMask;

    use super::*;

    // A clip-space triangle covering the left half of the target,
    // wound counter-clockwise under the y-down screen convention.
    fn ccw_triangle() -> [Vertex; 3] {
        let mut v = [Vertex::new(); 3];
        v[0].set(Attr::Position, vec4(-1.0, 1.0, 0.0, 1.0));
        v[1].set(Attr::Position, vec4(1.0, 1.0, 0.0, 1.0));
        v[2].set(Attr::Position, vec4(-1.0, -1.0, 0.0, 1.0));
        for vert in &mut v {
            vert.set(Attr::Color, vec4(1.0, 1.0, 1.0, 1.0));
        }
        v
    }

    fn setup() -> (Context, Framebuf) {
        let fb = Framebuf::new(8, 8);
        let mut ctx = Context::new();
        ctx.set_viewport(&fb, 0, 0, 8, 8);
        (ctx, fb)
    }

    fn lit_pixels(fb: &Framebuf) -> usize {
        fb.color().data().iter().filter(|&&c| c != Color4::BLACK).count()
    }

    #[test]
    fn covers_half_the_target() {
        let (ctx, mut fb) = setup();
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        // Roughly half of an 8x8 target; the exact count depends on the
        // fill rule at the diagonal and the clamped right edge.
        let n = lit_pixels(&fb);
        assert!(n >= 30 && n <= 36, "{n} pixels");
    }

    #[test]
    fn cull_back_rejects_ccw() {
        let (mut ctx, mut fb) = setup();
        ctx.flags |= Flags::CULL_BACK;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn cull_front_keeps_ccw() {
        let (mut ctx, mut fb) = setup();
        ctx.flags |= Flags::CULL_FRONT;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert!(lit_pixels(&fb) > 0);
    }

    #[test]
    fn both_cull_flags_reject_everything() {
        let (mut ctx, mut fb) = setup();
        ctx.flags |= Flags::CULL_FRONT | Flags::CULL_BACK;
        ctx.flags &= !Flags::FRONT_CCW;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn never_depth_test_rejects_everything() {
        let (mut ctx, mut fb) = setup();
        ctx.flags |= Flags::DEPTH_TEST;
        ctx.depth_fn = DepthFn::Never;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn nonpositive_w_rejects_whole_triangle() {
        let (ctx, mut fb) = setup();
        let [a, b, mut c] = ccw_triangle();
        c.set(Attr::Position, vec4(0.0, 0.0, 0.0, -1.0));
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn unset_viewport_rejects_everything() {
        let mut fb = Framebuf::new(8, 8);
        let ctx = Context::new();
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(lit_pixels(&fb), 0);
    }

    #[test]
    fn depth_write_can_be_disabled() {
        let (mut ctx, mut fb) = setup();
        ctx.flags &= !Flags::DEPTH_WRITE;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert!(fb.depth().data().iter().all(|&d| d == 1.0));
        assert!(lit_pixels(&fb) > 0);
    }

    #[test]
    fn write_mask_protects_channels() {
        let (mut ctx, mut fb) = setup();
        ctx.flags &= !Flags::WRITE_COLOR;
        ctx.flags |= Flags::WRITE_GREEN;
        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);

        let c = fb.color()[0][0];
        assert_eq!(c, rgba(0, 0xFF, 0, 0xFF));
    }

    #[test]
    fn transparent_blend_is_identity() {
        let (mut ctx, mut fb) = setup();
        fb.clear(rgba(10, 20, 30, 0xFF));
        ctx.flags |= Flags::BLEND;
        ctx.flags &= !Flags::DEPTH_WRITE;

        let mut v = ccw_triangle();
        for vert in &mut v {
            vert.set(Attr::Color, vec4(1.0, 1.0, 1.0, 0.0));
        }
        let [a, b, c] = v;
        rasterize(&ctx, &mut fb, &a, &b, &c);

        assert!(fb.color().data().iter().all(|&c| c == rgba(10, 20, 30, 0xFF)));
    }

    #[test]
    fn opaque_blend_replaces() {
        let (mut ctx, mut fb) = setup();
        fb.clear(rgba(10, 20, 30, 0xFF));
        ctx.flags |= Flags::BLEND;

        let [a, b, c] = ccw_triangle();
        rasterize(&ctx, &mut fb, &a, &b, &c);
        assert_eq!(fb.color()[0][0], Color4::WHITE);
    }

    #[test]
    fn depth_test_keeps_nearer_fragment() {
        let (mut ctx, mut fb) = setup();
        ctx.flags |= Flags::DEPTH_TEST;
        ctx.depth_fn = DepthFn::LessEqual;

        // ndc.z = 1 maps to depth 0 (near), ndc.z = -1 to 1 (far).
        let mut near = ccw_triangle();
        for v in &mut near {
            let p = v.pos();
            v.set(Attr::Position, vec4(p.x(), p.y(), 1.0, 1.0));
            v.set(Attr::Color, vec4(1.0, 0.0, 0.0, 1.0));
        }
        let far = ccw_triangle();

        let [a, b, c] = near;
        rasterize(&ctx, &mut fb, &a, &b, &c);
        let [a, b, c] = far;
        rasterize(&ctx, &mut fb, &a, &b, &c);

        assert_eq!(fb.color()[0][0], rgba(0xFF, 0, 0, 0xFF));
        assert_eq!(fb.depth()[0][0], 0.0);
    }

    #[test]
    fn perspective_correct_midpoint() {
        // An edge from a w=1 vertex to a w=4 vertex. Interpolating the
        // texcoord as attribute/w and dividing by the interpolated 1/w
        // at the screen midpoint must match clip-space interpolation:
        // the clip parameter reaching screen center is t = 0.2, and the
        // attribute there is s = t = 0.2.
        let (ctx, _fb) = setup();

        let mut v0 = Vertex::new();
        v0.set(Attr::Position, vec4(-1.0, 0.0, 0.0, 1.0));
        v0.set(Attr::Tex0, vec4(0.0, 0.0, 0.0, 0.0));
        let mut v1 = Vertex::new();
        v1.set(Attr::Position, vec4(4.0, 0.0, 0.0, 4.0));
        v1.set(Attr::Tex0, vec4(1.0, 0.0, 0.0, 0.0));

        let a = prepare_vertex(&ctx, &v0);
        let b = prepare_vertex(&ctx, &v1);
        assert!(a.used.contains(AttrMask::TEX0));

        let mid = Vertex::add_scaled(
            &a,
            &Vertex::diff_scaled(&b, &a, 0.5),
            1.0,
        );
        let s = mid.attr(Attr::Tex0).x() / mid.pos().w();
        assert!((s - 0.2).abs() < 1e-5, "s = {s}");
    }
}
