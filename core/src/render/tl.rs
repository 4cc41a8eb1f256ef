//! Transform and lighting.
//!
//! Vertices arrive in model space. The vertex stage moves them to view
//! space, evaluates Blinn-Phong lighting according to the active shading
//! model, and applies the projection last, so that lighting always
//! happens in view space. Per-pixel shading defers the lighting
//! evaluation to [`shade_fragment`], which the rasterizer calls for
//! every covered pixel; the vertex stage stashes the view-space position
//! and a precomputed ambient-plus-emission base color in the scratch
//! slots for it.

use crate::math::vec::Vec4;
use crate::render::ctx::{Context, Flags, ShadeModel, MAX_TEXTURES};
use crate::render::raster;
use crate::render::target::Framebuf;
use crate::render::vertex::{Attr, AttrMask, Vertex};

/// Moves position and normal to view space. The normal is renormalized
/// after the normal-matrix transform.
pub(crate) fn transform_vertex(ctx: &Context, v: &mut Vertex) {
    if v.used.contains(AttrMask::NORMAL) {
        let n = ctx.normal_matrix().apply_linear(&v.attr(Attr::Normal));
        v.set(Attr::Normal, n.normalize());
    }
    let pos = ctx.modelview().apply(&v.pos());
    v.set(Attr::Position, pos);
}

/// Applies the projection, leaving the position in clip space.
#[inline]
pub(crate) fn project_vertex(ctx: &Context, v: &mut Vertex) {
    let pos = ctx.projection().apply(&v.pos());
    v.set(Attr::Position, pos);
}

/// Sum of `ambient_light * ambient_material` over the enabled lights,
/// plus the material emission. Position-independent.
fn ambient_sum(ctx: &Context) -> Vec4 {
    let mut c = ctx.material.emission;
    for light in ctx.lights.iter().filter(|l| l.enabled) {
        c = c + light.ambient.mul_elem(&ctx.material.ambient);
    }
    c
}

/// Sum of the attenuated diffuse and specular Blinn-Phong terms over
/// the enabled lights, for a surface point `pos` with unit normal `n`,
/// both in view space.
fn diffuse_specular_sum(ctx: &Context, pos: &Vec4, n: &Vec4) -> Vec4 {
    let mut c = Vec4::ZERO;
    let mat = &ctx.material;

    for light in ctx.lights.iter().filter(|l| l.enabled) {
        // Light vector and distance to the light.
        let to_light = (light.position - *pos).with_w(0.0);
        let d = to_light.len3();
        let l = to_light * if d > 0.0 { d.recip() } else { 0.0 };

        // View vector points at the eye, which sits at the origin.
        let v = (-*pos).with_w(0.0).normalize();
        let h = (l + v).normalize();

        let att = light.attenuation_constant
            + light.attenuation_linear * d
            + light.attenuation_quadratic * d * d;
        let att = if att > 0.0 { att.recip() } else { 0.0 };

        let diff = n.dot3(&l).max(0.0);
        let spec = n.dot3(&h).max(0.0).powi(mat.shininess);

        let cd = light.diffuse.mul_elem(&mat.diffuse) * diff;
        let cs = light.specular.mul_elem(&mat.specular) * spec;

        c = c + (cd + cs) * att;
    }
    c
}

/// Evaluates lighting at the vertex position and modulates the vertex
/// color with the result. The lighting color's alpha is forced to 1, so
/// the source alpha passes through.
pub(crate) fn light_vertex(ctx: &Context, v: &mut Vertex) {
    let pos = v.pos();
    let n = v.attr(Attr::Normal);
    let c = (ambient_sum(ctx) + diffuse_specular_sum(ctx, &pos, &n)).with_w(1.0);
    let lit = v.attr(Attr::Color).mul_elem(&c);
    v.set(Attr::Color, lit);
}

/// Runs the per-vertex stage for the triangle-independent shading
/// models. Flat shading has no per-vertex stage; it is handled whole
/// triangles at a time by [`shade_triangle`].
pub(crate) fn vertex_stage(ctx: &Context, v: &mut Vertex) {
    match ctx.shade_model {
        ShadeModel::Unlit => {
            v.used &= AttrMask::POSITION
                | AttrMask::COLOR
                | AttrMask::TEX0
                | AttrMask::TEX1;
            let pos = ctx.modelview().apply(&v.pos());
            v.set(Attr::Position, pos);
            project_vertex(ctx, v);
        }
        ShadeModel::Gouraud => {
            transform_vertex(ctx, v);
            light_vertex(ctx, v);
            project_vertex(ctx, v);
        }
        ShadeModel::Phong => {
            transform_vertex(ctx, v);
            v.set(Attr::Usr0, v.pos());
            v.set(Attr::Usr1, ambient_sum(ctx));
            project_vertex(ctx, v);
        }
        ShadeModel::Flat => {}
    }
}

/// Flat shading: all three vertices go to view space, the provoking
/// vertex is lit (with a face normal computed from the view-space edges
/// if the source format carries none), and its color and normal are
/// broadcast to the other two vertices before projection.
fn flat_triangle(ctx: &Context, fb: &mut Framebuf, mut v: [Vertex; 3]) {
    let p = ctx.provoking_vertex;
    if p > 2 {
        return;
    }

    for vert in &mut v {
        transform_vertex(ctx, vert);
    }

    if !v[p].used.contains(AttrMask::NORMAL) {
        let e1 = v[1].pos() - v[0].pos();
        let e2 = v[2].pos() - v[0].pos();
        let mut n = e1.cross(&e2);
        if !ctx.flags.contains(Flags::FRONT_CCW) {
            n = -n;
        }
        v[p].set(Attr::Normal, n.normalize());
    }

    light_vertex(ctx, &mut v[p]);

    let color = v[p].attr(Attr::Color);
    let normal = v[p].attr(Attr::Normal);
    for i in 0..3 {
        if i != p {
            v[i].set(Attr::Color, color);
            v[i].set(Attr::Normal, normal);
        }
    }

    for vert in &mut v {
        project_vertex(ctx, vert);
    }

    let [a, b, c] = v;
    raster::rasterize(ctx, fb, &a, &b, &c);
}

/// Shades one triangle and hands it to the rasterizer.
pub(crate) fn shade_triangle(
    ctx: &Context,
    fb: &mut Framebuf,
    mut v0: Vertex,
    mut v1: Vertex,
    mut v2: Vertex,
) {
    if ctx.shade_model == ShadeModel::Flat {
        flat_triangle(ctx, fb, [v0, v1, v2]);
    } else {
        vertex_stage(ctx, &mut v0);
        vertex_stage(ctx, &mut v1);
        vertex_stage(ctx, &mut v2);
        raster::rasterize(ctx, fb, &v0, &v1, &v2);
    }
}

/// Computes the final fragment color from interpolated attributes:
/// per-pixel lighting for the phong model, then modulation with every
/// enabled texture layer.
pub(crate) fn shade_fragment(ctx: &Context, frag: &Vertex) -> Vec4 {
    let mut c = frag.attr(Attr::Color);

    if ctx.shade_model == ShadeModel::Phong {
        let pos = frag.attr(Attr::Usr0);
        let n = frag.attr(Attr::Normal).normalize();
        let lit = (frag.attr(Attr::Usr1) + diffuse_specular_sum(ctx, &pos, &n))
            .with_w(1.0);
        c = c.mul_elem(&lit);
    }

    for layer in 0..MAX_TEXTURES {
        if !ctx.texture_enable[layer] {
            continue;
        }
        if let Some(tex) = &ctx.textures[layer] {
            let tc = match layer {
                0 => frag.attr(Attr::Tex0),
                _ => frag.attr(Attr::Tex1),
            };
            c = c.mul_elem(&tex.sample(tc.x(), tc.y()));
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::math::mat::Mat4;
    use crate::math::vec::{vec3, vec4};

    use super::*;

    fn lit_ctx() -> Context {
        let mut ctx = Context::new();
        // Headlight at the eye. Specular is off because shininess 0
        // makes any non-negative N.H contribute a full unit.
        ctx.lights[0].enabled = true;
        ctx.lights[0].ambient = vec4(0.1, 0.1, 0.1, 1.0);
        ctx.lights[0].specular = Vec4::ZERO;
        ctx.material.ambient = vec4(1.0, 1.0, 1.0, 1.0);
        ctx
    }

    fn vertex_at(pos: Vec4, normal: Vec4) -> Vertex {
        let mut v = Vertex::new();
        v.set(Attr::Position, pos);
        v.set(Attr::Normal, normal);
        v.set(Attr::Color, vec4(1.0, 1.0, 1.0, 1.0));
        v
    }

    #[test]
    fn facing_surface_gets_full_diffuse() {
        let ctx = lit_ctx();
        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, 1.0));
        light_vertex(&ctx, &mut v);

        // ambient 0.1 + diffuse 1.0 (N.L = 1, no attenuation).
        let c = v.attr(Attr::Color);
        assert_approx_eq!(c.x(), 1.1);
        assert_eq!(c.w(), 1.0);
    }

    #[test]
    fn backfacing_surface_gets_ambient_only() {
        let mut ctx = lit_ctx();
        ctx.lights[0].specular = Vec4::ZERO;
        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, -1.0));
        light_vertex(&ctx, &mut v);
        assert_approx_eq!(v.attr(Attr::Color).x(), 0.1);
    }

    #[test]
    fn attenuation_divides_diffuse() {
        let mut ctx = lit_ctx();
        ctx.lights[0].ambient = Vec4::ZERO;
        ctx.lights[0].specular = Vec4::ZERO;
        ctx.lights[0].attenuation_constant = 2.0;
        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, 1.0));
        light_vertex(&ctx, &mut v);
        assert_approx_eq!(v.attr(Attr::Color).x(), 0.5);
    }

    #[test]
    fn lighting_modulates_source_color() {
        let mut ctx = lit_ctx();
        ctx.lights[0].ambient = Vec4::ZERO;
        ctx.lights[0].specular = Vec4::ZERO;
        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, 1.0));
        v.set(Attr::Color, vec4(0.5, 0.25, 0.0, 0.75));
        light_vertex(&ctx, &mut v);

        let c = v.attr(Attr::Color);
        assert_approx_eq!(c.x(), 0.5);
        assert_approx_eq!(c.y(), 0.25);
        // Alpha of the source color survives lighting.
        assert_approx_eq!(c.w(), 0.75);
    }

    #[test]
    fn unlit_strips_normals_and_scratch() {
        let mut ctx = Context::new();
        ctx.shade_model = ShadeModel::Unlit;
        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, 1.0));
        vertex_stage(&ctx, &mut v);
        assert!(!v.used.contains(AttrMask::NORMAL));
        assert!(v.used.contains(AttrMask::POSITION));
        assert!(v.used.contains(AttrMask::COLOR));
    }

    #[test]
    fn phong_stashes_view_position() {
        let mut ctx = lit_ctx();
        ctx.shade_model = ShadeModel::Phong;
        ctx.set_modelview(Mat4::translate(0.0, 0.0, -5.0));

        let mut v = vertex_at(vec4(0.0, 0.0, 0.0, 1.0), vec3(0.0, 0.0, 1.0));
        vertex_stage(&ctx, &mut v);

        let stash = v.attr(Attr::Usr0);
        assert_approx_eq!(stash.z(), -5.0);
        // Base color carries ambient + emission.
        assert_approx_eq!(v.attr(Attr::Usr1).x(), 0.1);
    }

    #[test]
    fn lighting_is_independent_of_projection() {
        // Lighting runs in view space, before the projection touches
        // the position.
        let mut ctx = lit_ctx();
        ctx.lights[0].specular = Vec4::ZERO;
        ctx.set_projection(Mat4::perspective(1.0, 1.0, 0.1, 100.0));

        let mut v =
            vertex_at(vec4(0.0, 0.0, -2.0, 1.0), vec3(0.0, 0.0, 1.0));
        let mut w = v;
        vertex_stage(&ctx, &mut v);
        light_vertex(&ctx, &mut w);

        assert_eq!(v.attr(Attr::Color), w.attr(Attr::Color));
        // The projection did run on the position.
        assert_approx_eq!(v.pos().w(), 2.0);
    }
}
