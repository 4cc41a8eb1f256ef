//! Views a 3DS mesh file, slowly rotating it in front of the camera.

use std::ops::ControlFlow::*;
use std::process::exit;

use rr::prelude::*;
use rr_front::minifb::Window;

/// Computes the center and bounding radius of the mesh positions.
fn bounds(mesh: &Mesh) -> (Vec4, f32) {
    let stride = mesh.format.stride();
    let positions = (0..mesh.vertex_count).map(|i| {
        let at = |k: usize| {
            let off = i * stride + 4 * k;
            f32::from_ne_bytes([
                mesh.verts[off],
                mesh.verts[off + 1],
                mesh.verts[off + 2],
                mesh.verts[off + 3],
            ])
        };
        vec3(at(0), at(1), at(2))
    });

    let mut sum = Vec4::ZERO;
    for p in positions.clone() {
        sum = sum + p;
    }
    let center = sum * (mesh.vertex_count.max(1) as f32).recip();

    let radius = positions
        .map(|p| (p - center).len3())
        .fold(0.0f32, f32::max);
    (center, radius.max(1e-3))
}

fn main() {
    env_logger::init();

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: view3ds <file.3ds>");
            exit(1);
        }
    };
    let mesh = match load_3ds(&path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{path}: {e}");
            exit(1);
        }
    };
    let (center, radius) = bounds(&mesh);

    let mut win = Window::builder()
        .title("rasterine//view3ds")
        .build()
        .unwrap();

    win.ctx.flags |= Flags::DEPTH_TEST;
    win.ctx.depth_fn = DepthFn::LessEqual;
    win.ctx.vertex_format = mesh.format;
    win.ctx.lights[0].enabled = true;
    win.ctx.lights[0].ambient = vec4(0.15, 0.15, 0.15, 1.0);
    win.ctx.lights[0].position = vec4(0.0, radius, 0.0, 1.0);

    let (w, h) = win.dims;
    let dist = 2.5 * radius;
    let proj = Mat4::perspective(
        1.0,
        w as f32 / h as f32,
        0.01 * radius,
        10.0 * radius,
    );

    win.run(|frame| {
        let secs = frame.t.as_secs_f32();

        let mv = Mat4::translate(0.0, 0.0, -dist)
            .compose(&Mat4::rotate_y(0.5 * secs))
            .compose(&Mat4::translate(-center.x(), -center.y(), -center.z()));
        frame.ctx.set_modelview(mv);
        frame.ctx.set_projection(proj);

        frame.ctx.draw_triangles_indexed(
            frame.fb,
            &mesh.verts,
            mesh.vertex_count,
            &mesh.indices,
        );
        Continue(())
    });
}
