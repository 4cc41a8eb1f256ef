//! A spinning cube, drawn face by face in immediate mode and lit by a
//! single point light.

use std::ops::ControlFlow::*;

use rr::prelude::*;
use rr_front::minifb::Window;

fn draw_cube(ctx: &mut Context, fb: &mut Framebuf) {
    let faces = [
        (vec3(0.0, 0.0, 1.0), vec4(1.0, 0.0, 0.0, 1.0)),
        (vec3(0.0, 0.0, -1.0), vec4(0.0, 1.0, 0.0, 1.0)),
        (vec3(1.0, 0.0, 0.0), vec4(0.0, 0.0, 1.0, 1.0)),
        (vec3(-1.0, 0.0, 0.0), vec4(1.0, 1.0, 0.0, 1.0)),
        (vec3(0.0, 1.0, 0.0), vec4(1.0, 0.0, 1.0, 1.0)),
        (vec3(0.0, -1.0, 0.0), vec4(0.0, 1.0, 1.0, 1.0)),
    ];

    ctx.begin();
    for (n, c) in faces {
        // Two tangents spanning the face.
        let u = if n.x().abs() > 0.5 {
            vec3(0.0, 1.0, 0.0)
        } else {
            vec3(1.0, 0.0, 0.0)
        };
        let v = n.cross(&u);

        let corners = [
            n - u - v,
            n + u - v,
            n + u + v,
            n - u + v,
        ];

        ctx.normal(n.x(), n.y(), n.z());
        ctx.color(c.x(), c.y(), c.z(), c.w());
        for i in [0, 1, 2, 0, 2, 3] {
            let p = corners[i];
            ctx.vertex(fb, p.x(), p.y(), p.z(), 1.0);
        }
    }
    ctx.end();
}

fn main() {
    env_logger::init();

    let mut win = Window::builder()
        .title("rasterine//cube")
        .build()
        .unwrap();

    win.ctx.flags |= Flags::DEPTH_TEST;
    win.ctx.depth_fn = DepthFn::LessEqual;
    win.ctx.lights[0].enabled = true;
    win.ctx.lights[0].position = vec4(2.0, 2.0, 0.0, 1.0);
    win.ctx.lights[0].ambient = vec4(0.2, 0.2, 0.2, 1.0);

    let (w, h) = win.dims;
    let proj = Mat4::perspective(1.0, w as f32 / h as f32, 0.1, 100.0);

    win.run(|frame| {
        let secs = frame.t.as_secs_f32();

        let mv = Mat4::translate(0.0, 0.0, -5.0)
            .compose(&Mat4::rotate_y(secs))
            .compose(&Mat4::rotate_x(0.4 * secs));
        frame.ctx.set_modelview(mv);
        frame.ctx.set_projection(proj);

        draw_cube(frame.ctx, frame.fb);
        Continue(())
    });
}
