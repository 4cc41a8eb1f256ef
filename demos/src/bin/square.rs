//! A spinning checkered square, drawn as an indexed triangle list from
//! a raw interleaved vertex buffer.

use std::ops::ControlFlow::*;
use std::rc::Rc;

use rr::prelude::*;
use rr_front::minifb::Window;

fn main() {
    env_logger::init();

    // Interleaved position + texcoord data for one quad.
    let quad: [([f32; 3], [f32; 2]); 4] = [
        ([-1.0, -1.0, 0.0], [0.0, 0.0]),
        ([1.0, -1.0, 0.0], [1.0, 0.0]),
        ([-1.0, 1.0, 0.0], [0.0, 1.0]),
        ([1.0, 1.0, 0.0], [1.0, 1.0]),
    ];
    let mut verts = Vec::new();
    for (p, tc) in quad {
        for c in p.iter().chain(&tc) {
            verts.extend_from_slice(&c.to_ne_bytes());
        }
    }
    let indices = [0u16, 1, 2, 2, 1, 3];

    let mut win = Window::builder()
        .title("rasterine//square")
        .build()
        .unwrap();

    win.ctx.shade_model = ShadeModel::Unlit;
    win.ctx.vertex_format = VertexFormat::POSITION_F3 | VertexFormat::TEX0;

    let checker = Texture::from(Buf2::new_with(8, 8, |x, y| {
        let xor = ((x ^ y) & 1) as u8;
        rgba(xor * 255, 128, 255 - xor * 128, 255)
    }));
    win.ctx.textures[0] = Some(Rc::new(checker));
    win.ctx.texture_enable[0] = true;

    let (w, h) = win.dims;
    let proj = Mat4::perspective(1.0, w as f32 / h as f32, 0.1, 100.0);

    win.run(|frame| {
        let secs = frame.t.as_secs_f32();

        let mv = Mat4::translate(0.0, 0.0, -3.0 + secs.sin())
            .compose(&Mat4::rotate_y(secs));
        frame.ctx.set_modelview(mv);
        frame.ctx.set_projection(proj);

        frame.ctx.draw_triangles_indexed(frame.fb, &verts, 4, &indices);
        Continue(())
    });
}
