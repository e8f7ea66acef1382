use blend_ngin::{
    capture::Offscreen,
    cgmath::{Matrix4, Point3, SquareMatrix},
    context::InitContext,
    data_structures::{model::Mesh, primitives, texture::Texture},
    pipelines::{basic::SINGLE_TEX, shader::ShaderProgram},
    render::ViewState,
};

pub const SIZE: u32 = 64;

const SINGLE_TEX_SOURCE: &str = include_str!("../../assets/shader/single_tex.wgsl");

pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new()
        .expect("tokio runtime")
        .block_on(future)
}

pub async fn offscreen() -> Offscreen {
    Offscreen::new(SIZE, SIZE)
        .await
        .expect("golden image tests need a GPU adapter")
}

pub fn single_tex(ctx: &InitContext) -> ShaderProgram {
    ShaderProgram::compile(ctx, SINGLE_TEX, SINGLE_TEX_SOURCE, SINGLE_TEX_SOURCE)
        .expect("single_tex compiles")
}

/// A window quad textured with one solid colour.
pub fn tinted_quad(ctx: &InitContext, name: &str, rgba: [u8; 4]) -> Mesh {
    let mut quad = Mesh::from_interleaved(&ctx.device, name, &primitives::WINDOW).unwrap();
    quad.add_texture(Texture::create_solid(rgba, name, &ctx.device, &ctx.queue), "InTex");
    quad
}

/// Clip space equals world space; the eye sits behind the near plane.
pub fn identity_view() -> ViewState {
    ViewState {
        eye: Point3::new(0.0, 0.0, -1.0),
        view: Matrix4::identity(),
        projection: Matrix4::identity(),
    }
}

/// Centres the unit window quad on the screen at depth `z`.
pub fn centred_at(z: f32) -> Matrix4<f32> {
    Matrix4::from_translation([-0.5, 0.0, z].into())
}

pub fn assert_pixel_near(image: &image::RgbaImage, x: u32, y: u32, expected: [u8; 3]) {
    let pixel = image.get_pixel(x, y).0;
    for channel in 0..3 {
        let diff = (pixel[channel] as i32 - expected[channel] as i32).abs();
        assert!(
            diff <= 3,
            "pixel ({x}, {y}) is {pixel:?}, expected about {expected:?}"
        );
    }
}
