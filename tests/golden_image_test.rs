#![cfg(feature = "integration-tests")]

mod common;

use blend_ngin::{
    pipelines::{basic::SINGLE_COLOR, shader::ShaderProgram},
    data_structures::{model::Mesh, primitives},
    render::{DrawCall, DrawCounts, Render},
    resources::texture::TextureLoader,
    transparency::SortPolicy,
};
use common::test_utils::*;

const CENTRE: u32 = SIZE / 2;

#[test]
fn should_render_clear_colour() {
    block_on(async {
        let mut offscreen = offscreen().await;
        offscreen.clear_colour = wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        };
        let (counts, image) = offscreen
            .capture(Render::None, &identity_view())
            .await
            .unwrap();
        assert_eq!(counts, DrawCounts::default());
        for pixel in image.pixels() {
            assert_eq!(pixel.0, [0, 0, 255, 255]);
        }
    });
}

#[test]
fn transparent_quads_blend_back_to_front() {
    block_on(async {
        let mut offscreen = offscreen().await;
        let ctx = offscreen.init_context();
        let program = single_tex(&ctx);
        let red = tinted_quad(&ctx, "red", [255, 0, 0, 128]);
        let green = tinted_quad(&ctx, "green", [0, 255, 0, 128]);

        // declared nearest first, so drawing in declaration order would let the
        // red quad's depth hide the green one
        let render = Render::Transparents(vec![
            DrawCall::new(&red, &program, centred_at(0.2)).without_culling(),
            DrawCall::new(&green, &program, centred_at(0.6)).without_culling(),
        ]);
        let (counts, image) = offscreen.capture(render, &identity_view()).await.unwrap();

        assert_eq!(counts.transparent, 2);
        // green over black, then red over that
        assert_pixel_near(&image, CENTRE, CENTRE, [128, 64, 0]);
        // outside the quads only the clear colour remains
        assert_pixel_near(&image, 1, 1, [0, 0, 0]);
    });
}

#[test]
fn opaques_are_drawn_before_transparents() {
    block_on(async {
        let mut offscreen = offscreen().await;
        let ctx = offscreen.init_context();
        let program = single_tex(&ctx);
        let glass = tinted_quad(&ctx, "glass", [255, 0, 0, 128]);
        let wall = tinted_quad(&ctx, "wall", [0, 0, 255, 255]);

        let render = Render::Composed(vec![
            Render::Transparent(DrawCall::new(&glass, &program, centred_at(0.2)).without_culling()),
            Render::Opaque(DrawCall::new(&wall, &program, centred_at(0.6)).without_culling()),
        ]);
        let (counts, image) = offscreen.capture(render, &identity_view()).await.unwrap();

        assert_eq!(
            counts,
            DrawCounts {
                opaque: 1,
                transparent: 1
            }
        );
        assert_pixel_near(&image, CENTRE, CENTRE, [128, 0, 127]);
    });
}

#[test]
fn collapsing_policy_drops_equidistant_quads() {
    block_on(async {
        let mut offscreen = offscreen().await;
        offscreen.sort_policy = SortPolicy::CollapseEqual;
        let ctx = offscreen.init_context();
        let program = single_tex(&ctx);
        let first = tinted_quad(&ctx, "first", [255, 0, 0, 255]);
        let second = tinted_quad(&ctx, "second", [0, 255, 0, 255]);

        let render = Render::Transparents(vec![
            DrawCall::new(&first, &program, centred_at(0.5)).without_culling(),
            DrawCall::new(&second, &program, centred_at(0.5)).without_culling(),
        ]);
        let (counts, image) = offscreen.capture(render, &identity_view()).await.unwrap();

        assert_eq!(counts.transparent, 1);
        assert_pixel_near(&image, CENTRE, CENTRE, [0, 255, 0]);
    });
}

#[test]
fn fallback_program_paints_magenta() {
    block_on(async {
        let mut offscreen = offscreen().await;
        let ctx = offscreen.init_context();
        let broken = ShaderProgram::compile(&ctx, SINGLE_COLOR, "fn vs_main(", "");
        assert!(broken.is_err());

        let program = ShaderProgram::fallback(&ctx, SINGLE_COLOR);
        assert!(program.is_fallback());
        let quad = tinted_quad(&ctx, "quad", [255, 255, 255, 255]);
        let render = Render::Opaque(DrawCall::new(&quad, &program, centred_at(0.5)).without_culling());
        let (_, image) = offscreen.capture(render, &identity_view()).await.unwrap();

        assert_pixel_near(&image, CENTRE, CENTRE, [255, 0, 255]);
    });
}

#[test]
fn unreadable_texture_is_replaced_by_magenta() {
    block_on(async {
        let mut offscreen = offscreen().await;
        let ctx = offscreen.init_context();
        let program = single_tex(&ctx);
        let textures = TextureLoader::new(&ctx.device, &ctx.queue);
        assert!(textures.load("texture/no_such_file.png").await.is_err());

        let mut quad = Mesh::from_interleaved(&ctx.device, "quad", &primitives::WINDOW).unwrap();
        quad.add_texture(
            textures.load_or_placeholder("texture/no_such_file.png").await,
            "InTex",
        );
        let render = Render::Opaque(DrawCall::new(&quad, &program, centred_at(0.5)).without_culling());
        let (_, image) = offscreen.capture(render, &identity_view()).await.unwrap();

        assert_pixel_near(&image, CENTRE, CENTRE, [255, 0, 255]);
    });
}
