//! The blending demo: a metal floor, a lamp, a lit model, a marble cube and
//! five half-transparent windows.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use instant::Duration;

use crate::{
    context::{Context, InitContext},
    data_structures::{instance::Instance, model::Mesh, model::Model, primitives},
    flow::{FlowConstructor, GraphicsFlow},
    pipelines::{
        basic::{SINGLE_COLOR, SINGLE_TEX},
        phong::{self, PHONG_MODEL, PhongLights},
        shader::{ShaderDesc, ShaderProgram},
    },
    render::{DrawCall, Render},
    resources::{self, texture::TextureLoader},
};

pub const LIGHT_POSITION: [f32; 3] = [1.2, 1.0, 2.0];
pub const CUBE_POSITIONS: [[f32; 3]; 2] = [[0.0, 0.0, 0.0], [2.0, 5.0, -15.0]];
pub const WINDOW_POSITIONS: [[f32; 3]; 5] = [
    [-1.5, 0.0, -0.48],
    [1.5, 0.0, 0.51],
    [0.0, 0.0, 0.7],
    [-0.3, 0.0, -2.3],
    [0.5, 0.0, -0.6],
];

const MODEL_FILE: &str = "model/nanosuit/nanosuit.obj";

async fn program(ctx: &InitContext, desc: ShaderDesc, name: &str) -> ShaderProgram {
    ShaderProgram::load_or_fallback(
        ctx,
        desc,
        &format!("shader/{name}.wgsl"),
        &format!("shader/{name}.wgsl"),
    )
    .await
}

pub struct DemoScene {
    single_color: ShaderProgram,
    single_tex: ShaderProgram,
    phong: ShaderProgram,
    floor: Mesh,
    lamp: Mesh,
    suit: Model,
    marble: Mesh,
    window: Mesh,
}

impl DemoScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let (mut single_color, single_tex, mut phong) = futures::join!(
            program(ctx, SINGLE_COLOR, "single_color"),
            program(ctx, SINGLE_TEX, "single_tex"),
            program(ctx, PHONG_MODEL, "phong_model"),
        );
        single_color.set_vec3("InColor", [1.0, 1.0, 1.0]);
        PhongLights::new(LIGHT_POSITION.into()).apply(&mut phong);

        let textures = TextureLoader::new(&ctx.device, &ctx.queue);
        let (metal_tex, marble_tex, window_tex) = futures::join!(
            textures.load_or_placeholder("texture/metal.png"),
            textures.load_or_placeholder("texture/marble.png"),
            textures.load_or_placeholder("texture/blending_window.png"),
        );
        let mut floor = Mesh::from_interleaved(&ctx.device, "floor", &primitives::PLANE)?;
        floor.add_texture(metal_tex, "InTex");
        let lamp = Mesh::from_interleaved(&ctx.device, "lamp", &primitives::CUBE)?;
        let mut marble = Mesh::from_interleaved(&ctx.device, "marble cube", &primitives::CUBE)?;
        marble.add_texture(marble_tex, "InTex");
        let mut window = Mesh::from_interleaved(&ctx.device, "window", &primitives::WINDOW)?;
        window.add_texture(window_tex, "InTex");

        let suit = match resources::load_model_obj(MODEL_FILE, &ctx.device, &ctx.queue).await {
            Ok(model) => model,
            Err(e) => {
                log::error!("{e}");
                Model::empty(MODEL_FILE)
            }
        };

        Ok(Self {
            single_color,
            single_tex,
            phong,
            floor,
            lamp,
            suit,
            marble,
            window,
        })
    }

    pub fn constructor() -> FlowConstructor {
        Box::new(|ctx| {
            Box::pin(async move {
                let scene = DemoScene::new(&ctx).await?;
                Ok(Box::new(scene) as Box<dyn GraphicsFlow>)
            })
        })
    }
}

impl GraphicsFlow for DemoScene {
    fn on_update(&mut self, ctx: &Context, _dt: Duration) {
        phong::apply_view(&mut self.phong, &ctx.camera);
    }

    fn on_render(&self) -> Render<'_> {
        let lamp = Instance::at(LIGHT_POSITION)
            .with_uniform_scale(0.2)
            .to_matrix();
        let suit = Instance::at(CUBE_POSITIONS[0])
            .with_uniform_scale(0.05)
            .to_matrix();
        let marble = Instance::at(CUBE_POSITIONS[1])
            .with_uniform_scale(3.0)
            .to_matrix();

        let opaques = vec![
            DrawCall::new(&self.floor, &self.single_tex, Matrix4::identity()).without_culling(),
            DrawCall::new(&self.lamp, &self.single_color, lamp),
            DrawCall::new(&self.suit, &self.phong, suit),
            DrawCall::new(&self.marble, &self.single_tex, marble),
        ];
        let windows = WINDOW_POSITIONS
            .iter()
            .map(|&position| {
                DrawCall::new(
                    &self.window,
                    &self.single_tex,
                    Matrix4::from_translation(Vector3::from(position)),
                )
            })
            .collect();

        Render::Composed(vec![Render::Opaques(opaques), Render::Transparents(windows)])
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::{
        config,
        transparency::{SortPolicy, sort_by_distance},
    };

    #[test]
    fn windows_seen_from_the_start_are_drawn_farthest_first() {
        let eye = Point3::from(config::CAMERA_START);
        let positions: Vec<Point3<f32>> = WINDOW_POSITIONS.iter().map(|&p| p.into()).collect();
        let order: Vec<usize> = sort_by_distance(eye, &positions, SortPolicy::Stable)
            .back_to_front()
            .collect();
        assert_eq!(order, vec![3, 0, 4, 1, 2]);
    }
}
