//! Render composition and the per-frame draw protocol.
//!
//! A scene describes what it wants drawn with a [`Render`]. The frame loop
//! flattens it into opaque and transparent [`DrawCall`]s, draws the opaques in
//! the order they were declared, then sorts the transparent ones by distance to
//! the eye and draws them farthest first (see [`crate::transparency`]).
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum a scene returns every frame
//! - [`DrawCall<'a>`] is one drawable, the program to draw it with and its model matrix
//! - [`Frame<'a>`] is the pass being recorded plus the state a draw depends on:
//!   the active program and whether back faces are culled
//! - [`ViewState`] holds the eye position and the frame-global view/projection

use cgmath::{EuclideanSpace, Matrix4, Point3};

use crate::{
    camera::{Camera, Projection},
    config,
    data_structures::model::Drawable,
    pipelines::{
        shader::{ProgramId, ShaderProgram},
        transform::{TransformArena, TransformUniform},
    },
    transparency::{SortPolicy, sort_by_distance},
};

/// A render pass being recorded, with the GPU state draws read implicitly.
///
/// Face culling starts disabled, as in a fresh GL context, and no program is active.
pub struct Frame<'a> {
    pass: wgpu::RenderPass<'a>,
    transforms: &'a mut TransformArena,
    active: Option<ProgramId>,
    // pipeline currently set on the pass: (program, culling)
    bound: Option<(ProgramId, bool)>,
    face_culling: bool,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(pass: wgpu::RenderPass<'a>, transforms: &'a mut TransformArena) -> Self {
        Self {
            pass,
            transforms,
            active: None,
            bound: None,
            face_culling: false,
        }
    }

    /// Makes `shader` the active program. Draws with any other program are skipped.
    pub fn use_program(&mut self, shader: &ShaderProgram) {
        self.active = Some(shader.id());
        self.pass
            .set_bind_group(1, shader.uniform_bind_group(), &[]);
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.active
    }

    pub fn set_face_culling(&mut self, enabled: bool) {
        self.face_culling = enabled;
    }

    pub fn face_culling(&self) -> bool {
        self.face_culling
    }

    /// Sets the pipeline for `shader` under the current culling state.
    ///
    /// Returns false, and the caller must not draw, if `shader` is not the active program.
    pub fn prepare(&mut self, shader: &ShaderProgram) -> bool {
        if self.active != Some(shader.id()) {
            log::warn!(
                "{} is not the active program, draw skipped",
                shader.label()
            );
            return false;
        }
        let state = (shader.id(), self.face_culling);
        if self.bound != Some(state) {
            self.pass.set_pipeline(shader.pipeline(self.face_culling));
            self.bound = Some(state);
        }
        true
    }

    /// Stages the transforms of the next draw and points group 0 at them.
    pub fn push_transform(&mut self, transform: &TransformUniform) -> bool {
        match self.transforms.push(transform) {
            Some(offset) => {
                self.pass
                    .set_bind_group(0, self.transforms.bind_group(), &[offset]);
                true
            }
            None => {
                log::warn!(
                    "more than {} draws in one frame, dropping the rest",
                    config::MAX_DRAWS_PER_FRAME
                );
                false
            }
        }
    }

    pub fn pass_mut(&mut self) -> &mut wgpu::RenderPass<'a> {
        &mut self.pass
    }
}

/// Eye position and the frame-global matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub eye: Point3<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl ViewState {
    pub fn new(camera: &Camera, projection: &Projection) -> Self {
        Self {
            eye: camera.position,
            view: camera.look_at(),
            projection: projection.calc_matrix(camera.zoom),
        }
    }
}

/// One drawable, drawn once with one program and one model matrix.
pub struct DrawCall<'a> {
    pub drawable: &'a dyn Drawable,
    pub shader: &'a ShaderProgram,
    pub model: Matrix4<f32>,
    pub face_culling: bool,
}

impl<'a> DrawCall<'a> {
    /// A draw with back-face culling enabled.
    pub fn new(drawable: &'a dyn Drawable, shader: &'a ShaderProgram, model: Matrix4<f32>) -> Self {
        Self {
            drawable,
            shader,
            model,
            face_culling: true,
        }
    }

    /// Draws both sides, e.g. for a floor plane seen from below.
    pub fn without_culling(mut self) -> Self {
        self.face_culling = false;
        self
    }

    /// The translation of the model matrix, used to sort transparent draws.
    pub fn world_position(&self) -> Point3<f32> {
        Point3::from_vec(self.model.w.truncate())
    }
}

/// Specifies what a scene renders this frame.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Opaque(DrawCall)` / `Opaques(Vec<DrawCall>)` are drawn first, in declaration order
/// - `Transparent(DrawCall)` / `Transparents(Vec<DrawCall>)` are drawn last, farthest first
/// - `Composed(Vec<Render>)` renders a composition of multiple renders
pub enum Render<'a> {
    None,
    Opaque(DrawCall<'a>),
    Opaques(Vec<DrawCall<'a>>),
    Transparent(DrawCall<'a>),
    Transparents(Vec<DrawCall<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn split(self, opaques: &mut Vec<DrawCall<'a>>, transparents: &mut Vec<DrawCall<'a>>) {
        match self {
            Render::Opaque(call) => opaques.push(call),
            Render::Opaques(mut calls) => opaques.append(&mut calls),
            Render::Transparent(call) => transparents.push(call),
            Render::Transparents(mut calls) => transparents.append(&mut calls),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.split(opaques, transparents)),
            Render::None => (),
        }
    }
}

/// Number of draw calls issued per category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawCounts {
    pub opaque: usize,
    pub transparent: usize,
}

/// Records `render` into `frame`: opaques first, then transparents back to front.
pub fn draw_render(
    frame: &mut Frame<'_>,
    render: Render<'_>,
    view: &ViewState,
    policy: SortPolicy,
) -> DrawCounts {
    let mut opaques = Vec::new();
    let mut transparents = Vec::new();
    render.split(&mut opaques, &mut transparents);

    for call in &opaques {
        issue(frame, call, view);
    }

    let positions: Vec<Point3<f32>> = transparents.iter().map(DrawCall::world_position).collect();
    let order = sort_by_distance(view.eye, &positions, policy);
    for index in order.back_to_front() {
        issue(frame, &transparents[index], view);
    }

    DrawCounts {
        opaque: opaques.len(),
        transparent: order.len(),
    }
}

fn issue(frame: &mut Frame<'_>, call: &DrawCall<'_>, view: &ViewState) {
    if frame.active_program() != Some(call.shader.id()) {
        frame.use_program(call.shader);
    }
    frame.set_face_culling(call.face_culling);
    call.drawable
        .draw(frame, call.shader, call.model, view.view, view.projection);
}

/// Clears `target` and `depth`, then records `render` with [`draw_render`].
///
/// The staged transforms still have to be flushed before the encoder is submitted.
#[allow(clippy::too_many_arguments)]
pub(crate) fn encode_frame(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    clear_colour: wgpu::Color,
    transforms: &mut TransformArena,
    render: Render<'_>,
    view: &ViewState,
    policy: SortPolicy,
) -> DrawCounts {
    transforms.reset();
    let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    });
    let mut frame = Frame::new(render_pass, transforms);
    draw_render(&mut frame, render, view, policy)
}
