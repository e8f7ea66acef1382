//! Shader programs.
//!
//! A [`ShaderProgram`] is a WGSL vertex and fragment stage linked against the
//! engine's three bind groups:
//!
//! - group 0: the per-draw [`TransformUniform`](crate::pipelines::transform::TransformUniform), dynamic offset
//! - group 1: the program's named uniform block (see [`UniformBlock`])
//! - group 2: texture slots, slot `i` uses binding `2i` (texture) and `2i + 1` (sampler)
//!
//! Sources are checked with naga before anything reaches the device, so a
//! broken shader file becomes a [`ShaderError`] instead of a device panic.
//! Each program owns two pipelines, with and without back-face culling, so the
//! frame can toggle culling without rebuilding anything.

use std::sync::atomic::{AtomicU32, Ordering};

use wgpu::util::DeviceExt;

use crate::{
    context::InitContext,
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::{self, Texture},
    },
    error::{ShaderError, Stage},
    pipelines::{
        basic::mk_render_pipeline,
        uniforms::{UniformBlock, UniformField},
    },
    resources,
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const FALLBACK_SHADER: &str = include_str!("fallback.wgsl");

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

/// Everything about a program except its source.
#[derive(Clone, Copy, Debug)]
pub struct ShaderDesc {
    pub label: &'static str,
    pub uniforms: &'static [UniformField],
    /// Texture slot names, in binding order.
    pub textures: &'static [&'static str],
    pub blend: Option<wgpu::BlendState>,
}

#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    desc: ShaderDesc,
    device: wgpu::Device,
    queue: wgpu::Queue,
    culled: wgpu::RenderPipeline,
    unculled: wgpu::RenderPipeline,
    block: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    placeholder: Texture,
    fallback: bool,
}

impl ShaderProgram {
    /// Validates both stages and builds the program.
    pub fn compile(
        ctx: &InitContext,
        desc: ShaderDesc,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        validate_program(desc.label, desc.textures.len(), vertex_source, fragment_source)?;
        let program = Self::build(ctx, desc, vertex_source, fragment_source, false);
        log::info!("compiled shader program {}", desc.label);
        Ok(program)
    }

    /// Reads both stages from the asset directory and compiles them.
    pub async fn load(
        ctx: &InitContext,
        desc: ShaderDesc,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<Self, ShaderError> {
        let vertex_source = resources::load_string(vertex_path).await?;
        let fragment_source = resources::load_string(fragment_path).await?;
        Self::compile(ctx, desc, &vertex_source, &fragment_source)
    }

    /// Like [`ShaderProgram::load`], but a failure is logged and replaced by [`ShaderProgram::fallback`].
    pub async fn load_or_fallback(
        ctx: &InitContext,
        desc: ShaderDesc,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Self {
        match Self::load(ctx, desc, vertex_path, fragment_path).await {
            Ok(program) => program,
            Err(e) => {
                log::error!("{e}");
                Self::fallback(ctx, desc)
            }
        }
    }

    /// A program with `desc`'s uniforms and slots that paints everything magenta.
    pub fn fallback(ctx: &InitContext, desc: ShaderDesc) -> Self {
        log::warn!("using the fallback shader for {}", desc.label);
        Self::build(ctx, desc, FALLBACK_SHADER, FALLBACK_SHADER, true)
    }

    fn build(
        ctx: &InitContext,
        desc: ShaderDesc,
        vertex_source: &str,
        fragment_source: &str,
        fallback: bool,
    ) -> Self {
        let device = &ctx.device;
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", desc.label)),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", desc.label)),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });

        let block = UniformBlock::new(desc.uniforms);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniform Buffer", desc.label)),
            contents: block.bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("uniform_bind_group_layout"),
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });
        let texture_layout = texture_slots_layout(device, desc.textures.len());

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", desc.label)),
            bind_group_layouts: &[
                Some(&ctx.transform_layout),
                Some(&uniform_layout),
                Some(&texture_layout),
            ],
            immediate_size: 0,
        });
        let mk = |cull_mode| {
            mk_render_pipeline(
                device,
                desc.label,
                &layout,
                ctx.color_format,
                desc.blend,
                Some(Texture::DEPTH_FORMAT),
                &[ModelVertex::desc()],
                &vertex,
                &fragment,
                cull_mode,
            )
        };
        let culled = mk(Some(wgpu::Face::Back));
        let unculled = mk(None);

        let placeholder = Texture::create_solid(
            [255, 255, 255, 255],
            "placeholder texture",
            device,
            &ctx.queue,
        );

        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            desc,
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            culled,
            unculled,
            block,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            placeholder,
            fallback,
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        self.desc.label
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn texture_slots(&self) -> &[&'static str] {
        self.desc.textures
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.block
    }

    pub(crate) fn pipeline(&self, face_culling: bool) -> &wgpu::RenderPipeline {
        if face_culling {
            &self.culled
        } else {
            &self.unculled
        }
    }

    pub(crate) fn uniform_bind_group(&self) -> &wgpu::BindGroup {
        &self.uniform_bind_group
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        let changed = self.block.set_bool(name, value);
        self.upload(changed);
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        let changed = self.block.set_int(name, value);
        self.upload(changed);
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        let changed = self.block.set_float(name, value);
        self.upload(changed);
    }

    pub fn set_vec3(&mut self, name: &str, value: impl Into<[f32; 3]>) {
        let changed = self.block.set_vec3(name, value.into());
        self.upload(changed);
    }

    fn upload(&self, changed: Option<std::ops::Range<usize>>) {
        if let Some(range) = changed {
            self.queue.write_buffer(
                &self.uniform_buffer,
                range.start as wgpu::BufferAddress,
                &self.block.bytes()[range],
            );
        }
    }

    /// Binds `textures` to this program's slots by name.
    ///
    /// Slots without a matching texture get a white placeholder; textures
    /// whose name is not a slot of this program are skipped.
    pub fn texture_bind_group(
        &self,
        mesh_name: &str,
        textures: &[(Texture, String)],
    ) -> wgpu::BindGroup {
        for (_, name) in textures {
            if !self.desc.textures.iter().any(|slot| slot == name) {
                log::debug!(
                    "{} has no texture slot {name} (mesh {mesh_name})",
                    self.desc.label
                );
            }
        }
        let bound: Vec<&Texture> = self
            .desc
            .textures
            .iter()
            .map(|slot| {
                textures
                    .iter()
                    .find(|(_, name)| name == slot)
                    .map(|(texture, _)| texture)
                    .unwrap_or(&self.placeholder)
            })
            .collect();
        let samplers: Vec<wgpu::Sampler> = bound
            .iter()
            .map(|texture| {
                texture
                    .sampler
                    .clone()
                    .unwrap_or_else(|| texture::create_default_sampler(&self.device))
            })
            .collect();
        let entries: Vec<wgpu::BindGroupEntry> = bound
            .iter()
            .zip(&samplers)
            .enumerate()
            .flat_map(|(slot, (texture, sampler))| {
                [
                    wgpu::BindGroupEntry {
                        binding: 2 * slot as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2 * slot as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ]
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &entries,
            label: Some(&format!("{mesh_name} textures for {}", self.desc.label)),
        })
    }
}

fn texture_slots_layout(device: &wgpu::Device, slots: usize) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..slots as u32)
        .flat_map(|slot| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * slot,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * slot + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("texture_slots_layout"),
    })
}

/// Checks a vertex/fragment pair without touching the GPU.
///
/// Each stage must parse and validate on its own, the vertex source must
/// define `vs_main` and the fragment source `fs_main`, every fragment input
/// location must be written by the vertex stage, and every resource binding
/// must be one the engine provides for `texture_slots` slots.
pub fn validate_program(
    label: &str,
    texture_slots: usize,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<(), ShaderError> {
    let vertex = validate_stage(label, Stage::Vertex, vertex_source)?;
    let fragment = validate_stage(label, Stage::Fragment, fragment_source)?;

    let link_error = |reason: String| ShaderError::Link {
        label: label.to_string(),
        reason,
    };

    let vs_main = vertex
        .entry_points
        .iter()
        .find(|ep| ep.name == VERTEX_ENTRY && ep.stage == naga::ShaderStage::Vertex)
        .ok_or_else(|| link_error(format!("no vertex entry point `{VERTEX_ENTRY}`")))?;
    let fs_main = fragment
        .entry_points
        .iter()
        .find(|ep| ep.name == FRAGMENT_ENTRY && ep.stage == naga::ShaderStage::Fragment)
        .ok_or_else(|| link_error(format!("no fragment entry point `{FRAGMENT_ENTRY}`")))?;

    let mut outputs = Vec::new();
    if let Some(result) = &vs_main.function.result {
        collect_locations(&vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }
    let mut inputs = Vec::new();
    for argument in &fs_main.function.arguments {
        collect_locations(&fragment, argument.ty, argument.binding.as_ref(), &mut inputs);
    }
    if let Some(missing) = inputs.iter().find(|location| !outputs.contains(location)) {
        return Err(link_error(format!(
            "fragment input @location({missing}) is not written by the vertex stage"
        )));
    }

    for module in [&vertex, &fragment] {
        for (_, global) in module.global_variables.iter() {
            if let Some(binding) = &global.binding {
                let provided = match binding.group {
                    0 | 1 => binding.binding == 0,
                    2 => (binding.binding as usize) < 2 * texture_slots,
                    _ => false,
                };
                if !provided {
                    return Err(link_error(format!(
                        "@group({}) @binding({}) is not provided by the engine",
                        binding.group, binding.binding
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_stage(label: &str, stage: Stage, source: &str) -> Result<naga::Module, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        stage,
        label: label.to_string(),
        log,
    };
    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| compile_error(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| compile_error(e.emit_to_string(source)))?;
    Ok(module)
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        out.push(*location);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFORMS: &str = r#"
struct Transforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    normal: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> transforms: Transforms;
"#;

    fn vertex_stage() -> String {
        format!(
            "{TRANSFORMS}
struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}}
@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(2) tex_coords: vec2<f32>) -> VertexOutput {{
    var out: VertexOutput;
    out.clip_position = transforms.projection * transforms.view * transforms.model * vec4<f32>(position, 1.0);
    out.tex_coords = tex_coords;
    return out;
}}"
        )
    }

    const FRAGMENT: &str = r#"
@group(2) @binding(0) var t_tex: texture_2d<f32>;
@group(2) @binding(1) var s_tex: sampler;
@fragment
fn fs_main(@location(0) tex_coords: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t_tex, s_tex, tex_coords);
}
"#;

    #[test]
    fn matching_stages_link() {
        validate_program("ok", 1, &vertex_stage(), FRAGMENT).unwrap();
    }

    #[test]
    fn syntax_error_names_the_stage() {
        let err = validate_program("broken", 1, &vertex_stage(), "@fragment fn fs_main( {").unwrap_err();
        match err {
            ShaderError::Compile { stage, label, .. } => {
                assert_eq!(stage, Stage::Fragment);
                assert_eq!(label, "broken");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn missing_entry_point_fails_to_link() {
        let vertex = vertex_stage().replace("fn vs_main", "fn main_vs");
        let err = validate_program("renamed", 1, &vertex, FRAGMENT).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let fragment = FRAGMENT.replace("@location(0) tex_coords", "@location(3) tex_coords");
        let err = validate_program("mismatch", 1, &vertex_stage(), &fragment).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn texture_binding_without_slot_fails_to_link() {
        let err = validate_program("no slots", 0, &vertex_stage(), FRAGMENT).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn fallback_shader_is_valid() {
        validate_program("fallback", 0, FALLBACK_SHADER, FALLBACK_SHADER).unwrap();
    }
}
