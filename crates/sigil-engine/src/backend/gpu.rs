//! wgpu implementation of [`Backend`] (feature `gpu`).
//!
//! Geometry is tessellated and transformed on the CPU with the same pipeline
//! state as the software backend, then queued together with a snapshot of that
//! state. The queue is flushed into an off-screen `Rgba8Unorm` target with a
//! `Stencil8` attachment whenever pixels are read back.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::mpsc;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{Affine, ClipPlane, ClipSlot, Rect, Vec2};
use crate::device::{Gpu, GpuInit};
use crate::paint::Color;
use crate::pixels::PixelBuffer;

use super::raster::{PipelineState, Vertex};
use super::{
    Backend, BlendFactor, BlendMode, ColorMask, CompareFunc, PrimitiveKind, StencilOp, StencilState,
    TextureHandle,
};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Stencil8;

// ── vertex / uniform layout ───────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuVertex {
    pos: [f32; 2],
    color: [f32; 4],
    uv: [f32; 2],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos (screen pixels)
        1 => Float32x4, // color
        2 => Float32x2  // uv
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self { pos: [v.pos.x, v.pos.y], color: v.color.clamped().as_array(), uv: [v.uv.x, v.uv.y] }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    viewport: [f32; 2],
    textured: u32,
    plane_count: u32,
    planes: [[f32; 4]; 3],
}

fn uniform_min_binding_size() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64)
}

// ── pipeline cache key ────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct StencilKey {
    compare: CompareFunc,
    fail: StencilOp,
    zfail: StencilOp,
    pass: StencilOp,
    read_mask: u8,
    write_mask: u8,
}

/// Everything baked into a render pipeline. The stencil reference is dynamic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    blend: BlendMode,
    color_mask: ColorMask,
    stencil: Option<StencilKey>,
}

impl PipelineKey {
    fn new(state: &PipelineState) -> Self {
        let StencilState { test_enabled, write_mask, compare, compare_mask, fail_op, zfail_op, pass_op, .. } =
            state.stencil;
        let stencil = test_enabled.then_some(StencilKey {
            compare,
            fail: fail_op,
            zfail: zfail_op,
            pass: pass_op,
            read_mask: compare_mask,
            write_mask,
        });
        Self { blend: state.blend, color_mask: state.color_mask, stencil }
    }
}

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(mode.src),
        dst_factor: blend_factor(mode.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut w = wgpu::ColorWrites::empty();
    for (on, bit) in [
        (mask.r, wgpu::ColorWrites::RED),
        (mask.g, wgpu::ColorWrites::GREEN),
        (mask.b, wgpu::ColorWrites::BLUE),
        (mask.a, wgpu::ColorWrites::ALPHA),
    ] {
        if on {
            w |= bit;
        }
    }
    w
}

fn compare_function(f: CompareFunc) -> wgpu::CompareFunction {
    match f {
        CompareFunc::Never => wgpu::CompareFunction::Never,
        CompareFunc::Less => wgpu::CompareFunction::Less,
        CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunc::Greater => wgpu::CompareFunction::Greater,
        CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunc::Equal => wgpu::CompareFunction::Equal,
        CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunc::Always => wgpu::CompareFunction::Always,
    }
}

fn stencil_operation(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOp::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        StencilOp::Invert => wgpu::StencilOperation::Invert,
    }
}

fn stencil_state(key: Option<StencilKey>) -> wgpu::StencilState {
    let Some(k) = key else {
        // Test off: every fragment passes and nothing is written.
        return wgpu::StencilState {
            front: wgpu::StencilFaceState::IGNORE,
            back: wgpu::StencilFaceState::IGNORE,
            read_mask: 0,
            write_mask: 0,
        };
    };
    let face = wgpu::StencilFaceState {
        compare: compare_function(k.compare),
        fail_op: stencil_operation(k.fail),
        depth_fail_op: stencil_operation(k.zfail),
        pass_op: stencil_operation(k.pass),
    };
    wgpu::StencilState { front: face, back: face, read_mask: k.read_mask as u32, write_mask: k.write_mask as u32 }
}

// ── queued work ───────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone)]
enum TextureRef {
    White,
    Uploaded(usize),
    Scratch(usize),
}

struct QueuedDraw {
    vertices: Vec<GpuVertex>,
    key: PipelineKey,
    stencil_ref: u8,
    /// `(x, y, w, h)` in pixels; `None` covers the whole target.
    scissor: Option<(u32, u32, u32, u32)>,
    uniform: DrawUniform,
    texture: TextureRef,
}

enum Op {
    Draw(QueuedDraw),
    ClearStencil(u8),
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Off-screen wgpu backend.
pub struct GpuBackend {
    gpu: Gpu,
    width: u32,
    height: u32,
    state: PipelineState,

    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    stencil_view: wgpu::TextureView,

    shader: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    white: GpuTexture,
    textures: Vec<GpuTexture>,
    /// Per-flush textures backing `write_pixels`.
    scratch: Vec<GpuTexture>,

    ops: Vec<Op>,
    pending_clear: Option<Color>,
}

impl GpuBackend {
    /// Creates a `width × height` target cleared to `clear`.
    pub fn new(gpu: Gpu, width: u32, height: u32, clear: Color) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "render target has zero size");
        let device = gpu.device();

        let extent = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sigil color target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let stencil = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sigil stencil target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let stencil_view = stencil.create_view(&wgpu::TextureViewDescriptor::default());

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sigil pipeline shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pipeline.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sigil draw uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: uniform_min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sigil texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sigil pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        // Nearest sampling, clamped, to match the software backend texel for texel.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sigil sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = create_texture(
            device,
            gpu.queue(),
            &texture_layout,
            &sampler,
            &PixelBuffer::filled(1, 1, Color::WHITE.into()),
        );

        log::debug!("gpu backend {width}x{height}");
        Ok(Self {
            gpu,
            width,
            height,
            state: PipelineState::new(width, height),
            target,
            target_view,
            stencil_view,
            shader,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            pipelines: HashMap::new(),
            white,
            textures: Vec::new(),
            scratch: Vec::new(),
            ops: Vec::new(),
            pending_clear: Some(clear),
        })
    }

    /// Acquires a default device and creates the backend on it.
    pub fn headless(width: u32, height: u32, clear: Color) -> Result<Self> {
        let gpu = Gpu::new_blocking(GpuInit::default())?;
        Self::new(gpu, width, height, clear)
    }

    /// Drops queued draws and clears the target to `color`. Stencil is kept.
    pub fn clear_to(&mut self, color: Color) {
        self.ops.retain(|op| matches!(op, Op::ClearStencil(_)));
        self.pending_clear = Some(color);
    }

    /// Renders everything queued so far and reads the whole target back.
    pub fn read_frame(&mut self) -> PixelBuffer {
        self.read_pixels(Rect::new(0.0, 0.0, self.width as f32, self.height as f32))
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn queue_triangles(&mut self, tris: &[[Vertex; 3]], texture: TextureRef) {
        if tris.is_empty() {
            return;
        }
        let scissor = if self.state.scissor_enabled {
            match self.state.scissor.pixel_span(self.width, self.height) {
                Some((x0, y0, x1, y1)) => Some((x0, y0, x1 - x0, y1 - y0)),
                // Scissored away entirely: no fragment reaches the stencil either.
                None => return,
            }
        } else {
            None
        };

        let mut planes = [[0.0; 4]; 3];
        let mut plane_count = 0;
        for (slot, plane) in planes.iter_mut().zip(self.state.active_planes()) {
            *slot = plane.as_array();
            plane_count += 1;
        }
        let textured = !matches!(texture, TextureRef::White);

        self.ops.push(Op::Draw(QueuedDraw {
            vertices: tris.iter().flatten().map(GpuVertex::from).collect(),
            key: PipelineKey::new(&self.state),
            stencil_ref: self.state.stencil.reference,
            scissor,
            uniform: DrawUniform {
                viewport: [self.width as f32, self.height as f32],
                textured: textured as u32,
                plane_count,
                planes,
            },
            texture,
        }));
    }

    fn bound_texture(&self) -> TextureRef {
        match self.state.textured() {
            Some(TextureHandle(id)) if (id as usize) < self.textures.len() => TextureRef::Uploaded(id as usize),
            Some(handle) => {
                log::warn!("unknown texture {handle:?}; drawing untextured");
                TextureRef::White
            }
            None => TextureRef::White,
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let pipeline = self.gpu.device().create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sigil pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(blend_state(key.blend)),
                    write_mask: color_writes(key.color_mask),
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: STENCIL_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: stencil_state(key.stencil),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        log::trace!("pipeline created for {key:?} ({} cached)", self.pipelines.len() + 1);
        self.pipelines.insert(key, pipeline);
    }

    /// Encodes and submits every queued operation.
    fn flush(&mut self) {
        if self.ops.is_empty() && self.pending_clear.is_none() {
            return;
        }
        let keys: Vec<PipelineKey> = self
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Draw(d) => Some(d.key),
                Op::ClearStencil(_) => None,
            })
            .collect();
        for key in keys {
            self.ensure_pipeline(key);
        }

        let device = self.gpu.device();
        let align = device.limits().min_uniform_buffer_offset_alignment as usize;
        let stride = std::mem::size_of::<DrawUniform>().div_ceil(align) * align;

        let draws: Vec<&QueuedDraw> = self
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Draw(d) => Some(d),
                Op::ClearStencil(_) => None,
            })
            .collect();

        let mut vertices: Vec<GpuVertex> = Vec::new();
        let mut uniforms = vec![0u8; stride * draws.len().max(1)];
        for (i, d) in draws.iter().enumerate() {
            vertices.extend_from_slice(&d.vertices);
            let at = i * stride;
            uniforms[at..at + std::mem::size_of::<DrawUniform>()].copy_from_slice(bytemuck::bytes_of(&d.uniform));
        }
        if vertices.is_empty() {
            vertices.push(GpuVertex::zeroed());
        }

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sigil flush vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sigil flush ubo"),
            contents: &uniforms,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sigil draw uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: uniform_min_binding_size(),
                }),
            }],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sigil flush encoder"),
        });

        // One render pass per stencil clear; the clear happens on pass load.
        let mut color_load = match self.pending_clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };
        let mut stencil_load = wgpu::LoadOp::Load;
        let mut draw_index = 0usize;
        let mut vertex_base = 0u32;
        let mut ops = self.ops.iter().peekable();
        loop {
            if let Some(Op::ClearStencil(v)) = ops.peek() {
                stencil_load = wgpu::LoadOp::Clear(*v as u32);
                ops.next();
                continue;
            }
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sigil pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.stencil_view,
                    depth_ops: None,
                    stencil_ops: Some(wgpu::Operations { load: stencil_load, store: wgpu::StoreOp::Store }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            color_load = wgpu::LoadOp::Load;
            stencil_load = wgpu::LoadOp::Load;

            while let Some(Op::Draw(d)) = ops.peek() {
                ops.next();
                let count = d.vertices.len() as u32;
                let first = vertex_base;
                vertex_base += count;
                let offset = (draw_index * stride) as u32;
                draw_index += 1;

                let Some(pipeline) = self.pipelines.get(&d.key) else { continue };
                let texture = match d.texture {
                    TextureRef::White => &self.white,
                    TextureRef::Uploaded(i) => self.textures.get(i).unwrap_or(&self.white),
                    TextureRef::Scratch(i) => self.scratch.get(i).unwrap_or(&self.white),
                };
                let (sx, sy, sw, sh) = d.scissor.unwrap_or((0, 0, self.width, self.height));

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &uniform_bind_group, &[offset]);
                pass.set_bind_group(1, &texture.bind_group, &[]);
                pass.set_stencil_reference(d.stencil_ref as u32);
                pass.set_scissor_rect(sx, sy, sw, sh);
                pass.set_vertex_buffer(0, vbo.slice(..));
                pass.draw(first..first + count, 0..1);
            }
            drop(pass);

            if ops.peek().is_none() {
                break;
            }
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        log::trace!("flushed {} draws", draws.len());
        self.ops.clear();
        self.scratch.clear();
        self.pending_clear = None;
    }

    /// Copies a pixel span of the target into a tightly packed buffer.
    fn read_span(&self, x0: u32, y0: u32, w: u32, h: u32) -> Result<PixelBuffer> {
        let device = self.gpu.device();
        let row = w * 4;
        let padded = row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sigil readback"),
            size: padded as u64 * h as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sigil readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d { x: x0, y: y0, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    // Must be a multiple of 256 bytes.
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(h),
                },
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
        self.gpu.queue().submit(Some(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::PollType::wait_indefinitely())?;
        rx.recv()??;

        let mut bytes = Vec::with_capacity((row * h) as usize);
        {
            let mapped = buffer.slice(..).get_mapped_range();
            for chunk in mapped.chunks_exact(padded as usize) {
                bytes.extend_from_slice(&chunk[..row as usize]);
            }
        }
        buffer.unmap();

        PixelBuffer::from_rgba_bytes(w, h, &bytes)
            .ok_or_else(|| anyhow::anyhow!("readback size mismatch for {w}x{h}"))
    }
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    pixels: &PixelBuffer,
) -> GpuTexture {
    let (w, h) = (pixels.width().max(1), pixels.height().max(1));
    let size = wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sigil texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    if pixels.width() > 0 && pixels.height() > 0 {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.as_bytes(),
            wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(w * 4), rows_per_image: Some(h) },
            size,
        );
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sigil texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    });
    GpuTexture { _texture: texture, bind_group }
}

impl Backend for GpuBackend {
    fn reset_transform(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, degrees: f32) {
        self.state.transform.rotate(degrees);
    }

    fn set_texturing_enabled(&mut self, enabled: bool) {
        self.state.texturing = enabled;
    }

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.set_blend(src, dst);
    }

    fn set_color_write_mask(&mut self, mask: ColorMask) {
        self.state.color_mask = mask;
    }

    fn set_color(&mut self, color: Color) {
        self.state.color = color;
    }

    fn begin_primitive(&mut self, kind: PrimitiveKind) {
        self.state.begin(kind);
    }

    fn emit_vertex(&mut self, x: f32, y: f32) {
        self.state.vertex(x, y);
    }

    fn set_tex_coord(&mut self, u: f32, v: f32) {
        self.state.tex_coord = Vec2::new(u, v);
    }

    fn end_primitive(&mut self) {
        let tris = self.state.end();
        let texture = self.bound_texture();
        self.queue_triangles(&tris, texture);
    }

    fn draw_filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let tris = self.state.rect(x, y, w, h);
        let texture = self.bound_texture();
        self.queue_triangles(&tris, texture);
    }

    fn set_stencil_mask(&mut self, mask: u8) {
        self.state.stencil.write_mask = mask;
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8, mask: u8) {
        self.state.set_stencil_func(func, reference, mask);
    }

    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp) {
        self.state.set_stencil_op(fail, zfail, pass);
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.state.stencil.test_enabled = enabled;
    }

    fn clear_stencil(&mut self, value: u8) {
        self.ops.push(Op::ClearStencil(value));
    }

    fn set_scissor_test_enabled(&mut self, enabled: bool) {
        self.state.scissor_enabled = enabled;
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.state.scissor = rect.normalized();
    }

    fn set_clip_plane(&mut self, slot: ClipSlot, plane: ClipPlane) {
        self.state.set_clip_plane(slot, plane);
    }

    fn set_clip_plane_enabled(&mut self, slot: ClipSlot, enabled: bool) {
        self.state.set_clip_plane_enabled(slot, enabled);
    }

    fn upload_texture(&mut self, pixels: &PixelBuffer) -> TextureHandle {
        let tex = create_texture(self.gpu.device(), self.gpu.queue(), &self.texture_layout, &self.sampler, pixels);
        self.textures.push(tex);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.state.texture = texture;
    }

    fn read_pixels(&mut self, rect: Rect) -> PixelBuffer {
        self.flush();
        let Some((x0, y0, x1, y1)) = rect.pixel_span(self.width, self.height) else {
            return PixelBuffer::new(0, 0);
        };
        match self.read_span(x0, y0, x1 - x0, y1 - y0) {
            Ok(pixels) => pixels,
            Err(err) => {
                log::error!("pixel readback failed: {err:#}");
                PixelBuffer::new(0, 0)
            }
        }
    }

    fn write_pixels(&mut self, x: i32, y: i32, pixels: &PixelBuffer) {
        if pixels.width() == 0 || pixels.height() == 0 {
            return;
        }
        let tex = create_texture(self.gpu.device(), self.gpu.queue(), &self.texture_layout, &self.sampler, pixels);
        self.scratch.push(tex);
        let index = self.scratch.len() - 1;

        // Drawn in screen space with an opaque white base so texels pass
        // through unchanged into the fragment tests.
        let saved = (self.state.transform, self.state.color);
        self.state.transform = Affine::translation(x as f32, y as f32);
        self.state.color = Color::WHITE;
        let tris = self.state.rect(0.0, 0.0, pixels.width() as f32, pixels.height() as f32);
        (self.state.transform, self.state.color) = saved;

        self.queue_triangles(&tris, TextureRef::Scratch(index));
    }

    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── state mapping (no device needed) ──────────────────────────────────

    #[test]
    fn disabled_stencil_ignores_the_buffer() {
        let s = stencil_state(None);
        assert_eq!(s.write_mask, 0);
        assert_eq!(s.front.compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn pipeline_key_ignores_the_reference_value() {
        let mut state = PipelineState::new(4, 4);
        state.stencil.test_enabled = true;
        state.set_stencil_func(CompareFunc::Equal, 1, 1);
        let a = PipelineKey::new(&state);
        state.set_stencil_func(CompareFunc::Equal, 0, 1);
        assert_eq!(a, PipelineKey::new(&state));
    }

    #[test]
    fn empty_color_mask_writes_nothing() {
        assert_eq!(color_writes(ColorMask::NONE), wgpu::ColorWrites::empty());
        assert_eq!(color_writes(ColorMask::ALL), wgpu::ColorWrites::ALL);
    }

    #[test]
    fn uniform_layout_matches_the_shader() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 64);
        assert_eq!(std::mem::size_of::<GpuVertex>(), 32);
    }
}
