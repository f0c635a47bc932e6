// src/occlusion/capture.rs
// Depth capture pass: draws the rotated mesh into a float position target
// One capture per trial; the target is read by the accumulation pass in the same submission
// RELEVANT FILES: src/shaders/ao_capture.wgsl, src/occlusion/accumulate.rs, src/occlusion/mod.rs

use std::borrow::Cow;

use wgpu::util::DeviceExt;

use crate::core::resource_tracker::{ResourceRegistry, TrackedBuffer, TrackedTexture};
use crate::device_caps::{FLOAT_TARGET_FORMAT, MAX_U16_INDEXED_VERTICES};

const CAPTURE_WGSL: &str = include_str!("../shaders/ao_capture.wgsl");

pub const CAPTURE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Clear value of the position target; w < 0 marks "no surface".
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: -1.0,
};

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

struct IndexStream {
    buffer: TrackedBuffer,
    format: wgpu::IndexFormat,
    count: u32,
}

pub struct DepthCapturePass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    /// Nearest rotated surface position per texel (xyz) plus depth slope (w)
    pub target: TrackedTexture,
    depth: TrackedTexture,
    vertex_buffer: TrackedBuffer,
    vertex_count: u32,
    indices: Option<IndexStream>,
}

impl DepthCapturePass {
    pub fn new(
        device: &wgpu::Device,
        registry: &ResourceRegistry,
        uniforms: &wgpu::Buffer,
        positions: &[[f32; 3]],
        cells: Option<&[[u32; 3]]>,
        resolution: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("geo-ao.capture.shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(CAPTURE_WGSL)),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geo-ao.capture.bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("geo-ao.capture.pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("geo-ao.capture.pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_capture",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_capture",
                targets: &[Some(wgpu::ColorTargetState {
                    format: FLOAT_TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // Winding is not trusted; both faces of every triangle occlude.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: CAPTURE_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("geo-ao.capture.bind-group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        let target = TrackedTexture::create(
            device,
            registry,
            "geo-ao.capture.surface",
            resolution,
            FLOAT_TARGET_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth = TrackedTexture::create(
            device,
            registry,
            "geo-ao.capture.depth",
            resolution,
            CAPTURE_DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        let vertex_buffer = TrackedBuffer::track(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("geo-ao.capture.vertices"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            registry,
        );

        let indices = cells.map(|cells| create_index_stream(device, registry, positions.len(), cells));

        Self {
            pipeline,
            bind_group,
            target,
            depth,
            vertex_buffer,
            vertex_count: positions.len() as u32,
            indices,
        }
    }

    pub fn index_format(&self) -> Option<wgpu::IndexFormat> {
        self.indices.as_ref().map(|i| i.format)
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("geo-ao.capture.pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKGROUND),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.buffer.slice(..));
        match &self.indices {
            Some(indices) if indices.count == 0 => {}
            Some(indices) => {
                pass.set_index_buffer(indices.buffer.buffer.slice(..), indices.format);
                pass.draw_indexed(0..indices.count, 0, 0..1);
            }
            // Unindexed: consecutive triples are triangles, a trailing partial triple is ignored.
            None => pass.draw(0..self.vertex_count, 0..1),
        }
    }

    pub fn release(&self, registry: &ResourceRegistry) {
        self.target.release(registry);
        self.depth.release(registry);
        self.vertex_buffer.release(registry);
        if let Some(indices) = &self.indices {
            indices.buffer.release(registry);
        }
    }
}

fn create_index_stream(
    device: &wgpu::Device,
    registry: &ResourceRegistry,
    vertex_count: usize,
    cells: &[[u32; 3]],
) -> IndexStream {
    let flat: Vec<u32> = cells.iter().flatten().copied().collect();
    let count = flat.len() as u32;

    let (contents, format): (Vec<u8>, _) = if vertex_count <= MAX_U16_INDEXED_VERTICES {
        let narrow: Vec<u16> = flat.iter().map(|&i| i as u16).collect();
        (bytemuck::cast_slice(&narrow).to_vec(), wgpu::IndexFormat::Uint16)
    } else {
        (bytemuck::cast_slice(&flat).to_vec(), wgpu::IndexFormat::Uint32)
    };

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("geo-ao.capture.indices"),
        contents: &contents,
        usage: wgpu::BufferUsages::INDEX,
    });
    log::debug!("index stream: {} indices as {:?}", count, format);

    IndexStream {
        buffer: TrackedBuffer::track(buffer, registry),
        format,
        count,
    }
}
