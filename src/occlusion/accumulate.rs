// src/occlusion/accumulate.rs
// Ping-pong accumulation of per-vertex occlusion counts
// Each trial reads totals from one target and writes updated totals into the other
// RELEVANT FILES: src/shaders/ao_accumulate.wgsl, src/occlusion/capture.rs, src/renderer/readback.rs

use std::borrow::Cow;

use crate::core::resource_tracker::{ResourceRegistry, TrackedTexture};
use crate::device_caps::FLOAT_TARGET_FORMAT;

const ACCUMULATE_WGSL: &str = include_str!("../shaders/ao_accumulate.wgsl");

/// Views the accumulation shader reads besides the running totals.
pub struct AccumulationInputs<'a> {
    pub uniforms: &'a wgpu::Buffer,
    pub vertices: &'a wgpu::TextureView,
    pub normals: &'a wgpu::TextureView,
    pub surface: &'a wgpu::TextureView,
}

pub struct AccumulationPass {
    pipeline: wgpu::RenderPipeline,
    targets: [TrackedTexture; 2],
    /// `bind_groups[i]` reads its totals from `targets[i]`
    bind_groups: [wgpu::BindGroup; 2],
    current: usize,
}

impl AccumulationPass {
    pub fn new(
        device: &wgpu::Device,
        registry: &ResourceRegistry,
        inputs: AccumulationInputs<'_>,
        texture_resolution: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("geo-ao.accumulate.shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(ACCUMULATE_WGSL)),
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geo-ao.accumulate.bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("geo-ao.accumulate.pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("geo-ao.accumulate.pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_accumulate",
                targets: &[Some(wgpu::ColorTargetState {
                    format: FLOAT_TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let targets = [
            TrackedTexture::create(
                device,
                registry,
                "geo-ao.accumulate.ping",
                texture_resolution,
                FLOAT_TARGET_FORMAT,
                usage,
            ),
            TrackedTexture::create(
                device,
                registry,
                "geo-ao.accumulate.pong",
                texture_resolution,
                FLOAT_TARGET_FORMAT,
                usage,
            ),
        ];

        let bind_group_for = |previous: &wgpu::TextureView, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: inputs.uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(inputs.vertices),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(inputs.normals),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(inputs.surface),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(previous),
                    },
                ],
            })
        };
        let bind_groups = [
            bind_group_for(&targets[0].view, "geo-ao.accumulate.bind-group.from-ping"),
            bind_group_for(&targets[1].view, "geo-ao.accumulate.bind-group.from-pong"),
        ];

        Self {
            pipeline,
            targets,
            bind_groups,
            current: 0,
        }
    }

    /// Zero both targets. Must run before the first trial.
    pub fn encode_clear(&self, encoder: &mut wgpu::CommandEncoder) {
        for target in &self.targets {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("geo-ao.accumulate.clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
    }

    /// Record one accumulation step into the target that is not current.
    /// Call [`swap`](Self::swap) once the step has been recorded.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let destination = &self.targets[1 - self.current];
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("geo-ao.accumulate.pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &destination.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[self.current], &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Target holding the totals after the most recent trial.
    pub fn current(&self) -> &TrackedTexture {
        &self.targets[self.current]
    }

    pub fn release(&self, registry: &ResourceRegistry) {
        for target in &self.targets {
            target.release(registry);
        }
    }
}
