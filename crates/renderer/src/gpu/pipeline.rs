use bytemuck::{Pod, Zeroable};
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::frame::{DrawRect, FramePlan};
use crate::image_source::{PixelBuffer, PixelFormat};
use crate::types::SurfaceSize;

const QUAD_SHADER: &str = include_str!("quad.wgsl");

/// Clip-space rectangle handed to the vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct QuadUniform {
    pub rect: [f32; 4],
}

impl QuadUniform {
    /// Maps a pixel rectangle (origin top-left, y down) onto clip space.
    pub fn from_rect(rect: DrawRect, surface: SurfaceSize) -> Self {
        let width = surface.width.max(1) as f32;
        let height = surface.height.max(1) as f32;
        let to_x = |px: i32| px as f32 / width * 2.0 - 1.0;
        let to_y = |px: i32| 1.0 - px as f32 / height * 2.0;
        Self {
            rect: [
                to_x(rect.left()),
                to_y(rect.top()),
                to_x(rect.right()),
                to_y(rect.bottom()),
            ],
        }
    }
}

/// Bitmap resident on one device, bound together with its sampler and the
/// quad uniform.
pub(crate) struct BitmapTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Draws one bitmap as a quad. Sampling is always nearest-neighbour so pixel
/// edges stay hard.
pub(crate) struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    nearest: wgpu::Sampler,
}

impl QuadPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_SHADER.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bitmap layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad uniform buffer"),
            contents: bytemuck::bytes_of(&QuadUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let nearest = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            layout,
            uniform_buffer,
            nearest,
        }
    }

    /// Uploads a premultiplied BGRA buffer. The caller validates extents
    /// against the device limits.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
    ) -> BitmapTexture {
        let format = match pixels.format() {
            PixelFormat::Bgra8Premultiplied => wgpu::TextureFormat::Bgra8Unorm,
        };
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("bitmap texture"),
                size: wgpu::Extent3d {
                    width: pixels.width(),
                    height: pixels.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            pixels.as_bytes(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bitmap bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.nearest),
                },
            ],
        });

        BitmapTexture {
            _texture: texture,
            bind_group,
        }
    }

    /// Records one pass: clear, then the bitmap quad at `plan.dest`.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        bitmap: &BitmapTexture,
        plan: &FramePlan,
    ) {
        let uniform = QuadUniform::from_rect(plan.dest, plan.surface);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let [r, g, b, a] = plan.clear;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bitmap.bind_group, &[]);
        render_pass.draw(0..6, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_surface_rect_covers_clip_space() {
        let surface = SurfaceSize::new(640, 480);
        let rect = DrawRect {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
        };
        assert_eq!(
            QuadUniform::from_rect(rect, surface).rect,
            [-1.0, 1.0, 1.0, -1.0]
        );
    }

    #[test]
    fn centered_rect_maps_symmetrically() {
        let surface = SurfaceSize::new(100, 100);
        let rect = DrawRect {
            x: 25,
            y: 25,
            width: 50,
            height: 50,
        };
        assert_eq!(
            QuadUniform::from_rect(rect, surface).rect,
            [-0.5, 0.5, 0.5, -0.5]
        );
    }

    #[test]
    fn downward_offset_lowers_clip_y() {
        let surface = SurfaceSize::new(100, 100);
        let rest = QuadUniform::from_rect(
            DrawRect {
                x: 40,
                y: 40,
                width: 20,
                height: 20,
            },
            surface,
        );
        let shifted = QuadUniform::from_rect(
            DrawRect {
                x: 40,
                y: 42,
                width: 20,
                height: 20,
            },
            surface,
        );
        assert!(shifted.rect[1] < rest.rect[1]);
        assert!(shifted.rect[3] < rest.rect[3]);
        assert_eq!(shifted.rect[0], rest.rect[0]);
    }
}
