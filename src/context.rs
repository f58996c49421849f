//! The wgpu renderer.
//!
//! [`GpuRenderer`] owns the surface, device and queue plus every GPU resource
//! derived from the scene. Geometry and materials are uploaded lazily the
//! first time a node referencing them is drawn and are keyed by their `Arc`
//! allocation, so the shared torus mesh is uploaded once and drawn with one
//! instanced call.

use std::{collections::HashMap, iter, sync::Arc};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{
        geometry::Geometry,
        material::MatcapMaterial,
        scene_graph::SceneRegistry,
        texture::{self, MatcapImage, Texture},
    },
    error::{Result, SceneError},
    pipelines::matcap::{matcap_layout, mk_matcap_bind_group, mk_matcap_pipeline},
    render::{Batch, Renderer, collect_batches},
};

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
    /// `false` while the bind group still points at the fallback matcap.
    has_matcap: bool,
}

pub struct GpuRenderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    is_surface_configured: bool,
    depth_texture: Texture,
    clear_colour: wgpu::Color,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    matcap_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    meshes: HashMap<usize, GpuMesh>,
    materials: HashMap<usize, GpuMaterial>,
}

impl std::fmt::Debug for GpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuRenderer")
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("meshes", &self.meshes.len())
            .field("materials", &self.materials.len())
            .finish()
    }
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, clear_colour: [f64; 4]) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The matcap shader writes sRGB colours.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let matcap_layout = matcap_layout(&device);
        let pipeline = mk_matcap_pipeline(
            &device,
            config.format,
            &matcap_layout,
            &camera_bind_group_layout,
        );

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let [r, g, b, a] = clear_colour;
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            is_surface_configured: false,
            depth_texture,
            clear_colour: wgpu::Color { r, g, b, a },
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            matcap_layout,
            pipeline,
            meshes: HashMap::new(),
            materials: HashMap::new(),
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn upload_mesh(&self, geometry: &Geometry) -> GpuMesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", geometry.label)),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", geometry.label)),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            instance_buffer: None,
            instance_capacity: 0,
        }
    }

    fn upload_material(&self, material: &MatcapMaterial) -> GpuMaterial {
        let fallback;
        let (image, has_matcap) = match material.matcap() {
            Some(image) => (image, true),
            None => {
                fallback = MatcapImage::fallback();
                (&fallback, false)
            }
        };
        let texture = Texture::from_matcap(&self.device, &self.queue, image);
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| texture::create_default_sampler(&self.device));
        let bind_group = mk_matcap_bind_group(
            &self.device,
            &self.matcap_layout,
            &texture,
            &sampler,
            &material.label,
        );
        GpuMaterial {
            bind_group,
            has_matcap,
        }
    }

    /// Make sure every batch has its mesh, an instance buffer large enough, and a material.
    fn prepare(&mut self, batches: &[Batch<'_>]) {
        for batch in batches {
            let mesh_key = Arc::as_ptr(batch.geometry) as usize;
            if !self.meshes.contains_key(&mesh_key) {
                let mesh = self.upload_mesh(batch.geometry);
                self.meshes.insert(mesh_key, mesh);
            }
            let material_key = Arc::as_ptr(batch.material) as usize;
            let stale = self
                .materials
                .get(&material_key)
                .is_none_or(|gpu| !gpu.has_matcap && batch.material.has_matcap());
            if stale {
                let material = self.upload_material(batch.material);
                self.materials.insert(material_key, material);
            }

            let contents: &[u8] = bytemuck::cast_slice(&batch.instances);
            let Some(mesh) = self.meshes.get_mut(&mesh_key) else {
                continue;
            };
            let fits = mesh.instance_capacity >= batch.instances.len();
            match mesh.instance_buffer.as_ref().filter(|_| fits) {
                Some(buffer) => self.queue.write_buffer(buffer, 0, contents),
                None => {
                    mesh.instance_buffer = Some(self.device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{} Instance Buffer", batch.geometry.label)),
                            contents,
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        },
                    ));
                    mesh.instance_capacity = batch.instances.len();
                }
            }
        }
    }
}

impl Renderer for GpuRenderer {
    fn render(&mut self, scene: &SceneRegistry, camera: &Camera) -> Result<()> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let batches = collect_batches(scene);
        self.prepare(&batches);

        self.camera_uniform.update_view_proj(camera);
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );

        let output = match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            // Reconfigure the surface if it's lost or outdated
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height);
                return Ok(());
            }
            e => return Err(SceneError::Render(format!("{e:?}"))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
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

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(1, &self.camera_bind_group, &[]);
            for batch in batches.iter() {
                let mesh = self.meshes.get(&(Arc::as_ptr(batch.geometry) as usize));
                let material = self.materials.get(&(Arc::as_ptr(batch.material) as usize));
                let (Some(mesh), Some(material)) = (mesh, material) else {
                    continue;
                };
                let Some(instance_buffer) = &mesh.instance_buffer else {
                    continue;
                };
                if batch.instances.is_empty() {
                    log::warn!("you attempted to render something with zero instances");
                    continue;
                }
                render_pass.set_bind_group(0, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, instance_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_indices, 0, 0..batch.instances.len() as u32);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.is_surface_configured = true;
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                [self.config.width, self.config.height],
                "depth_texture",
            );
        }
    }
}
