//! Renderer setup against a real adapter. Skipped when none is available.

use voxbox_core::Point;
use voxbox_rendering::{View, ViewConfig, ViewRenderer, DEPTH_FORMAT};
use voxbox_shared::Mat4;

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
}

#[test]
fn test_renderer_draws_visible_groups() {
    let Some((device, queue)) = device() else {
        eprintln!("no wgpu adapter, skipping");
        return;
    };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    let mut renderer = ViewRenderer::new(&device, format).unwrap();

    let mut view = View::new(ViewConfig {
        size: [4, 4, 4],
        ..ViewConfig::default()
    })
    .unwrap();
    view.set(Point::new(1, 1, 1), 3);
    view.build_buffers(&Mat4::IDENTITY, &Mat4::IDENTITY);

    renderer.upload_palettes(&queue, view.palette_image());
    renderer.prepare(&device, &queue, &view);
    assert_eq!(renderer.draw_count(), 6);

    let size = wgpu::Extent3d {
        width: 16,
        height: 16,
        depth_or_array_layers: 1,
    };
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: None,
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: None,
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        renderer.draw(&mut pass);
    }
    queue.submit(Some(encoder.finish()));
}
