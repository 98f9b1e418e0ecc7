use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use product_viewer::camera::PerspectiveCamera;
use product_viewer::config::{CameraConfig, ControlsConfig};
use product_viewer::controller::{CameraController, PointerButton, PointerEvent, Region};
use product_viewer::math::AABB;
use product_viewer::model::{LoadedAsset, MeshData, ModelNode, Vertex};
use product_viewer::normalizer::ModelNormalizer;

/// Flat grid mesh with `count` vertices spread over a 10x10 patch
fn grid_mesh(count: usize) -> MeshData {
    let side = (count as f32).sqrt().ceil() as usize;
    let vertices: Vec<Vertex> = (0..count)
        .map(|i| {
            let (x, z) = ((i % side) as f32, (i / side) as f32);
            Vertex {
                position: [x * 10.0 / side as f32, (x * 0.37).sin(), z * 10.0 / side as f32],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 0.0],
            }
        })
        .collect();
    let indices = (0..(count - count % 3) as u32).collect();

    MeshData {
        name: None,
        vertices,
        indices,
        material: 0,
    }
}

/// Benchmark: bounding box of loaded geometry at increasing vertex counts
fn bench_model_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_bounds");

    for count in [1_000, 10_000, 100_000].iter() {
        let node = ModelNode {
            meshes: vec![grid_mesh(*count)],
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("vertices", count), count, |b, _| {
            b.iter(|| black_box(node.local_bounds()))
        });
    }

    group.finish();
}

/// Benchmark: centring a loaded model
fn bench_normalize(c: &mut Criterion) {
    let normalizer = ModelNormalizer::default();
    let asset = LoadedAsset::new(ModelNode {
        meshes: vec![grid_mesh(10_000)],
        ..Default::default()
    });

    c.bench_function("normalize_and_world_bounds", |b| {
        b.iter(|| {
            let mut node = asset.node.clone();
            normalizer.apply(&mut node, black_box(&asset.bounds));
            black_box(node.world_bounds())
        })
    });

    let bounds = AABB::new(Vec3::splat(-3.0), Vec3::new(5.0, 2.0, 9.0));
    c.bench_function("normalize_bounds_only", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&bounds))))
    });
}

/// Benchmark: one orbit-control update per frame while dragging
fn bench_controller_update(c: &mut Criterion) {
    let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
    let mut controller = CameraController::new(
        &ControlsConfig::default(),
        &camera,
        Region::new(0.0, 0.0, 500.0, 500.0),
    );
    let mut input = product_viewer::input::ListenerRegistry::default();
    controller.bind(&mut input);
    controller.handle_event(&PointerEvent::Down {
        pointer: 1,
        button: PointerButton::Primary,
        position: Vec2::new(250.0, 250.0),
    });

    let mut step = 0u32;
    c.bench_function("controller_drag_frame", |b| {
        b.iter(|| {
            step = step.wrapping_add(1);
            let x = 250.0 + (step % 64) as f32;
            controller.handle_event(&PointerEvent::Move {
                pointer: 1,
                position: Vec2::new(x, 250.0),
            });
            controller.update(black_box(1.0 / 60.0), &mut camera);
            black_box(camera.view_projection())
        })
    });
}

criterion_group!(
    benches,
    bench_model_bounds,
    bench_normalize,
    bench_controller_update
);
criterion_main!(benches);
