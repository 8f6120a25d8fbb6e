use criterion::{Criterion, black_box, criterion_group, criterion_main};

use voxmap_palette::{Material, PixelColorTable};
use voxmap_raster::{Canvas, Rasterizer, split};
use voxmap_world::memory::CellData;
use voxmap_world::{Cell, MemoryWorld};

fn hilly_world(radius: i32) -> MemoryWorld {
    let world = MemoryWorld::new();
    for cx in -radius..radius {
        for cz in -radius..radius {
            let mut data = CellData::default();
            for lx in 0..16u8 {
                for lz in 0..16u8 {
                    let h = 60 + ((cx * 16 + i32::from(lx)) ^ (cz * 16 + i32::from(lz))) % 12;
                    data.fill_column(lx, lz, Material::plain(1), h.abs());
                    data.set_block(lx, h.abs(), lz, Material::plain(2));
                }
            }
            world.insert_cell(Cell::new(cx, cz), data);
        }
    }
    world
}

fn bench_render_bounded(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_bounded");
    let world = hilly_world(4);
    let palette = PixelColorTable::builtin();
    group.bench_function("8x8_cells", |b| {
        b.iter(|| {
            let out = Rasterizer::new(&world, &palette).render_bounded(0, 0, 64).unwrap();
            black_box(out);
        })
    });
    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let canvas = Canvas::filled(1280, 1280, [25, 50, 100]);
    group.bench_function("grid_10", |b| {
        b.iter(|| black_box(split(&canvas, 10)))
    });
    group.finish();
}

criterion_group!(benches, bench_render_bounded, bench_split);
criterion_main!(benches);
