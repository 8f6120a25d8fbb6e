use fastnoise_lite::{FastNoiseLite, NoiseType};
use voxmap_palette::Material;
use voxmap_world::memory::CellData;
use voxmap_world::{BlockPos, CELL_SIZE, Cell, MemoryWorld};

const SEA_LEVEL: i32 = 62;
const BASE_HEIGHT: f32 = 64.0;
const AMPLITUDE: f32 = 28.0;
const FREQUENCY: f32 = 0.008;

const GRASS: Material = Material::plain(2);
const DIRT: Material = Material::plain(3);
const STONE: Material = Material::plain(1);
const SAND: Material = Material::plain(12);
const WATER: Material = Material::plain(9);
const SNOW: Material = Material::plain(80);

/// Procedural island terrain: cells within `radius` cells of the origin
/// exist, everything further out is ungenerated.
pub fn world(seed: i32, radius: i32) -> MemoryWorld {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(FREQUENCY));
    let spawn_y = surface(&noise, 0, 0).max(SEA_LEVEL) + 1;

    let world = MemoryWorld::with_generator(move |cell: Cell| {
        if cell.cx.abs() > radius || cell.cz.abs() > radius {
            return None;
        }
        Some(generate(&noise, cell))
    });
    world.set_spawn(BlockPos::new(0, spawn_y, 0));
    world
}

fn surface(noise: &FastNoiseLite, wx: i32, wz: i32) -> i32 {
    let n = noise.get_noise_2d(wx as f32, wz as f32);
    (BASE_HEIGHT + n * AMPLITUDE).round() as i32
}

fn generate(noise: &FastNoiseLite, cell: Cell) -> CellData {
    let (ox, oz) = cell.origin();
    let mut data = CellData::default();
    for lz in 0..CELL_SIZE as u8 {
        for lx in 0..CELL_SIZE as u8 {
            let top = surface(noise, ox + i32::from(lx), oz + i32::from(lz));
            data.fill_column(lx, lz, STONE, top - 4);
            for y in (top - 3).max(0)..top {
                data.set_block(lx, y, lz, DIRT);
            }
            let cap = match top {
                t if t <= SEA_LEVEL + 1 => SAND,
                t if t > 84 => SNOW,
                _ => GRASS,
            };
            data.set_block(lx, top, lz, cap);
            for y in (top + 1)..=SEA_LEVEL {
                data.set_block(lx, y, lz, WATER);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmap_world::WorldStore;

    #[test]
    fn cells_outside_the_radius_are_absent() {
        let w = world(7, 2);
        assert!(w.cell_exists(Cell::new(0, 0)).unwrap());
        assert!(w.cell_exists(Cell::new(-2, 2)).unwrap());
        assert!(!w.cell_exists(Cell::new(3, 0)).unwrap());
    }

    #[test]
    fn columns_have_a_surface_and_water_below_sea_level() {
        let w = world(7, 1);
        let cell = Cell::new(0, 0);
        assert!(w.cell_exists(cell).unwrap());
        for lx in [0u8, 5, 15] {
            let top = w.highest_opaque_y(cell, lx, 3).unwrap();
            assert!(top >= SEA_LEVEL);
            let m = w.material_at(cell, lx, top, 3).unwrap();
            assert_ne!(m, Material::AIR);
            if top == SEA_LEVEL {
                assert!(m == WATER || m == SAND);
            }
        }
    }
}
