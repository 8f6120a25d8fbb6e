//! Built-in colour data for the legacy numeric material ids.

use crate::table::Rgb;

pub const AIR: Rgb = [20, 40, 90];
pub const UNKNOWN: Rgb = [220, 150, 220];

/// Ids that are looked through when searching a column for its visible top.
pub const TRANSPARENT_IDS: &[u16] = &[0, 20, 95, 102, 160, 65, 66, 27, 28, 50, 76, 63, 68, 323];

/// How a material id resolves to a colour.
#[derive(Clone, Copy, Debug)]
pub enum Entry {
    Fixed(Rgb),
    /// `table[variant & mask]`, or `fallback` when the index is past the table.
    ByVariant {
        mask: u8,
        table: &'static [Rgb],
        fallback: Rgb,
    },
}

impl Entry {
    #[inline]
    pub fn resolve(&self, variant: u8) -> Rgb {
        match *self {
            Entry::Fixed(rgb) => rgb,
            Entry::ByVariant {
                mask,
                table,
                fallback,
            } => table
                .get((variant & mask) as usize)
                .copied()
                .unwrap_or(fallback),
        }
    }
}

pub const DYED: [Rgb; 16] = [
    [255, 255, 255],
    [255, 140, 40],
    [230, 70, 230],
    [100, 170, 255],
    [255, 230, 35],
    [100, 230, 50],
    [255, 160, 190],
    [60, 60, 65],
    [165, 165, 165],
    [50, 160, 175],
    [140, 50, 220],
    [50, 60, 200],
    [130, 85, 50],
    [75, 125, 40],
    [200, 55, 55],
    [20, 20, 25],
];

pub const TERRACOTTA: [Rgb; 16] = [
    [235, 210, 195],
    [195, 105, 40],
    [180, 85, 140],
    [125, 120, 170],
    [220, 175, 50],
    [110, 145, 50],
    [185, 95, 95],
    [60, 50, 45],
    [165, 135, 125],
    [95, 115, 115],
    [135, 75, 100],
    [85, 70, 105],
    [95, 65, 40],
    [85, 100, 50],
    [175, 70, 60],
    [45, 40, 40],
];

pub const CONCRETE: [Rgb; 16] = [
    [240, 245, 245],
    [255, 110, 5],
    [205, 45, 195],
    [35, 155, 245],
    [255, 210, 20],
    [95, 205, 25],
    [250, 105, 165],
    [50, 50, 55],
    [130, 130, 125],
    [20, 145, 155],
    [110, 25, 195],
    [40, 45, 175],
    [110, 70, 35],
    [75, 110, 35],
    [180, 35, 35],
    [10, 10, 15],
];

pub const CONCRETE_POWDER: [Rgb; 16] = [
    [248, 248, 248],
    [255, 145, 40],
    [215, 95, 205],
    [80, 190, 250],
    [255, 225, 50],
    [130, 220, 50],
    [255, 155, 195],
    [80, 80, 85],
    [180, 180, 175],
    [50, 175, 180],
    [150, 70, 215],
    [75, 80, 200],
    [150, 105, 65],
    [115, 140, 55],
    [200, 70, 70],
    [40, 40, 45],
];

const STONE: [Rgb; 7] = [
    [128, 128, 128],
    [190, 100, 90],
    [210, 130, 120],
    [230, 230, 240],
    [245, 245, 250],
    [70, 75, 80],
    [90, 95, 100],
];

const STONE_BRICKS: [Rgb; 4] = [[120, 120, 125], [80, 120, 85], [90, 90, 90], [150, 150, 155]];

const DIRT: [Rgb; 3] = [[170, 120, 75], [110, 70, 40], [75, 55, 30]];

const SAND: [Rgb; 2] = [[245, 230, 170], [210, 100, 35]];

const PLANKS: [Rgb; 6] = [
    [195, 160, 100],
    [70, 50, 30],
    [245, 235, 190],
    [190, 130, 80],
    [215, 100, 35],
    [45, 30, 15],
];

const LOGS: [Rgb; 4] = [[125, 95, 55], [40, 30, 20], [250, 245, 230], [90, 70, 35]];

const LEAVES: [Rgb; 4] = [[55, 180, 45], [35, 80, 50], [110, 160, 60], [30, 170, 25]];

const SANDSTONE: [Rgb; 3] = [[225, 210, 155], [235, 220, 165], [245, 230, 180]];

const FLOWERS: [Rgb; 9] = [
    [245, 35, 30],
    [45, 185, 250],
    [245, 110, 245],
    [255, 255, 255],
    [245, 45, 35],
    [255, 165, 40],
    [255, 255, 255],
    [255, 150, 210],
    [255, 255, 230],
];

const TALL_FLOWERS: [Rgb; 6] = [
    [255, 250, 65],
    [230, 130, 245],
    [85, 190, 50],
    [60, 140, 40],
    [245, 45, 85],
    [255, 140, 210],
];

const SLABS: [Rgb; 8] = [
    [180, 180, 185],
    [230, 215, 165],
    [180, 180, 185],
    [100, 100, 100],
    [190, 100, 70],
    [125, 125, 130],
    [45, 25, 35],
    [250, 245, 240],
];

const PRISMARINE: [Rgb; 3] = [[95, 200, 190], [70, 145, 130], [50, 90, 85]];

const fn by(table: &'static [Rgb], fallback: Rgb) -> Entry {
    Entry::ByVariant {
        mask: 0xFF,
        table,
        fallback,
    }
}

const fn masked(mask: u8, table: &'static [Rgb], fallback: Rgb) -> Entry {
    Entry::ByVariant {
        mask,
        table,
        fallback,
    }
}

/// Variant-dependent materials.
pub const VARIANT_ENTRIES: &[(u16, Entry)] = &[
    (1, by(&STONE, STONE[0])),
    (98, by(&STONE_BRICKS, STONE_BRICKS[0])),
    (3, by(&DIRT, DIRT[0])),
    (12, by(&SAND, SAND[0])),
    (5, by(&PLANKS, PLANKS[0])),
    (17, masked(3, &LOGS, LOGS[0])),
    (162, by(&[[175, 115, 70]], [35, 25, 15])),
    (18, masked(3, &LEAVES, LEAVES[0])),
    (161, by(&[[50, 145, 35]], [45, 110, 40])),
    (24, by(&SANDSTONE, SANDSTONE[0])),
    (155, by(&[[255, 250, 245], [250, 245, 240]], [255, 250, 245])),
    (19, by(&[[230, 230, 100], [195, 180, 85]], [230, 230, 100])),
    (35, by(&DYED, DYED[0])),
    (95, by(&DYED, DYED[0])),
    (171, by(&DYED, DYED[0])),
    (31, by(&[[180, 165, 110], [70, 195, 50]], [180, 165, 110])),
    (38, by(&FLOWERS, [225, 70, 70])),
    (175, masked(7, &TALL_FLOWERS, [90, 180, 45])),
    (43, masked(7, &SLABS, SLABS[0])),
    (44, masked(7, &SLABS, SLABS[0])),
    (168, by(&PRISMARINE, PRISMARINE[0])),
    (159, by(&TERRACOTTA, [185, 115, 85])),
    (236, by(&CONCRETE, CONCRETE[0])),
    (237, by(&CONCRETE_POWDER, CONCRETE_POWDER[0])),
];

/// Shulker boxes 219..=234 take the dyed colour at `id - 219`.
pub const SHULKER_FIRST: u16 = 219;

/// Materials whose colour ignores the variant.
pub const FIXED_ENTRIES: &[(u16, Rgb)] = &[
    (0, AIR),
    // stone family
    (4, [95, 95, 95]),
    (48, [75, 110, 80]),
    // terrain
    (2, [70, 200, 40]),
    (13, [160, 155, 150]),
    (82, [175, 175, 195]),
    // liquids and ice
    (8, [25, 85, 255]),
    (9, [25, 85, 255]),
    (10, [255, 90, 0]),
    (11, [255, 90, 0]),
    (79, [140, 200, 255]),
    (174, [120, 180, 250]),
    // ores
    (14, [180, 165, 50]),
    (15, [170, 140, 120]),
    (16, [55, 55, 55]),
    (21, [50, 75, 180]),
    (56, [80, 230, 240]),
    (73, [175, 70, 70]),
    (74, [175, 70, 70]),
    (129, [70, 215, 130]),
    (153, [165, 135, 125]),
    // mineral blocks
    (22, [30, 50, 210]),
    (41, [255, 235, 55]),
    (42, [235, 235, 240]),
    (57, [85, 250, 255]),
    (133, [55, 250, 115]),
    (152, [240, 35, 25]),
    (173, [15, 15, 20]),
    // nether
    (87, [150, 55, 55]),
    (88, [75, 55, 45]),
    (89, [255, 245, 140]),
    (112, [45, 25, 35]),
    (213, [240, 110, 30]),
    (214, [140, 55, 55]),
    (215, [110, 35, 40]),
    // end
    (121, [250, 255, 185]),
    (206, [240, 245, 195]),
    (201, [190, 145, 200]),
    (202, [190, 145, 200]),
    (203, [190, 145, 200]),
    // building
    (7, [50, 50, 55]),
    (45, [185, 95, 65]),
    (49, [15, 10, 25]),
    (179, [210, 115, 55]),
    // decorative
    (20, [210, 245, 255]),
    (47, [175, 140, 90]),
    (86, [240, 150, 20]),
    (91, [250, 165, 30]),
    (103, [150, 225, 55]),
    (170, [215, 195, 60]),
    (216, [250, 250, 230]),
    // plants
    (32, [165, 135, 80]),
    (37, [255, 250, 55]),
    (39, [185, 150, 115]),
    (40, [245, 45, 40]),
    (81, [15, 165, 40]),
    (83, [120, 210, 95]),
    (106, [45, 160, 35]),
    (111, [30, 150, 35]),
    // redstone
    (55, [200, 0, 0]),
    (50, [255, 240, 110]),
    (51, [255, 140, 25]),
    (123, [150, 90, 50]),
    (124, [150, 90, 50]),
    // functional
    (23, [100, 100, 105]),
    (25, [130, 90, 60]),
    (46, [220, 60, 50]),
    (52, [25, 45, 75]),
    (54, [175, 135, 65]),
    (146, [175, 135, 65]),
    (58, [160, 120, 65]),
    (61, [115, 115, 120]),
    (62, [115, 115, 120]),
    (84, [135, 95, 60]),
    (116, [65, 50, 90]),
    (130, [35, 55, 60]),
    (138, [90, 250, 240]),
    (145, [60, 60, 65]),
    (154, [105, 105, 110]),
    (169, [200, 240, 230]),
    (235, [245, 220, 190]),
    // misc
    (78, [255, 255, 255]),
    (80, [250, 255, 255]),
    (90, [120, 50, 200]),
    (110, [160, 125, 145]),
    (165, [80, 235, 60]),
    (172, [185, 110, 75]),
    (208, [190, 175, 140]),
    // stairs
    (53, [195, 160, 100]),
    (67, [95, 95, 95]),
    (108, [185, 95, 65]),
    (109, [120, 120, 125]),
    (114, [45, 25, 35]),
    (128, [225, 210, 155]),
    (134, [70, 50, 30]),
    (135, [245, 235, 190]),
    (136, [190, 130, 80]),
    (156, [255, 250, 245]),
    (163, [215, 100, 35]),
    (164, [45, 30, 15]),
    (180, [210, 115, 55]),
    // fences and doors
    (85, [195, 160, 100]),
    (113, [45, 25, 35]),
    (188, [70, 50, 30]),
    (189, [245, 235, 190]),
    (190, [190, 130, 80]),
    (191, [45, 30, 15]),
    (192, [215, 100, 35]),
    (64, [195, 160, 100]),
    (71, [200, 200, 205]),
    (193, [70, 50, 30]),
    (194, [245, 235, 190]),
    (195, [190, 130, 80]),
    (196, [215, 100, 35]),
    (197, [45, 30, 15]),
    (218, [165, 210, 180]),
    // crops
    (59, [180, 210, 65]),
    (60, [115, 80, 50]),
    (115, [190, 20, 20]),
    (127, [185, 135, 75]),
    (141, [50, 185, 40]),
    (142, [90, 195, 60]),
    (207, [155, 125, 65]),
];
