//! Seeded Shape Generator.
//!
//! Maps a week identifier to a stable pair of decorative shapes (a leaf and
//! a flower for the weekly plant). Nothing is persisted: the same string
//! always yields the same draws, on every platform, so the decoration is
//! recomputed instead of stored.
//!
//! The string is folded into a 32-bit seed with a `hash * 31 + unit` rolling
//! hash over UTF-16 code units, and the seed drives a mulberry32 generator.

use rand::RngCore;
use serde::Serialize;

/// Bitmap rows, `1` = filled pixel.
pub type PlantShape = &'static [&'static [u8]];

pub const LEAF_SHAPES: [PlantShape; 5] = [
    // oval
    &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]],
    // pointy
    &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0], &[0, 1, 0]],
    // three-pronged
    &[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]],
    // heart
    &[&[1, 0, 1], &[1, 1, 1], &[0, 1, 0]],
    // arrow
    &[&[0, 1, 0], &[1, 1, 1], &[1, 0, 1]],
];

pub const FLOWER_SHAPES: [PlantShape; 5] = [
    // five petals
    &[
        &[0, 1, 0, 1, 0],
        &[1, 1, 1, 1, 1],
        &[0, 1, 1, 1, 0],
        &[1, 1, 1, 1, 1],
        &[0, 1, 0, 1, 0],
    ],
    // tulip
    &[&[1, 0, 1], &[1, 1, 1], &[1, 1, 1], &[0, 1, 0]],
    // rose bud
    &[
        &[0, 1, 1, 1, 0],
        &[1, 1, 1, 1, 1],
        &[1, 1, 1, 1, 1],
        &[0, 1, 1, 1, 0],
    ],
    // sunflower
    &[
        &[1, 1, 0, 1, 1],
        &[1, 1, 1, 1, 1],
        &[0, 1, 1, 1, 0],
        &[1, 1, 1, 1, 1],
        &[1, 1, 0, 1, 1],
    ],
    // daisy
    &[
        &[1, 0, 1, 0, 1],
        &[0, 1, 1, 1, 0],
        &[1, 1, 1, 1, 1],
        &[0, 1, 1, 1, 0],
        &[1, 0, 1, 0, 1],
    ],
];

/// Polynomial rolling hash, wrapped to 32 bits.
pub fn seed_from(week_id: &str) -> i32 {
    week_id
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// mulberry32: tiny, fast, deterministic. Not for anything secret.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: i32) -> Self {
        Self {
            state: seed as u32,
        }
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        unit_draw(self)
    }
}

/// `next_u32() / 2^32`, the draw every shape pick is made from.
fn unit_draw<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.next_u32()) / 4_294_967_296.0
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.step());
        let high = u64::from(self.step());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapeIndices {
    pub leaf: usize,
    pub flower: usize,
}

/// Leaf first, then flower; the draw order is part of the contract.
pub fn generate_shape_indices(week_id: &str) -> ShapeIndices {
    pick_indices(&mut Mulberry32::new(seed_from(week_id)))
}

fn pick_indices<R: RngCore + ?Sized>(rng: &mut R) -> ShapeIndices {
    let leaf = pick(unit_draw(rng), LEAF_SHAPES.len());
    let flower = pick(unit_draw(rng), FLOWER_SHAPES.len());
    ShapeIndices { leaf, flower }
}

fn pick(unit: f64, len: usize) -> usize {
    ((unit * len as f64).floor() as usize).min(len - 1)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlantStyle {
    pub leaf_shape: PlantShape,
    pub flower_shape: PlantShape,
}

impl From<ShapeIndices> for PlantStyle {
    fn from(indices: ShapeIndices) -> Self {
        Self {
            leaf_shape: LEAF_SHAPES[indices.leaf],
            flower_shape: FLOWER_SHAPES[indices.flower],
        }
    }
}

pub fn generate_plant_style(week_id: &str) -> PlantStyle {
    generate_shape_indices(week_id).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_matches_reference_values() {
        assert_eq!(seed_from(""), 0);
        assert_eq!(seed_from("a"), 97);
        assert_eq!(seed_from("2024-01-07"), -613_341_626);
    }

    #[test]
    fn raw_draws_are_stable() {
        let mut rng = Mulberry32::new(seed_from("2024-01-07"));
        assert_eq!(rng.next_u32(), 2_903_154_240);
        assert_eq!(rng.next_u32(), 2_033_510_327);

        let mut rng = Mulberry32::new(0);
        assert_eq!(rng.next_u32(), 1_144_304_738);
        assert_eq!(rng.next_u32(), 1_416_247);
    }

    #[test]
    fn indices_for_known_weeks() {
        assert_eq!(
            generate_shape_indices("2024-01-07"),
            ShapeIndices { leaf: 3, flower: 2 }
        );
        assert_eq!(
            generate_shape_indices("2024-01-14"),
            ShapeIndices { leaf: 2, flower: 3 }
        );
        assert_eq!(
            generate_shape_indices("2024-01-21"),
            ShapeIndices { leaf: 3, flower: 4 }
        );
    }

    #[test]
    fn picks_come_from_next_u32_draws() {
        // 2903154240 / 2^32 * 5 = 3.38 and 2033510327 / 2^32 * 5 = 2.37
        let mut rng = Mulberry32::new(seed_from("2024-01-07"));
        assert_eq!(pick_indices(&mut rng), ShapeIndices { leaf: 3, flower: 2 });
        let mut expected = Mulberry32::new(seed_from("2024-01-07"));
        expected.next_u32();
        expected.next_u32();
        assert_eq!(rng.next_u32(), expected.next_u32());
    }

    #[test]
    fn same_week_same_indices() {
        assert_eq!(
            generate_shape_indices("2024-01-07"),
            generate_shape_indices("2024-01-07")
        );
    }

    #[test]
    fn indices_stay_in_range() {
        for day in 1..=28 {
            let id = format!("2024-02-{day:02}");
            let idx = generate_shape_indices(&id);
            assert!(idx.leaf < LEAF_SHAPES.len());
            assert!(idx.flower < FLOWER_SHAPES.len());
        }
    }

    #[test]
    fn plant_style_resolves_bitmaps() {
        let style = generate_plant_style("2024-01-07");
        assert_eq!(style.leaf_shape, LEAF_SHAPES[3]);
        assert_eq!(style.flower_shape, FLOWER_SHAPES[2]);
    }

    #[test]
    fn fill_bytes_uses_little_endian_words() {
        let mut a = Mulberry32::new(97);
        let mut b = Mulberry32::new(97);
        let mut buf = [0u8; 6];
        a.fill_bytes(&mut buf);
        let first = b.next_u32().to_le_bytes();
        let second = b.next_u32().to_le_bytes();
        assert_eq!(&buf[..4], &first);
        assert_eq!(&buf[4..], &second[..2]);
    }
}
