/*!
Morton encoding utilities for 2D grid cells.

Interleaves cell column/row bits (Z-order curve) so neighbouring cells get
neighbouring keys. Keys are only ever built, never decoded.
*/

/// Morton encode a cell coordinate into a single u32.
///
/// Bits are interleaved as `...y1x1y0x0`; each axis uses its full 16 bits.
#[inline]
pub fn morton_encode_2d(x: u16, y: u16) -> u32 {
    let mut result = 0u32;

    for i in 0..16 {
        result |= ((x as u32 & (1 << i)) << i) | ((y as u32 & (1 << i)) << (i + 1));
    }

    result
}

/// Morton codes of every cell in the inclusive range `[x1..=x2, y1..=y2]`.
pub fn morton_encode_region_2d(x1: u16, y1: u16, x2: u16, y2: u16) -> Vec<u32> {
    let mut codes = Vec::new();

    for y in y1..=y2 {
        for x in x1..=x2 {
            codes.push(morton_encode_2d(x, y));
        }
    }

    codes
}
