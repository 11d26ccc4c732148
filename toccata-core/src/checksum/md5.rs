// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;

/// Per-round left-rotation amounts (RFC 1321).
const S: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, // round 1
    5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, // round 2
    4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, // round 3
    6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, // round 4
];

/// Per-step additive constants, `K[i] = floor(2^32 * abs(sin(i + 1)))`.
const K: [u32; 64] = [
    0xd76a_a478, 0xe8c7_b756, 0x2420_70db, 0xc1bd_ceee, 0xf57c_0faf, 0x4787_c62a, 0xa830_4613,
    0xfd46_9501, 0x6980_98d8, 0x8b44_f7af, 0xffff_5bb1, 0x895c_d7be, 0x6b90_1122, 0xfd98_7193,
    0xa679_438e, 0x49b4_0821, 0xf61e_2562, 0xc040_b340, 0x265e_5a51, 0xe9b6_c7aa, 0xd62f_105d,
    0x0244_1453, 0xd8a1_e681, 0xe7d3_fbc8, 0x21e1_cde6, 0xc337_07d6, 0xf4d5_0d87, 0x455a_14ed,
    0xa9e3_e905, 0xfcef_a3f8, 0x676f_02d9, 0x8d2a_4c8a, 0xfffa_3942, 0x8771_f681, 0x6d9d_6122,
    0xfde5_380c, 0xa4be_ea44, 0x4bde_cfa9, 0xf6bb_4b60, 0xbebf_bc70, 0x289b_7ec6, 0xeaa1_27fa,
    0xd4ef_3085, 0x0488_1d05, 0xd9d4_d039, 0xe6db_99e5, 0x1fa2_7cf8, 0xc4ac_5665, 0xf429_2244,
    0x432a_ff97, 0xab94_23a7, 0xfc93_a039, 0x655b_59c3, 0x8f0c_cc92, 0xffef_f47d, 0x8584_5dd1,
    0x6fa8_7e4f, 0xfe2c_e6e0, 0xa301_4314, 0x4e08_11a1, 0xf753_7e82, 0xbd3a_f235, 0x2ad7_d2bb,
    0xeb86_d391,
];

fn transform(state: &mut [u32; 4], block: &[u8]) {
    // Assert to hopefully force the compiler to elide bounds checks on block.
    assert!(block.len() == 64);

    let mut m = [0u32; 16];

    for (word, bytes) in m.iter_mut().zip(block.chunks_exact(4)) {
        // Input bytes are considered little-endian for MD5.
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let mut a = state[0];
    let mut b = state[1];
    let mut c = state[2];
    let mut d = state[3];

    for i in 0..64 {
        let (f, g) = match i {
            0..=15 => (d ^ (b & (c ^ d)), i),
            16..=31 => (c ^ (d & (b ^ c)), (5 * i + 1) & 15),
            32..=47 => (b ^ c ^ d, (3 * i + 5) & 15),
            _ => (c ^ (b | !d), (7 * i) & 15),
        };

        let t = d;
        d = c;
        c = b;
        b = b.wrapping_add(
            a.wrapping_add(f).wrapping_add(K[i]).wrapping_add(m[g]).rotate_left(S[i]),
        );
        a = t;
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}

/// `Md5` implements the MD5 message-digest algorithm (RFC 1321).
#[derive(Clone)]
pub struct Md5 {
    state: [u32; 4],
    block: [u8; 64],
    /// Total number of message bytes processed, including those pending in `block`.
    len: u64,
}

impl Default for Md5 {
    fn default() -> Self {
        Md5 { state: [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476], block: [0u8; 64], len: 0 }
    }
}

impl Md5 {
    pub fn new() -> Self {
        Default::default()
    }

    /// Process a buffer of message bytes.
    pub fn update(&mut self, mut buf: &[u8]) {
        let fill = (self.len & 63) as usize;
        self.len += buf.len() as u64;

        // Complete a partially filled block first.
        if fill > 0 {
            let len = cmp::min(64 - fill, buf.len());
            self.block[fill..fill + len].copy_from_slice(&buf[..len]);
            buf = &buf[len..];

            if fill + len < 64 {
                return;
            }

            let block = self.block;
            transform(&mut self.state, &block);
        }

        let mut chunks = buf.chunks_exact(64);

        for block in &mut chunks {
            transform(&mut self.state, block);
        }

        let rem = chunks.remainder();
        self.block[..rem.len()].copy_from_slice(rem);
    }

    /// Consume the hasher and compute the final digest.
    pub fn finalize(mut self) -> [u8; 16] {
        let bit_len = self.len.wrapping_mul(8);
        let fill = (self.len & 63) as usize;

        // Pad with a single 1-bit, zeros, then the 64-bit little-endian message bit length.
        let mut pad = [0u8; 72];
        pad[0] = 0x80;

        let pad_len = if fill < 56 { 56 - fill } else { 120 - fill };
        pad[pad_len..pad_len + 8].copy_from_slice(&bit_len.to_le_bytes());

        self.update(&pad[..pad_len + 8]);
        debug_assert!(self.len & 63 == 0);

        let mut digest = [0u8; 16];
        for (bytes, word) in digest.chunks_exact_mut(4).zip(self.state.iter()) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::Md5;

    fn md5(msg: &[u8]) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(msg);
        hasher.finalize()
    }

    #[test]
    fn verify_rfc1321_vectors() {
        assert_eq!(
            md5(b""),
            [
                0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec,
                0xf8, 0x42, 0x7e
            ]
        );
        assert_eq!(
            md5(b"abc"),
            [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28,
                0xe1, 0x7f, 0x72
            ]
        );
        assert_eq!(
            md5(b"message digest"),
            [
                0xf9, 0x6b, 0x69, 0x7d, 0x7c, 0xb7, 0x93, 0x8d, 0x52, 0x5a, 0x2f, 0x31, 0xaa,
                0xf1, 0x61, 0xd0
            ]
        );
    }

    #[test]
    fn verify_split_updates() {
        let msg = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

        let mut split = Md5::new();
        split.update(&msg[..7]);
        split.update(&msg[7..40]);
        split.update(&msg[40..]);

        assert_eq!(split.finalize(), md5(msg));
    }
}
