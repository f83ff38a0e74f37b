//! The variate generator: one step that snapshots the RNG
//! state and fills all seven operand slots consumed by the dispatcher.

use crate::rng::RngService;

/// Index into the 7-slot variate tuple.
pub const SLOT_SELECTOR: usize = 0;
pub const SLOT_A: usize = 1;
pub const SLOT_B: usize = 2;
pub const SLOT_REP: usize = 3;
pub const SLOT_PORT: usize = 4;
pub const SLOT_SRC_ADDR: usize = 5;
pub const SLOT_DST_ADDR: usize = 6;

/// Number of distinct port-I/O instructions the selector can name.
const NUM_INSTRUCTIONS: u64 = 12;

/// Draws a slot-1/slot-2-style operand: a uniform mixture of a flat
/// uniform `u32`, a Fermat-shaped value, and a Mersenne-shaped value,
/// chosen by an independent `uniform_range(0, 2)` draw
fn mixed_operand(rng: &RngService) -> u64 {
    match rng.uniform_range(0, 2) {
        0 => rng.uniform_u32() as u64,
        1 => rng.fermat(),
        _ => rng.mersenne(),
    }
}

/// Fills `variates` (must be exactly 7 slots) and `state` in place, given
/// the RNG to draw from, the caller-owned source/destination scratch
/// buffers, and an optional fixed port list. `ports.is_empty()` is treated
/// the same as `None` — the harness never installs an empty non-`None`
/// port list (see [`crate::error::FuzzerError::EmptyPortList`]).
pub fn generate(
    rng: &RngService,
    ports: Option<&[u32]>,
    src_buf: &mut [u8; 256],
    dst_buf: &mut [u8; 256],
    state: &mut [u8; 8],
    variates: &mut [u64; 7],
) {
    *state = rng.snapshot();

    variates[SLOT_SELECTOR] = rng.uniform_range(0, NUM_INSTRUCTIONS - 1);
    variates[SLOT_A] = mixed_operand(rng);
    variates[SLOT_B] = mixed_operand(rng);
    variates[SLOT_REP] = rng.uniform_range(1, 64);
    variates[SLOT_PORT] = match ports {
        Some(list) if !list.is_empty() => {
            let idx = rng.uniform_range(0, (list.len() - 1) as u64) as usize;
            list[idx] as u64
        }
        _ => rng.uniform_range(0, 0xFFFF),
    };

    rng.random_string(src_buf);
    rng.random_string(dst_buf);
    variates[SLOT_SRC_ADDR] = src_buf.as_mut_ptr() as u64;
    variates[SLOT_DST_ADDR] = dst_buf.as_mut_ptr() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_in_range() {
        let rng = RngService::new(123);
        let mut src = [0u8; 256];
        let mut dst = [0u8; 256];
        let mut state = [0u8; 8];
        let mut variates = [0u64; 7];
        for _ in 0..500 {
            generate(&rng, None, &mut src, &mut dst, &mut state, &mut variates);
            assert!(variates[SLOT_SELECTOR] <= 11);
            assert!(variates[SLOT_REP] >= 1 && variates[SLOT_REP] <= 64);
            assert!(variates[SLOT_PORT] <= 0xFFFF);
        }
    }

    #[test]
    fn port_slot_is_drawn_from_fixed_list() {
        let rng = RngService::new(7);
        let ports = [0x70u32, 0x71, 0x72];
        let mut src = [0u8; 256];
        let mut dst = [0u8; 256];
        let mut state = [0u8; 8];
        let mut variates = [0u64; 7];
        for _ in 0..100 {
            generate(&rng, Some(&ports), &mut src, &mut dst, &mut state, &mut variates);
            assert!(ports.contains(&(variates[SLOT_PORT] as u32)));
        }
    }

    #[test]
    fn address_slots_match_buffer_pointers() {
        let rng = RngService::new(7);
        let mut src = [0u8; 256];
        let mut dst = [0u8; 256];
        let mut state = [0u8; 8];
        let mut variates = [0u64; 7];
        let (src_ptr, dst_ptr) = (src.as_ptr() as u64, dst.as_ptr() as u64);
        generate(&rng, None, &mut src, &mut dst, &mut state, &mut variates);
        assert_eq!(variates[SLOT_SRC_ADDR], src_ptr);
        assert_eq!(variates[SLOT_DST_ADDR], dst_ptr);
    }

    #[test]
    fn same_seed_reproduces_same_variates() {
        let rng_a = RngService::new(0xCAFE);
        let rng_b = RngService::new(0xCAFE);
        let (mut sa, mut da, mut ssa, mut va) = ([0u8; 256], [0u8; 256], [0u8; 8], [0u64; 7]);
        let (mut sb, mut db, mut ssb, mut vb) = ([0u8; 256], [0u8; 256], [0u8; 8], [0u64; 7]);
        generate(&rng_a, None, &mut sa, &mut da, &mut ssa, &mut va);
        generate(&rng_b, None, &mut sb, &mut db, &mut ssb, &mut vb);
        assert_eq!(ssa, ssb);
        for slot in [SLOT_SELECTOR, SLOT_A, SLOT_B, SLOT_REP, SLOT_PORT] {
            assert_eq!(va[slot], vb[slot], "slot {slot} mismatch");
        }
    }
}
