//! FNV-1 32-bit hashing for path keys.
//!
//! Listing heads hash their directory path; children continue the parent's
//! hash over a separator and their own name, so equal names under
//! different parents land on distinct coarse hashes. Case folding is
//! ASCII-only, matching the case-insensitive key comparison.

const FNV32_BASE: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Case-sensitive FNV-1 hash of `s`.
#[must_use]
pub fn fnv32(s: &str) -> u32 {
    fold(FNV32_BASE, s.bytes())
}

/// ASCII-case-insensitive FNV-1 hash of `s`.
#[must_use]
pub fn fnv32_ci(s: &str) -> u32 {
    fnv32_ci_seeded(FNV32_BASE, s)
}

/// Continue an ASCII-case-insensitive FNV-1 hash from `seed` over `s`.
#[must_use]
pub fn fnv32_ci_seeded(seed: u32, s: &str) -> u32 {
    fold(seed, s.bytes().map(|b| b.to_ascii_uppercase()))
}

fn fold(seed: u32, bytes: impl Iterator<Item = u8>) -> u32 {
    bytes.fold(seed, |hash, b| hash.wrapping_mul(FNV32_PRIME) ^ u32::from(b))
}
