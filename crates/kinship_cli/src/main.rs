//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kinship_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Tiny probe that exercises core crate wiring without the FFI runtime.
    println!("kinship_core ping={}", kinship_core::ping());
    println!("kinship_core version={}", kinship_core::core_version());
}
