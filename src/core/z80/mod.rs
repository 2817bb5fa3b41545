//! Controle do Z80, o processador de som secundário.
//! O 68000 e o Z80 dividem o barramento; enquanto o 68000 detém o
//! barramento o Z80 fica parado.

pub mod bus;
pub mod control;

// Re-exportações para facilitar o uso
pub use bus::{AcquireMode, BusArbiter, BusGuard, BusOwner};
pub use control::{Z80Control, Z80Error};

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Bit de linha nas portas de barramento e reset do Z80
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Z80Line: u16 {
        /// Escrita: pede o barramento / libera o reset.
        /// Leitura da porta de barramento: Z80 ainda é o dono.
        const ACTIVE = 0x0100;
    }
}

/// Erros de protocolo do barramento
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("Z80 bus is already held by the 68000")]
    AlreadyOwned,
    #[error("Z80 bus released without being held")]
    NotOwned,
}
