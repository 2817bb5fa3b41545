// Este é o ponto de entrada principal da biblioteca.
//! Camada de hardware do Sega Mega Drive/Genesis: fila e disparo de DMA do
//! VDP e arbitragem do barramento compartilhado com o Z80.

// Módulos principais do projeto.
pub mod core;

// Re-exportações para facilitar o uso.
pub use crate::core::config::HalConfig;
pub use crate::core::memory::{RecordingPort, RegisterPort};
pub use crate::core::system::MegaDrive;
pub use crate::core::vdp::{DmaCommand, DmaEngine, DmaError, DmaQueue, DmaResult, DmaTarget};
pub use crate::core::z80::{BusArbiter, BusError, BusGuard, Z80Control, Z80Error};

#[cfg(any(target_arch = "m68k", feature = "mmio"))]
pub use crate::core::memory::MmioPort;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Função conveniente para criar uma nova instância do sistema.
pub fn create_system<P: RegisterPort>(port: P) -> MegaDrive<P> {
    MegaDrive::new(port, HalConfig::default())
}
