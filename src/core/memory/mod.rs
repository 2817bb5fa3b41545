//! Acesso às portas de hardware do Genesis/Mega Drive.
//! Define a interface de escrita/leitura nas portas mapeadas em memória
//! (VDP e controle do Z80) e os backends real e de teste.

pub mod map;
pub mod mock;
pub mod port;

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "m68k", feature = "mmio"))] {
        pub mod mmio;
        pub use mmio::MmioPort;
    }
}

// Re-exportações para facilitar o uso
pub use map::MemRegion;
pub use mock::{PortAccess, RecordingPort};
pub use port::RegisterPort;

/// Máscara de endereço válido para o barramento Genesis (24-bit = 16 MB)
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Porta de dados do VDP
pub const VDP_PORT_DATA: u32 = 0xC0_0000;

/// Porta de controle do VDP (escrita de comandos / leitura de status)
pub const VDP_PORT_CTRL: u32 = 0xC0_0004;

/// Contador HV do VDP
pub const VDP_PORT_HV_COUNTER: u32 = 0xC0_0008;

/// Porta de requisição do barramento do Z80
pub const Z80_BUS_PORT: u32 = 0xA1_1100;

/// Porta da linha de reset do Z80
pub const Z80_RESET_PORT: u32 = 0xA1_1200;

/// Início da RAM do Z80 vista pelo 68000
pub const Z80_RAM_ADDRESS: u32 = 0xA0_0000;

/// Tamanho da RAM do Z80 (8KB)
pub const Z80_RAM_SIZE: usize = 0x2000;
