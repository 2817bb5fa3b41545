//! Parâmetros de configuração da camada de hardware.
//! Os valores padrão seguem a configuração de boot do console.

/// Tamanho padrão da fila de DMA, em operações
pub const DEFAULT_DMA_QUEUE_CAPACITY: usize = 64;

/// Voltas de espera com a linha de reset do Z80 ativa
pub const DEFAULT_Z80_RESET_DELAY: u16 = 0x20;

/// Configuração do sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalConfig {
    pub dma_queue_capacity: usize,
    pub z80_reset_delay: u16,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            dma_queue_capacity: DEFAULT_DMA_QUEUE_CAPACITY,
            z80_reset_delay: DEFAULT_Z80_RESET_DELAY,
        }
    }
}

impl HalConfig {
    pub fn with_dma_queue_capacity(mut self, capacity: usize) -> Self {
        self.dma_queue_capacity = capacity;
        self
    }

    pub fn with_z80_reset_delay(mut self, delay: u16) -> Self {
        self.z80_reset_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HalConfig::default();
        assert_eq!(config.dma_queue_capacity, 64);
        assert_eq!(config.z80_reset_delay, 0x20);

        let config = config.with_dma_queue_capacity(8).with_z80_reset_delay(0);
        assert_eq!(config.dma_queue_capacity, 8);
        assert_eq!(config.z80_reset_delay, 0);
    }
}
