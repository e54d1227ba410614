//! `From` implementations bridging `sorter_config` types to `sorter_core` types.

use crate::config::LineCfg;
use crate::runner::RunParams;

impl From<&sorter_config::Config> for LineCfg {
    fn from(c: &sorter_config::Config) -> Self {
        Self {
            quantization_pulses: c.line.quantization_pulses,
            pulse_width_ms: c.line.pulse_width_ms,
            offsets: [c.offsets.a, c.offsets.b, c.offsets.c],
            handshake: c.link.handshake,
        }
    }
}

impl From<&sorter_config::RunnerCfg> for RunParams {
    fn from(c: &sorter_config::RunnerCfg) -> Self {
        Self {
            tick_period_us: c.tick_us,
            max_ticks: None,
        }
    }
}
