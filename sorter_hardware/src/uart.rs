//! Serial link to the upstream classifier (rppal UART).

use rppal::uart::{Parity, Uart};
use sorter_traits::CategoryLink;
use std::collections::VecDeque;
use std::time::Duration;

use crate::codec::CodeDecoder;
use crate::error::{HwError, Result};

const READ_CHUNK: usize = 32;

pub struct UartLink {
    uart: Uart,
    decoder: CodeDecoder,
    codes: VecDeque<u8>,
}

impl UartLink {
    pub fn open(device: &str, baud: u32) -> Result<Self> {
        let mut uart = Uart::with_path(device, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Uart(format!("open {device}: {e}")))?;
        // min_length 0 with zero timeout: read() returns whatever is buffered.
        uart.set_read_mode(0, Duration::ZERO)
            .map_err(|e| HwError::Uart(format!("read mode: {e}")))?;
        tracing::info!(device, baud, "category link open");
        Ok(Self {
            uart,
            decoder: CodeDecoder::new(),
            codes: VecDeque::new(),
        })
    }

    fn fill(&mut self) -> Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        let n = self.uart.read(&mut buf).map_err(|e| uart_err("read", e))?;
        self.decoder.decode_chunk(&buf[..n], &mut self.codes);
        Ok(())
    }
}

fn uart_err(what: &str, e: rppal::uart::Error) -> HwError {
    match e {
        rppal::uart::Error::Io(io) => HwError::from_link_io(io),
        other => HwError::Uart(format!("{what}: {other}")),
    }
}

impl CategoryLink for UartLink {
    fn try_recv(&mut self) -> std::result::Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        if self.codes.is_empty() {
            self.fill()?;
        }
        Ok(self.codes.pop_front())
    }

    fn announce_ready(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.uart
            .write(b"ok\n")
            .map_err(|e| uart_err("write", e))?;
        Ok(())
    }
}
