//! `CategoryLink` over a crossbeam channel.
//!
//! Lets a reader thread (stdin, a socket, a serial port read with blocking
//! I/O) decode codes on its own and hand them to the control loop, which
//! only ever calls the non-blocking `try_recv`.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use sorter_traits::CategoryLink;

use crate::error::SorterError;

#[derive(Debug)]
pub struct ChannelLink {
    rx: Receiver<u8>,
    ready: Option<Sender<()>>,
    disconnected: bool,
}

impl ChannelLink {
    pub fn new(rx: Receiver<u8>) -> Self {
        Self {
            rx,
            ready: None,
            disconnected: false,
        }
    }

    /// Also forward readiness announcements; a full `ready` channel means a
    /// token is already pending and the announcement is dropped.
    pub fn with_ready(rx: Receiver<u8>, ready: Sender<()>) -> Self {
        Self {
            rx,
            ready: Some(ready),
            disconnected: false,
        }
    }

    /// The sending side has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl CategoryLink for ChannelLink {
    fn try_recv(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.try_recv() {
            Ok(code) => Ok(Some(code)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) if !self.disconnected => {
                // Reported once; afterwards the link is just quiet.
                self.disconnected = true;
                Err(Box::new(SorterError::Link("upstream sender closed".into())))
            }
            Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn announce_ready(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(tx) = &self.ready {
            match tx.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => {
                    self.ready = None;
                    return Err(Box::new(SorterError::Link(
                        "readiness receiver closed".into(),
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    #[test]
    fn delivers_then_reports_disconnect_once() {
        let (tx, rx) = unbounded();
        let mut link = ChannelLink::new(rx);
        tx.send(2).unwrap();
        assert_eq!(link.try_recv().unwrap(), Some(2));
        assert_eq!(link.try_recv().unwrap(), None);
        drop(tx);
        assert!(link.try_recv().is_err());
        assert!(link.is_disconnected());
        assert_eq!(link.try_recv().unwrap(), None);
    }

    #[test]
    fn ready_tokens_do_not_pile_up() {
        let (_tx, rx) = unbounded::<u8>();
        let (ready_tx, ready_rx) = bounded(1);
        let mut link = ChannelLink::with_ready(rx, ready_tx);
        link.announce_ready().unwrap();
        link.announce_ready().unwrap();
        assert_eq!(ready_rx.try_iter().count(), 1);
        drop(ready_rx);
        assert!(link.announce_ready().is_err());
        assert!(link.announce_ready().is_ok());
    }
}
