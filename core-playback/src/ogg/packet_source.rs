use crate::error::{PlaybackError, Result};
use bytes::Bytes;
use ogg::PacketReader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::trace;

/// Pull iterator over the packets of one logical bitstream.
#[cfg_attr(test, mockall::automock)]
pub trait PacketSource {
    /// Next packet, or `None` once the stream is exhausted.
    fn next_packet(&mut self) -> Result<Option<Bytes>>;

    /// Release the underlying reader. Further pulls return `None`.
    fn close(&mut self);
}

/// Ogg page reader adapted to [`PacketSource`].
///
/// Only packets belonging to the first logical bitstream are yielded; pages of
/// any other serial number are skipped.
pub struct OggPacketSource<R: Read + Seek> {
    reader: Option<PacketReader<R>>,
    serial: Option<u32>,
    packets_read: u64,
}

impl OggPacketSource<BufReader<File>> {
    /// Open `path` for buffered packet reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> OggPacketSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(PacketReader::new(reader)),
            serial: None,
            packets_read: 0,
        }
    }

    /// Serial number of the bitstream being followed, once known.
    pub fn serial(&self) -> Option<u32> {
        self.serial
    }

    /// Packets yielded so far.
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }
}

impl<R: Read + Seek> PacketSource for OggPacketSource<R> {
    fn next_packet(&mut self) -> Result<Option<Bytes>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        loop {
            let packet = reader
                .read_packet()
                .map_err(|e| PlaybackError::ContainerError(e.to_string()))?;
            let Some(packet) = packet else {
                return Ok(None);
            };

            let serial = packet.stream_serial();
            match self.serial {
                None => self.serial = Some(serial),
                Some(first) if first != serial => {
                    trace!(serial, "skipping packet from another logical stream");
                    continue;
                }
                Some(_) => {}
            }

            self.packets_read += 1;
            return Ok(Some(Bytes::from(packet.data)));
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}
