use super::{sniff_packet, OggPacketSource, PacketSource, StreamType};
use crate::error::{PlaybackError, Result};
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// Outcome of the header phase of an Ogg logical bitstream.
#[derive(Debug, Clone, Default)]
pub struct SniffResult {
    pub stream_type: StreamType,
    /// Header packets in stream order, identification packet first.
    pub headers: Vec<Bytes>,
    /// Total packets pulled from the source, headers included.
    pub packets_consumed: usize,
}

/// Classifies a logical bitstream and consumes its header packets.
///
/// After a successful sniff the source is positioned on the first audio
/// packet.
pub struct StreamTypeSniffer;

impl StreamTypeSniffer {
    /// Pull packets until the stream is classified and its header budget is
    /// spent.
    ///
    /// Packets that precede classification are skipped. If the source ends
    /// before any packet classifies, the result is `Unknown` (not an error).
    /// If it ends while header packets are still owed, the container is
    /// truncated and `UnexpectedEndOfStream` is returned.
    pub fn sniff<S: PacketSource + ?Sized>(source: &mut S) -> Result<SniffResult> {
        let mut result = SniffResult::default();
        let mut budget = 0usize;

        while let Some(packet) = source.next_packet()? {
            result.packets_consumed += 1;

            if result.stream_type == StreamType::Unknown {
                result.stream_type = sniff_packet(&packet);
                budget = result.stream_type.header_budget();
                debug!(
                    stream_type = %result.stream_type,
                    packet = result.packets_consumed,
                    "sniffed packet"
                );
                if result.stream_type == StreamType::Unknown {
                    continue;
                }
            }

            result.headers.push(packet);
            budget -= 1;
            if budget == 0 {
                return Ok(result);
            }
        }

        if result.stream_type == StreamType::Unknown {
            return Ok(result);
        }

        debug!(
            stream_type = %result.stream_type,
            missing = budget,
            "stream ended inside headers"
        );
        Err(PlaybackError::UnexpectedEndOfStream)
    }
}

/// Classify an Ogg file from its very first packet.
///
/// Opens and closes its own reader; no other packet is inspected.
pub fn ogg_file_stream_type(path: &Path) -> Result<StreamType> {
    let mut source = OggPacketSource::open(path)?;
    let stream_type = match source.next_packet()? {
        Some(packet) => sniff_packet(&packet),
        None => StreamType::Unknown,
    };
    source.close();
    Ok(stream_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::fixtures::{opus_head, vorbis_ident};
    use crate::ogg::MockPacketSource;
    use mockall::Sequence;

    fn scripted(packets: Vec<Vec<u8>>) -> MockPacketSource {
        let mut source = MockPacketSource::new();
        let mut seq = Sequence::new();
        for packet in packets {
            source
                .expect_next_packet()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move || Ok(Some(Bytes::from(packet))));
        }
        source
            .expect_next_packet()
            .returning(|| Ok(None));
        source
    }

    #[test]
    fn test_vorbis_consumes_exactly_three_packets() {
        let mut source = MockPacketSource::new();
        let mut seq = Sequence::new();
        for packet in [
            vorbis_ident(2, 44100),
            b"\x03vorbis-comments".to_vec(),
            b"\x05vorbis-setup".to_vec(),
        ] {
            source
                .expect_next_packet()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move || Ok(Some(Bytes::from(packet))));
        }
        // Any further pull would panic: audio packets are left untouched

        let result = StreamTypeSniffer::sniff(&mut source).unwrap();
        assert_eq!(result.stream_type, StreamType::Vorbis);
        assert_eq!(result.headers.len(), 3);
        assert_eq!(result.packets_consumed, 3);
        assert_eq!(result.headers[2].as_ref(), b"\x05vorbis-setup");
    }

    #[test]
    fn test_opus_consumes_exactly_two_packets() {
        let mut source = MockPacketSource::new();
        let mut seq = Sequence::new();
        for packet in [opus_head(2, 312, 0), b"OpusTags\x00\x00\x00\x00".to_vec()] {
            source
                .expect_next_packet()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move || Ok(Some(Bytes::from(packet))));
        }

        let result = StreamTypeSniffer::sniff(&mut source).unwrap();
        assert_eq!(result.stream_type, StreamType::Opus);
        assert_eq!(result.headers.len(), 2);
        assert_eq!(result.packets_consumed, 2);
    }

    #[test]
    fn test_unknown_stream_is_not_an_error() {
        let mut source = scripted(vec![b"\x7fFLAC".to_vec(), b"garbage".to_vec()]);

        let result = StreamTypeSniffer::sniff(&mut source).unwrap();
        assert_eq!(result.stream_type, StreamType::Unknown);
        assert!(result.headers.is_empty());
        assert_eq!(result.packets_consumed, 2);
    }

    #[test]
    fn test_classification_on_later_packet() {
        let mut source = scripted(vec![
            b"junk".to_vec(),
            opus_head(1, 0, 0),
            b"OpusTags".to_vec(),
        ]);

        let result = StreamTypeSniffer::sniff(&mut source).unwrap();
        assert_eq!(result.stream_type, StreamType::Opus);
        assert_eq!(result.packets_consumed, 3);
        assert_eq!(result.headers.len(), 2);
    }

    #[test]
    fn test_truncated_headers_fail() {
        let mut source = scripted(vec![vorbis_ident(2, 44100), b"\x03vorbis".to_vec()]);

        let err = StreamTypeSniffer::sniff(&mut source).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_source_error_propagates() {
        let mut source = MockPacketSource::new();
        source
            .expect_next_packet()
            .times(1)
            .returning(|| Err(PlaybackError::ContainerError("bad page".into())));

        let err = StreamTypeSniffer::sniff(&mut source).unwrap_err();
        assert!(matches!(err, PlaybackError::ContainerError(_)));
    }
}
