#![cfg(feature = "decoder-opus")]

mod common;

use common::{as_i16, drain, opus_file_bytes, write_file, write_opus_file};
use core_playback::{
    open_decoder, AnyDecoder, AudioCodec, DecoderConfig, DecoderState, OpusFileDecoder,
    OpusStreamDecoder, PcmDecoder, PlaybackError,
};
use tempfile::TempDir;

const PACKETS: usize = 10;
const PACKET_FRAMES: usize = 960;

#[test]
fn test_stream_decoder_pulls_in_fixed_chunks() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 2, 312, PACKETS);

    let mut decoder = OpusStreamDecoder::new(DecoderConfig::default());
    decoder.open(&path).unwrap();

    let format = decoder.format().unwrap();
    assert_eq!(format.codec, AudioCodec::Opus);
    assert_eq!(format.as_tuple(), (48_000, 2, 16));

    let (results, pcm) = drain(&mut decoder, 1024);
    let total = PACKETS * PACKET_FRAMES;
    assert_eq!(results.len(), total.div_ceil(1024) + 1);
    assert!(results[..9].iter().all(|&n| n == 1024));
    assert_eq!(results[9], total - 9 * 1024);
    assert_eq!(*results.last().unwrap(), 0);
    assert_eq!(pcm.len(), total * 4);
    assert_eq!(decoder.state(), DecoderState::Drained);

    // Exhausted decoders keep answering zero
    let mut out = vec![0u8; 4096];
    assert_eq!(decoder.decode_samples(1024, &mut out).unwrap(), 0);
}

#[test]
fn test_file_decoder_drops_pre_skip() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 1, 312, PACKETS);

    let mut decoder = OpusFileDecoder::new(DecoderConfig::default());
    decoder.open(&path).unwrap();
    assert_eq!(decoder.format().unwrap().as_tuple(), (48_000, 1, 16));

    let (_, pcm) = drain(&mut decoder, 1024);
    assert_eq!(pcm.len() / 2, PACKETS * PACKET_FRAMES - 312);
}

#[test]
fn test_file_decoder_trims_to_final_granule() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "short.opus", &opus_file_bytes(2, 312, 3, 2020));

    let mut whole = OpusFileDecoder::new(DecoderConfig::default());
    whole.open(&path).unwrap();
    let (results, filed) = drain(&mut whole, 1024);
    assert_eq!(results, vec![1024, 2020 - 312 - 1024, 0]);

    // The raw packet stream keeps both pre-skip and padding
    let mut streaming = OpusStreamDecoder::new(DecoderConfig::default());
    streaming.open(&path).unwrap();
    let (_, streamed) = drain(&mut streaming, 1024);
    assert_eq!(streamed.len(), 3 * PACKET_FRAMES * 4);
    assert_eq!(as_i16(&streamed)[312 * 2..2020 * 2], as_i16(&filed)[..]);
}

#[test]
fn test_pre_skip_is_the_only_difference_between_decoders() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 2, 480, PACKETS);

    let mut streaming = OpusStreamDecoder::new(DecoderConfig::default());
    streaming.open(&path).unwrap();
    let (_, streamed) = drain(&mut streaming, 1024);

    let mut whole = OpusFileDecoder::new(DecoderConfig::default());
    whole.open(&path).unwrap();
    let (_, filed) = drain(&mut whole, 1024);

    // Zero output gain: the file decoder is the streamed output minus pre-skip
    assert_eq!(as_i16(&streamed)[480 * 2..], as_i16(&filed)[..]);
}

#[test]
fn test_output_is_independent_of_pull_size() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 2, 0, PACKETS);

    let mut reference = None;
    for frames in [1, 333, 960, 1024, 4096] {
        let mut decoder = OpusStreamDecoder::new(DecoderConfig::default());
        decoder.open(&path).unwrap();
        let (_, pcm) = drain(&mut decoder, frames);
        decoder.close().unwrap();

        match &reference {
            None => reference = Some(pcm),
            Some(expected) => assert_eq!(expected, &pcm, "pull size {frames}"),
        }
    }
}

#[test]
fn test_dispatch_honours_prefer_opus_file() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.ogg", 2, 312, 2);

    let decoder = open_decoder(&path, &DecoderConfig::default()).unwrap();
    assert!(matches!(decoder, AnyDecoder::OpusFile(_)));

    let config = DecoderConfig {
        prefer_opus_file: false,
        ..Default::default()
    };
    let mut decoder = open_decoder(&path, &config).unwrap();
    assert!(matches!(decoder, AnyDecoder::OpusStream(_)));
    let (_, pcm) = drain(&mut decoder, 512);
    assert_eq!(pcm.len(), 2 * PACKET_FRAMES * 4);
}

#[test]
fn test_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 1, 0, 3);

    let mut decoder = OpusStreamDecoder::new(DecoderConfig::default());
    let mut out = vec![0u8; 2048];
    assert_eq!(decoder.state(), DecoderState::Unopened);
    assert!(matches!(decoder.format(), Err(PlaybackError::NoTrackLoaded)));
    assert!(matches!(
        decoder.decode_samples(256, &mut out),
        Err(PlaybackError::NoTrackLoaded)
    ));

    // Closing an unopened decoder is harmless
    decoder.close().unwrap();
    assert_eq!(decoder.state(), DecoderState::Unopened);

    decoder.open(&path).unwrap();
    assert_eq!(decoder.state(), DecoderState::Streaming);
    assert_eq!(decoder.decode_samples(256, &mut out).unwrap(), 256);

    decoder.close().unwrap();
    decoder.close().unwrap();
    assert_eq!(decoder.state(), DecoderState::Closed);
    assert!(matches!(
        decoder.decode_samples(256, &mut out),
        Err(PlaybackError::NoTrackLoaded)
    ));

    // A closed decoder can be opened again from the start
    decoder.open(&path).unwrap();
    let (_, pcm) = drain(&mut decoder, 256);
    assert_eq!(pcm.len(), 3 * PACKET_FRAMES * 2);
}

#[test]
fn test_failed_open_leaves_decoder_unopened() {
    let dir = TempDir::new().unwrap();
    let mut decoder = OpusFileDecoder::new(DecoderConfig::default());

    let err = decoder.open(&dir.path().join("missing.opus")).unwrap_err();
    assert!(matches!(err, PlaybackError::Io(_)));
    assert_eq!(decoder.state(), DecoderState::Unopened);
    decoder.close().unwrap();
}

#[test]
fn test_oversized_pull_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_opus_file(&dir, "sweep.opus", 1, 0, 3);

    let config = DecoderConfig {
        buffer_frames: 512,
        ..Default::default()
    };
    let mut decoder = OpusStreamDecoder::new(config);
    decoder.open(&path).unwrap();

    let mut out = vec![0u8; 1024 * 2];
    let err = decoder.decode_samples(1024, &mut out).unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidRequest(_)));

    // Short output buffers are refused as well
    let err = decoder.decode_samples(512, &mut out[..100]).unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidRequest(_)));

    // So are empty pulls, which would be indistinguishable from end of stream
    let err = decoder.decode_samples(0, &mut out).unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidRequest(_)));
    assert_eq!(decoder.state(), DecoderState::Streaming);
}
