//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use ogg::{PacketWriteEndInfo, PacketWriter};
use std::path::PathBuf;
use tempfile::TempDir;

/// Serialize `packets` as one logical Ogg bitstream, one packet per page.
pub fn ogg_bytes(serial: u32, packets: &[Vec<u8>]) -> Vec<u8> {
    let paged: Vec<(Vec<u8>, u64)> = packets
        .iter()
        .enumerate()
        .map(|(i, packet)| (packet.clone(), i as u64))
        .collect();
    ogg_bytes_with_granules(serial, &paged)
}

/// Like [`ogg_bytes`], with an explicit granule position for each page.
pub fn ogg_bytes_with_granules(serial: u32, packets: &[(Vec<u8>, u64)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = PacketWriter::new(&mut buf);
        for (i, (packet, granule)) in packets.iter().enumerate() {
            let info = if i + 1 == packets.len() {
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::EndPage
            };
            writer
                .write_packet(packet.clone(), serial, info, *granule)
                .unwrap();
        }
    }
    buf
}

/// Committed sample file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn write_ogg(dir: &TempDir, name: &str, packets: &[Vec<u8>]) -> PathBuf {
    write_file(dir, name, &ogg_bytes(0x5eed, packets))
}

pub fn vorbis_ident(channels: u8, sample_rate: u32) -> Vec<u8> {
    let mut p = vec![1u8];
    p.extend_from_slice(b"vorbis");
    p.extend_from_slice(&0u32.to_le_bytes());
    p.push(channels);
    p.extend_from_slice(&sample_rate.to_le_bytes());
    p.extend_from_slice(&0i32.to_le_bytes());
    p.extend_from_slice(&96_000i32.to_le_bytes());
    p.extend_from_slice(&0i32.to_le_bytes());
    p.push(0xb8);
    p.push(1);
    p
}

pub fn opus_head(channels: u8, pre_skip: u16) -> Vec<u8> {
    let mut p = b"OpusHead".to_vec();
    p.push(1);
    p.push(channels);
    p.extend_from_slice(&pre_skip.to_le_bytes());
    p.extend_from_slice(&44_100u32.to_le_bytes());
    p.extend_from_slice(&0i16.to_le_bytes());
    p.push(0);
    p
}

pub fn opus_tags() -> Vec<u8> {
    let mut p = b"OpusTags".to_vec();
    p.extend_from_slice(&0u32.to_le_bytes());
    p.extend_from_slice(&0u32.to_le_bytes());
    p
}

/// `packets` 20 ms Opus packets of a stereo sweep.
#[cfg(feature = "decoder-opus")]
pub fn opus_audio_packets(channels: u8, packets: usize) -> Vec<Vec<u8>> {
    const FRAMES: usize = 960;
    let layout = if channels == 1 {
        opus::Channels::Mono
    } else {
        opus::Channels::Stereo
    };
    let mut encoder = opus::Encoder::new(48_000, layout, opus::Application::Audio).unwrap();

    (0..packets)
        .map(|p| {
            let mut pcm = Vec::with_capacity(FRAMES * usize::from(channels));
            for i in 0..FRAMES {
                let t = (p * FRAMES + i) as f32 / 48_000.0;
                let freq = 220.0 + 20.0 * p as f32;
                let v = ((t * freq * std::f32::consts::TAU).sin() * 10_000.0) as i16;
                for _ in 0..channels {
                    pcm.push(v);
                }
            }
            let mut packet = vec![0u8; 4000];
            let len = encoder.encode(&pcm, &mut packet).unwrap();
            packet.truncate(len);
            packet
        })
        .collect()
}

/// Complete Ogg Opus file: head, tags, then `packets` audio packets.
#[cfg(feature = "decoder-opus")]
pub fn write_opus_file(
    dir: &TempDir,
    name: &str,
    channels: u8,
    pre_skip: u16,
    packets: usize,
) -> PathBuf {
    let end = (packets * 960) as u64;
    write_file(dir, name, &opus_file_bytes(channels, pre_skip, packets, end))
}

/// Ogg Opus stream whose last page carries `end_granule`. Earlier pages
/// count 960 frames per packet, the size [`opus_audio_packets`] encodes.
#[cfg(feature = "decoder-opus")]
pub fn opus_file_bytes(channels: u8, pre_skip: u16, packets: usize, end_granule: u64) -> Vec<u8> {
    let mut paged = vec![(opus_head(channels, pre_skip), 0), (opus_tags(), 0)];
    for (i, packet) in opus_audio_packets(channels, packets).into_iter().enumerate() {
        let granule = if i + 1 == packets {
            end_granule
        } else {
            ((i + 1) * 960) as u64
        };
        paged.push((packet, granule));
    }
    ogg_bytes_with_granules(0x5eed, &paged)
}

/// Canonical RIFF WAVE with a 16-byte fmt chunk.
pub fn wav_bytes(format_tag: u16, channels: u16, sample_rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&format_tag.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

pub fn write_pcm16_wav(dir: &TempDir, name: &str, channels: u16, samples: &[i16]) -> PathBuf {
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    write_file(dir, name, &wav_bytes(1, channels, 22_050, 16, &data))
}

pub fn write_float_wav(dir: &TempDir, name: &str, samples: &[f32]) -> PathBuf {
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    write_file(dir, name, &wav_bytes(3, 1, 22_050, 32, &data))
}

/// Drain a decoder with fixed-size pulls; returns per-call frame counts and
/// all PCM bytes.
pub fn drain<D: core_playback::PcmDecoder + ?Sized>(
    decoder: &mut D,
    frames: usize,
) -> (Vec<usize>, Vec<u8>) {
    let bytes_per_frame = decoder.format().unwrap().bytes_per_frame();
    let mut out = vec![0u8; frames * bytes_per_frame];
    let mut results = Vec::new();
    let mut pcm = Vec::new();
    loop {
        let n = decoder.decode_samples(frames, &mut out).unwrap();
        results.push(n);
        if n == 0 {
            return (results, pcm);
        }
        pcm.extend_from_slice(&out[..n * bytes_per_frame]);
    }
}

pub fn as_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

