//! Benchmarks over synthesized baseline streams.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use baseline_jpeg::Decoder;

fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, marker];

    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn dqt_identity() -> Vec<u8> {
    let mut payload = vec![0x00];

    payload.extend_from_slice(&[1; 64]);

    segment(0xDB, &payload)
}

/// One-symbol table: code "0" maps to 0x00, which is both the zero DC
/// difference and the end-of-block symbol.
fn dht_trivial(class: u8) -> Vec<u8> {
    let mut payload = vec![class << 4];

    let mut counts = [0_u8; 16];
    counts[0] = 1;

    payload.extend_from_slice(&counts);
    payload.push(0x00);

    segment(0xC4, &payload)
}

fn sof0(width: u16, height: u16, components: &[(u8, u8)]) -> Vec<u8> {
    let mut payload = vec![8];

    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&width.to_be_bytes());
    payload.push(components.len() as u8);

    for &(id, sampling) in components {
        payload.extend_from_slice(&[id, sampling, 0]);
    }

    segment(0xC0, &payload)
}

fn sos(component_ids: &[u8]) -> Vec<u8> {
    let mut payload = vec![component_ids.len() as u8];

    for &id in component_ids {
        payload.extend_from_slice(&[id, 0x00]);
    }

    payload.extend_from_slice(&[0x00, 0x3F, 0x00]);

    segment(0xDA, &payload)
}

/// A flat gray image: every block is the two bits "00" (zero DC
/// difference, end of block), so `blocks` blocks pack into
/// `blocks / 4` zero bytes.
fn entropy_flat(blocks: usize) -> Vec<u8> {
    assert_eq!(blocks % 4, 0);

    vec![0x00; blocks / 4]
}

fn grayscale_256() -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(&[0xFF, 0xD8]);
    data.extend(dqt_identity());
    data.extend(sof0(256, 256, &[(1, 0x11)]));
    data.extend(dht_trivial(0));
    data.extend(dht_trivial(1));
    data.extend(sos(&[1]));
    data.extend(entropy_flat(32 * 32));
    data.extend_from_slice(&[0xFF, 0xD9]);

    data
}

fn ycbcr_420_256() -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(&[0xFF, 0xD8]);
    data.extend(dqt_identity());
    data.extend(sof0(256, 256, &[(1, 0x22), (2, 0x11), (3, 0x11)]));
    data.extend(dht_trivial(0));
    data.extend(dht_trivial(1));
    data.extend(sos(&[1, 2, 3]));
    // 16x16 MCUs, six blocks each
    data.extend(entropy_flat(16 * 16 * 6));
    data.extend_from_slice(&[0xFF, 0xD9]);

    data
}

fn criterion_benchmark(c: &mut Criterion) {
    let grayscale = grayscale_256();
    let ycbcr = ycbcr_420_256();

    c.bench_function("decode grayscale 256x256", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new();

            black_box(decoder.decode_buffer(black_box(&grayscale)).unwrap());
        });
    });

    c.bench_function("decode ycbcr 4:2:0 256x256", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new();

            black_box(decoder.decode_buffer(black_box(&ycbcr)).unwrap());
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
