//! Error paths: every rejection is a structured error, never a panic or
//! a partial raster.

use baseline_jpeg::{DecodeErrors, Decoder, UnsupportedFeature};

mod common;

use common::{
    assemble, dht, dht_ac_eob_only, dht_dc_zero_only, dqt_identity, dri, eoi, segment, sof, sof0,
    soi, sos, sos_with_trailer, BitWriter,
};

/// Headers for a well-formed 1x1 grayscale image, minus scan and EOI.
fn gray_headers() -> Vec<u8> {
    assemble(&[
        soi(),
        dqt_identity(0),
        sof0(1, 1, &[(1, 0x11, 0)]),
        dht_dc_zero_only(0),
        dht_ac_eob_only(0),
    ])
}

#[test]
fn empty_input() {
    let err = Decoder::new().decode_buffer(&[]).unwrap_err();

    assert!(matches!(err, DecodeErrors::UnexpectedEof));
}

#[test]
fn missing_start_of_image() {
    let err = Decoder::new().decode_buffer(&[0x89, 0x50, 0x4E, 0x47]).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn input_ends_before_scan() {
    let err = Decoder::new().decode_buffer(&gray_headers()).unwrap_err();

    assert!(matches!(err, DecodeErrors::UnexpectedEof));
}

#[test]
fn stray_byte_between_segments() {
    let err = Decoder::new()
        .decode_buffer(&[0xFF, 0xD8, 0xA4])
        .unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn zero_marker_identifier() {
    let err = Decoder::new()
        .decode_buffer(&[0xFF, 0xD8, 0xFF, 0x00, 0x00, 0x00])
        .unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn segment_length_below_two() {
    // a comment segment claiming a length of one
    let data = assemble(&[soi(), vec![0xFF, 0xFE, 0x00, 0x01]]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn zero_width_frame() {
    let data = assemble(&[
        soi(),
        dqt_identity(0),
        sof0(0, 1, &[(1, 0x11, 0)]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn progressive_frame_is_unsupported() {
    let data = assemble(&[
        soi(),
        dqt_identity(0),
        sof(0xC2, 8, 1, 1, &[(1, 0x11, 0)]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::ProgressiveDctHuffman)
    ));
}

#[test]
fn arithmetic_frame_is_unsupported() {
    let data = assemble(&[soi(), sof(0xCA, 8, 1, 1, &[(1, 0x11, 0)])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::ProgressiveDctArithmetic)
    ));
}

#[test]
fn hierarchical_frame_is_unsupported() {
    let data = assemble(&[soi(), sof(0xC5, 8, 1, 1, &[(1, 0x11, 0)])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::Hierarchical)
    ));
}

#[test]
fn twelve_bit_precision_is_unsupported() {
    let data = assemble(&[soi(), sof(0xC0, 12, 1, 1, &[(1, 0x11, 0)])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::SamplePrecision(12))
    ));
}

#[test]
fn four_channel_frame_is_unsupported() {
    let data = assemble(&[
        soi(),
        sof(
            0xC0,
            8,
            1,
            1,
            &[(1, 0x11, 0), (2, 0x11, 0), (3, 0x11, 0), (4, 0x11, 0)],
        ),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::ChannelCount(4))
    ));
}

#[test]
fn oversized_sampling_factor_is_unsupported() {
    let data = assemble(&[soi(), sof0(1, 1, &[(1, 0x31, 0)])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::SamplingFactor(3, 1))
    ));
}

#[test]
fn restart_interval_is_unsupported() {
    let data = assemble(&[soi(), dri(2)]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::RestartMarkers)
    ));
}

#[test]
fn restart_marker_in_headers_is_unsupported() {
    let data = assemble(&[soi(), vec![0xFF, 0xD0]]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::RestartMarkers)
    ));
}

#[test]
fn arithmetic_conditioning_is_unsupported() {
    // an empty DAC segment is enough to be rejected
    let data = assemble(&[soi(), segment(0xCC, &[])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(
        err,
        DecodeErrors::Unsupported(UnsupportedFeature::ArithmeticCoding)
    ));
}

#[test]
fn huffman_counts_overflowing_capacity() {
    // counts summing to 300 cannot fit 256 leaves
    let mut counts = [0_u8; 16];
    counts[0] = 255;
    counts[1] = 45;

    let data = assemble(&[soi(), dht(0, 0, &counts, &[])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedHuffman(_)));
}

#[test]
fn huffman_counts_overflowing_depth() {
    // 256 symbols pass the count check but three codes of length one
    // overflow the tree itself
    let mut counts = [0_u8; 16];
    counts[0] = 3;

    let data = assemble(&[soi(), dht(0, 0, &counts, &[1, 2, 3])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedHuffman(_)));
}

#[test]
fn huffman_segment_with_leftover_bytes() {
    let mut counts = [0_u8; 16];
    counts[0] = 1;

    // a valid table plus one byte of garbage inside the declared length
    let mut payload = vec![0x00];
    payload.extend_from_slice(&counts);
    payload.push(0x00);
    payload.push(0xAA);

    let data = assemble(&[soi(), segment(0xC4, &payload)]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn dqt_with_invalid_precision() {
    // precision nibble 2 is undefined
    let mut payload = vec![0x20];
    payload.extend_from_slice(&[1; 64]);

    let data = assemble(&[soi(), segment(0xDB, &payload)]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn non_baseline_scan_parameters() {
    let data = assemble(&[
        gray_headers(),
        sos_with_trailer(&[(1, 0x00)], [0x00, 0x3F, 0x01]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn scan_referencing_unknown_component() {
    let data = assemble(&[gray_headers(), sos(&[(9, 0x00)])]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn missing_quantization_table() {
    let data = assemble(&[
        soi(),
        // table lands in slot 1, the component wants slot 0
        dqt_identity(1),
        sof0(1, 1, &[(1, 0x11, 0)]),
        dht_dc_zero_only(0),
        dht_ac_eob_only(0),
        sos(&[(1, 0x00)]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn missing_huffman_tables() {
    let data = assemble(&[
        soi(),
        dqt_identity(0),
        sof0(1, 1, &[(1, 0x11, 0)]),
        sos(&[(1, 0x00)]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn missing_frame_header() {
    let data = assemble(&[
        soi(),
        dqt_identity(0),
        dht_dc_zero_only(0),
        dht_ac_eob_only(0),
        sos(&[]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn duplicate_frame_header() {
    let data = assemble(&[
        soi(),
        dqt_identity(0),
        sof0(1, 1, &[(1, 0x11, 0)]),
        sof0(1, 1, &[(1, 0x11, 0)]),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn truncated_scan_data() {
    let mut bits = BitWriter::new();
    bits.put_bit(false);
    bits.put_bit(false);

    // scan data present but the end of image marker is missing
    let data = assemble(&[gray_headers(), sos(&[(1, 0x00)]), bits.finish()]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::UnexpectedEof));
}

#[test]
fn wrong_trailing_marker() {
    let mut bits = BitWriter::new();
    bits.put_bit(false);
    bits.put_bit(false);

    let data = assemble(&[
        gray_headers(),
        sos(&[(1, 0x00)]),
        bits.finish(),
        // a second SOI where EOI belongs
        vec![0xFF, 0xD8],
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::MalformedSegment(_)));
}

#[test]
fn unassigned_huffman_code_in_scan() {
    // the DC table only assigns the code "0"; scan data leading with a
    // one bit walks into a missing branch
    let data = assemble(&[gray_headers(), sos(&[(1, 0x00)]), vec![0x80], eoi()]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::CorruptScan(_)));
}

#[test]
fn ac_run_past_block_end() {
    // AC table: end of block "0", run 15 / size 1 "10"; four of those
    // advance the write position past coefficient 63
    let mut ac_counts = [0_u8; 16];
    ac_counts[0] = 1;
    ac_counts[1] = 1;

    let mut bits = BitWriter::new();
    bits.put_bit(false); // DC zero difference

    for _ in 0..4 {
        bits.put_bits(0b10, 2); // run 15, size 1
        bits.put_bit(true); // magnitude
    }

    let data = assemble(&[
        soi(),
        dqt_identity(0),
        sof0(8, 8, &[(1, 0x11, 0)]),
        dht_dc_zero_only(0),
        dht(1, 0, &ac_counts, &[0x00, 0xF1]),
        sos(&[(1, 0x00)]),
        bits.finish(),
        eoi(),
    ]);

    let err = Decoder::new().decode_buffer(&data).unwrap_err();

    assert!(matches!(err, DecodeErrors::CorruptScan(_)));
}
