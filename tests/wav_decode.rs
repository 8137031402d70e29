use std::io::Cursor;

use summa_tts::{PcmFormat, WavEncoder};

#[test]
fn int16_output_decodes_with_hound() {
    let samples = [0.0f32, 0.5, -0.5, 1.0, -1.5];
    let wav = WavEncoder::new(PcmFormat::Int16).encode(&samples, 16_000);

    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.len(), 5);

    let decoded: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(decoded, vec![0, 16383, -16384, i16::MAX, i16::MIN]);
}

#[test]
fn float_output_matches_the_worked_example() {
    let wav = WavEncoder::new(PcmFormat::Float32).encode(&[0.0, 0.5, -0.5, 1.0], 16_000);

    assert_eq!(wav.len(), 60);
    assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 16_000);
    assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 16);

    let payload: Vec<f32> = wav[44..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(payload, vec![0.0, 0.5, -0.5, 1.0]);
}
