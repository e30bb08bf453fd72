//! WAV fixture generator

use std::io::Cursor;

/// In-memory 16 kHz mono 16-bit WAV with a 440 Hz tone
pub fn generate_test_wav(duration_seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        let total_samples = (duration_seconds * spec.sample_rate as f64) as usize;
        for i in 0..total_samples {
            let t = i as f32 / spec.sample_rate as f32;
            let sample = 0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}
