// Integration test: built-in tones rendered through the sound cache
//
// Every catalogue entry must land on disk as mono 16-bit PCM at 44.1 kHz with
// exactly floor(duration * 44100) frames.

use pomodoro::tone::{BuiltinTone, SoundCache, read_header, sample_count};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_every_builtin_renders_valid_pcm() {
    let dir = TempDir::new().unwrap();
    let cache = SoundCache::new(dir.path()).unwrap();

    let rendered = cache.render_all().unwrap();
    assert_eq!(rendered.len(), BuiltinTone::ALL.len());

    for (tone, path) in rendered {
        let header = read_header(&path).unwrap();
        let expected = sample_count(tone.descriptor().duration) as u32;

        assert_eq!(header.sample_rate, 44100, "{}", tone.name());
        assert_eq!(header.channels, 1, "{}", tone.name());
        assert_eq!(header.bits_per_sample, 16, "{}", tone.name());
        assert!(header.is_pcm, "{}", tone.name());
        assert_eq!(header.sample_count, expected, "{}", tone.name());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), tone.file_name());
    }
}

#[test]
fn test_known_tone_lengths() {
    let dir = TempDir::new().unwrap();
    let cache = SoundCache::new(dir.path()).unwrap();

    let expected = [
        ("ding", 13230),
        ("bell", 66150),
        ("alarm", 88200),
        ("chime", 44100),
        ("double_beep", 26460),
        ("beep", 11025),
    ];
    for (name, frames) in expected {
        let path = cache.get_or_render(name).unwrap();
        assert_eq!(read_header(&path).unwrap().sample_count, frames, "{}", name);
    }
}

#[test]
fn test_rerender_is_byte_identical() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = SoundCache::new(first_dir.path()).unwrap();
    let second = SoundCache::new(second_dir.path()).unwrap();

    for tone in BuiltinTone::ALL {
        let a = std::fs::read(first.get_or_render(tone.name()).unwrap()).unwrap();
        let b = std::fs::read(second.get_or_render(tone.name()).unwrap()).unwrap();
        assert_eq!(a, b, "{}", tone.name());
    }
}

#[test]
fn test_parallel_renders_leave_one_clean_file_per_tone() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(SoundCache::new(dir.path()).unwrap());

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let tone = BuiltinTone::ALL[i % BuiltinTone::ALL.len()];
                cache.get_or_render(tone.name()).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let path = handle.join().unwrap();
        assert!(read_header(&path).is_ok());
    }

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();

    let mut expected: Vec<_> = BuiltinTone::ALL.iter().map(|t| t.file_name()).collect();
    expected.sort();
    assert_eq!(names, expected);
}
