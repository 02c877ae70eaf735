use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use churngen::{
    InMemoryNoise, MixOptions, NoiseStore, Schema, StoreBackedNoise, load_base, load_noise,
    mix_stream,
};

fn write_dataset(path: &Path, ids: std::ops::Range<u64>) {
    let mut lines = vec!["id,attr1,attr2,sign".to_string()];
    lines.extend(ids.map(|id| format!("{id},{},{},1", id * 3 + 1, id % 7)));
    fs::write(path, lines.join("\n")).unwrap();
}

struct Fixture {
    schema: Schema,
    base_path: PathBuf,
    noise_path: PathBuf,
}

fn fixture(dir: &Path, base_len: u64, noise_len: u64) -> Fixture {
    let base_path = dir.join("residual.csv");
    let noise_path = dir.join("noise_inserts.csv");
    write_dataset(&base_path, 0..base_len);
    write_dataset(&noise_path, base_len..base_len + noise_len);
    Fixture {
        schema: Schema::numeric(2),
        base_path,
        noise_path,
    }
}

fn run_in_memory(fixture: &Fixture, options: &MixOptions, stream: &Path) -> Vec<u8> {
    let base = load_base(&fixture.base_path, &fixture.schema).unwrap();
    let records = load_noise(&fixture.noise_path, &fixture.schema, &base.id_space()).unwrap();
    let mut source = InMemoryNoise::from_records(records);
    mix_stream(&base, &mut source, options, stream).unwrap();
    fs::read(stream).unwrap()
}

fn run_backed(fixture: &Fixture, options: &MixOptions, store_path: &Path, stream: &Path) -> Vec<u8> {
    let base = load_base(&fixture.base_path, &fixture.schema).unwrap();
    let store = NoiseStore::recreate(store_path).unwrap();
    let mut source =
        StoreBackedNoise::load(store, &fixture.noise_path, &fixture.schema, &base.id_space())
            .unwrap();
    let summary = mix_stream(&base, &mut source, options, stream).unwrap();
    assert_eq!(source.staged(), 0, "pending fetch cache must drain");
    assert_eq!(summary.rows, fs::read_to_string(stream).unwrap().lines().count() as u64 - 1);
    fs::read(stream).unwrap()
}

#[test]
fn backed_and_in_memory_paths_produce_identical_streams() {
    let temp = tempdir().unwrap();
    let fixture = fixture(temp.path(), 100, 37);
    let options = MixOptions::default();
    let in_memory = run_in_memory(&fixture, &options, &temp.path().join("in_memory.csv"));
    let backed = run_backed(
        &fixture,
        &options,
        &temp.path().join("noise_index.bin"),
        &temp.path().join("backed.csv"),
    );
    assert_eq!(in_memory, backed);
}

#[test]
fn tiny_fetch_batches_only_change_throughput() {
    // Capacity 1 degenerates to one lookup per record and must still produce
    // the same bytes.
    let temp = tempdir().unwrap();
    let fixture = fixture(temp.path(), 24, 9);
    let baseline = run_backed(
        &fixture,
        &MixOptions::default(),
        &temp.path().join("default.bin"),
        &temp.path().join("default.csv"),
    );
    let tiny = run_backed(
        &fixture,
        &MixOptions {
            fetch_batch: 1,
            ..MixOptions::default()
        },
        &temp.path().join("tiny.bin"),
        &temp.path().join("tiny.csv"),
    );
    let odd = run_backed(
        &fixture,
        &MixOptions {
            fetch_batch: 7,
            ..MixOptions::default()
        },
        &temp.path().join("odd.bin"),
        &temp.path().join("odd.csv"),
    );
    assert_eq!(baseline, tiny);
    assert_eq!(baseline, odd);
}

#[test]
fn count_artifacts_agree_across_paths() {
    let temp = tempdir().unwrap();
    let in_memory_dir = temp.path().join("in_memory");
    let backed_dir = temp.path().join("backed");
    fs::create_dir_all(&in_memory_dir).unwrap();
    fs::create_dir_all(&backed_dir).unwrap();
    let fixture = fixture(temp.path(), 16, 4);
    let options = MixOptions::default();
    run_in_memory(&fixture, &options, &in_memory_dir.join("final_stream.csv"));
    run_backed(
        &fixture,
        &options,
        &temp.path().join("noise_index.bin"),
        &backed_dir.join("final_stream.csv"),
    );
    let in_memory_count = fs::read_to_string(in_memory_dir.join("count.txt")).unwrap();
    let backed_count = fs::read_to_string(backed_dir.join("count.txt")).unwrap();
    assert_eq!(in_memory_count, "24");
    assert_eq!(backed_count, in_memory_count);
}

#[test]
fn base_only_streams_skip_the_store_entirely() {
    let temp = tempdir().unwrap();
    let fixture = fixture(temp.path(), 12, 0);
    let options = MixOptions::default();
    let in_memory = run_in_memory(&fixture, &options, &temp.path().join("in_memory.csv"));
    let backed = run_backed(
        &fixture,
        &options,
        &temp.path().join("noise_index.bin"),
        &temp.path().join("backed.csv"),
    );
    assert_eq!(in_memory, backed);
    assert_eq!(in_memory.iter().filter(|byte| **byte == b'\n').count(), 13);
}
