use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf, time::Duration};

use gesturectl::import::{ImportOptions, Polyline, import_curve};
use gesturectl::{
    Axis, GestureRecorder, GestureStore, MirrorMode, RecordingConfig, ReplaySource, StepScheduler,
    Vec3, db,
};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let db_path: PathBuf = pargs
        .opt_value_from_str("--db")?
        .unwrap_or_else(db::default_db_path);

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            print_help();
            Ok(())
        }

        Some("list") => {
            let store = db::load_or_create(&db_path)?;
            if store.is_empty() {
                println!("no gestures in {}", db_path.display());
                return Ok(());
            }
            println!("gestures in {} (target scale {}):", db_path.display(), store.target_scale);
            for (i, g) in store.gestures.iter().enumerate() {
                println!(
                    "  [{i}] {} (type {}, {} samples, extent {:.1}{})",
                    g.name,
                    g.gesture_type,
                    g.samples.len(),
                    g.size.max_dimension(),
                    if g.settings.enabled { "" } else { ", disabled" }
                );
            }
            Ok(())
        }

        Some("recalc") => {
            let mut store = db::load_store(&db_path)?;
            store.recalculate_all();
            db::save_store(&db_path, &store)?;
            println!("recalculated {} gestures to scale {}", store.len(), store.target_scale);
            Ok(())
        }

        Some("import") => {
            let name: String = pargs
                .opt_value_from_str("--name")?
                .ok_or_else(|| anyhow!("usage: gesturectl import <points.json> --name <name>"))?;
            let gesture_type: u8 = pargs.opt_value_from_str("--type")?.unwrap_or(0);
            let segment_len: f32 = pargs.opt_value_from_str("--segment-len")?.unwrap_or(10.0);
            let straight = pargs.contains("--straight");
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl import <points.json> --name <name>"))?;

            let points = load_trace(&path)?;
            let curve = Polyline::new(points);
            let options = ImportOptions {
                preserve_curve_shape: !straight,
                max_segment_length: segment_len,
            };
            let mut store = db::load_or_create(&db_path)?;
            let index = import_curve(&curve, &name, gesture_type, &options, &mut store)?;
            db::save_store(&db_path, &store)?;
            let g = store.get(index).ok_or_else(|| anyhow!("import lost its gesture"))?;
            println!("imported '{}' at index {index} ({} samples)", name, g.samples.len());
            Ok(())
        }

        Some("record") => {
            let name: String = pargs
                .opt_value_from_str("--name")?
                .ok_or_else(|| anyhow!("usage: gesturectl record <trace.json> --name <name>"))?;
            let gesture_type: u8 = pargs.opt_value_from_str("--type")?.unwrap_or(0);
            let config = recording_config(&mut pargs, false)?;
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl record <trace.json> --name <name>"))?;

            let trace = load_trace(&path)?;
            let mut store = db::load_or_create(&db_path)?;
            let mut recorder = GestureRecorder::new();
            let samples = replay(&mut recorder, config, trace, &store)?;
            if samples.is_empty() {
                return Err(anyhow!("trace produced no samples"));
            }
            let index = store.save_recording(&samples, &name, gesture_type);
            db::save_store(&db_path, &store)?;
            println!("recorded '{}' at index {index} ({} samples)", name, samples.len());
            Ok(())
        }

        Some("detect") => {
            let hand = match pargs.opt_value_from_str::<_, String>("--hand")?.as_deref() {
                Some("left") => MirrorMode::Left,
                Some("right") => MirrorMode::Right,
                Some(other) => return Err(anyhow!("unknown hand: {other}")),
                None => MirrorMode::None,
            };
            let config = recording_config(&mut pargs, true)?;
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl detect <trace.json>"))?;

            let trace = load_trace(&path)?;
            let store = db::load_store(&db_path)?;
            let mut recorder = GestureRecorder::new();
            recorder.mirroring_hand = hand;
            let hits = detect_over(&mut recorder, config, trace, &store)?;
            if hits.is_empty() {
                println!("no gesture detected");
            }
            for d in hits {
                println!("detected '{}' (index {}, distance {:.3})", d.name, d.index, d.distance);
            }
            Ok(())
        }

        Some("remove") => {
            let index: usize = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl remove <index>"))?;
            let mut store = db::load_store(&db_path)?;
            let removed = store
                .remove(index)
                .ok_or_else(|| anyhow!("no gesture at index {index}"))?;
            db::save_store(&db_path, &store)?;
            println!("removed '{}'", removed.name);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn recording_config(pargs: &mut Arguments, run_detection: bool) -> Result<RecordingConfig> {
    let period_ms: u64 = pargs.opt_value_from_str("--period-ms")?.unwrap_or(33);
    let buffer: usize = pargs.opt_value_from_str("--buffer")?.unwrap_or(60);
    let clamp: f32 = pargs.opt_value_from_str("--clamp")?.unwrap_or(0.01);
    let flatten = match pargs.opt_value_from_str::<_, String>("--flatten")?.as_deref() {
        Some("x") | None => Some(Axis::X),
        Some("y") => Some(Axis::Y),
        Some("z") => Some(Axis::Z),
        Some("none") => None,
        Some(other) => return Err(anyhow!("unknown flatten axis: {other}")),
    };
    Ok(RecordingConfig {
        run_detection,
        flatten_axis: flatten,
        sampling_period: Duration::from_millis(period_ms),
        buffer_capacity: buffer,
        clamp_tolerance: clamp,
    })
}

fn load_trace(path: &std::path::Path) -> Result<Vec<Vec3>> {
    let txt = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    let raw: Vec<[f32; 3]> = serde_json::from_str(&txt)
        .map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(raw.iter().map(|[x, y, z]| Vec3::new(*x, *y, *z)).collect())
}

fn replay(
    recorder: &mut GestureRecorder,
    config: RecordingConfig,
    trace: Vec<Vec3>,
    store: &GestureStore,
) -> Result<Vec<Vec3>> {
    let period = config.sampling_period;
    let mut sched = StepScheduler::new();
    recorder.begin_recording(&mut sched, config)?;
    let mut source = ReplaySource::new(trace);
    while !source.exhausted() {
        for _ in 0..sched.advance(period) {
            recorder.capture_frame(&mut source, store);
        }
    }
    Ok(recorder.end_recording(&mut sched))
}

fn detect_over(
    recorder: &mut GestureRecorder,
    config: RecordingConfig,
    trace: Vec<Vec3>,
    store: &GestureStore,
) -> Result<Vec<gesturectl::Detection>> {
    let period = config.sampling_period;
    let mut sched = StepScheduler::new();
    recorder.begin_recording(&mut sched, config)?;
    let mut source = ReplaySource::new(trace);
    let mut hits = Vec::new();
    while !source.exhausted() {
        for _ in 0..sched.advance(period) {
            if let Some(d) = recorder.capture_frame(&mut source, store) {
                hits.push(d);
            }
        }
    }
    recorder.end_recording(&mut sched);
    Ok(hits)
}

fn print_help() {
    println!(
        r#"gesturectl — 3D motion-gesture template tool

USAGE:
  gesturectl list                            List gestures in the database
  gesturectl recalc                          Re-normalize all gestures to the target scale
  gesturectl import <points.json> --name N   Import a polyline as a gesture
  gesturectl record <trace.json> --name N    Record a replayed trace as a gesture
  gesturectl detect <trace.json>             Run detection over a replayed trace
  gesturectl remove <index>                  Remove a gesture by index

OPTIONS:
  --db <path>           Database file (default: ~/.config/gesturectl/gestures.toml)
  --type <n>            Gesture type tag for import/record (default 0)
  --segment-len <f>     Import subdivision length (default 10)
  --straight            Import with straight chords instead of arc lengths
  --period-ms <n>       Sampling period for record/detect (default 33)
  --buffer <n>          Live buffer capacity (default 60)
  --clamp <f>           Coordinate snap grid, 0 disables (default 0.01)
  --flatten <x|y|z|none> Axis to zero during capture (default x)
  --hand <left|right>   Active hand for mirrored detection

Trace files are JSON arrays of [x, y, z] triples.
"#
    );
}
