use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use serde_json::json;
use sha2::Digest as _;
use splatfilm::{
    BlockOpts, BlockSize, ExecCaps, ExecStrategy, GaussianFilter, ImageBlock,
    ReconstructionFilter, SampleBatch, TentFilter,
};

#[derive(Clone, Debug)]
struct BenchArgs {
    width: u32,
    height: u32,
    channels: u32,
    samples: usize,
    filter: FilterKind,
    radius: f32,
    warmup: u32,
    repeats: u32,
    threads: Option<usize>,
    normalize: bool,
    coalesce: bool,
    seed: u64,
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
enum FilterKind {
    Box,
    Tent,
    Gaussian,
}

#[derive(Clone, Debug)]
struct StrategyRun {
    strategy: ExecStrategy,
    times: Vec<Duration>,
    sha256: String,
    total: f64,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.width == 0 || args.height == 0 {
        anyhow::bail!("--width/--height must be > 0");
    }
    if args.channels == 0 {
        anyhow::bail!("--channels must be >= 1");
    }
    if args.repeats == 0 {
        anyhow::bail!("--repeats must be >= 1");
    }
    if args.radius.is_nan() || args.radius <= 0.0 {
        anyhow::bail!("--radius must be > 0");
    }
    if let Some(n) = args.threads
        && n == 0
    {
        anyhow::bail!("--threads must be >= 1 when set");
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(n) = args.threads {
        pool = pool.num_threads(n);
    }
    let pool = pool.build().context("build rayon thread pool")?;

    let batch = sample_batch(&args)?;
    let opts = BlockOpts {
        normalize: args.normalize,
        coalesce: args.coalesce,
        ..BlockOpts::default()
    };

    eprintln!(
        "bench: {repeats} run(s) ({profile} build), {w}x{h}x{c}, {n} samples, filter={filter:?} r={r}, threads={threads}, normalize={normalize}, coalesce={coalesce}",
        repeats = args.repeats,
        profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        w = args.width,
        h = args.height,
        c = args.channels,
        n = batch.len(),
        filter = args.filter,
        r = args.radius,
        threads = pool.current_num_threads(),
        normalize = args.normalize,
        coalesce = args.coalesce,
    );

    let mut runs = Vec::new();
    for caps in [ExecCaps::SCALAR, ExecCaps::VECTORIZED, ExecCaps::TRACED] {
        runs.push(pool.install(|| run_strategy(&args, opts, caps, &batch))?);
    }

    report_percentiles(&runs);

    let report = json!({
        "width": args.width,
        "height": args.height,
        "channels": args.channels,
        "samples": batch.len(),
        "filter": format!("{:?}", args.filter),
        "radius": args.radius,
        "normalize": args.normalize,
        "coalesce": args.coalesce,
        "threads": pool.current_num_threads(),
        "strategies": runs.iter().map(|r| json!({
            "strategy": r.strategy,
            "p50_ms": ms(percentile(&r.times, 0.50)),
            "p90_ms": ms(percentile(&r.times, 0.90)),
            "p99_ms": ms(percentile(&r.times, 0.99)),
            "sha256": r.sha256,
            "total": r.total,
        })).collect::<Vec<_>>(),
    });
    let text = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("write report '{}'", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}

fn run_strategy(
    args: &BenchArgs,
    opts: BlockOpts,
    caps: ExecCaps,
    batch: &SampleBatch,
) -> anyhow::Result<StrategyRun> {
    let size = BlockSize::new(args.width, args.height);
    let mut block = ImageBlock::new(size, args.channels, filter(args), opts)?;

    for _ in 0..args.warmup {
        block.put_batch(batch, caps)?;
        block.clear();
    }

    let mut times = Vec::with_capacity(args.repeats as usize);
    for _ in 0..args.repeats {
        block.clear();
        let t0 = Instant::now();
        block.put_batch(batch, caps)?;
        times.push(t0.elapsed());
    }

    let tensor = block.to_tensor();
    let bytes: Vec<u8> = tensor
        .as_slice()
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    Ok(StrategyRun {
        strategy: ExecStrategy::select(caps),
        times,
        sha256: sha256_hex(&bytes),
        total: block.total(),
    })
}

fn filter(args: &BenchArgs) -> Option<Arc<dyn ReconstructionFilter>> {
    match args.filter {
        FilterKind::Box => None,
        FilterKind::Tent => Some(Arc::new(TentFilter::new(args.radius))),
        FilterKind::Gaussian => Some(Arc::new(GaussianFilter::new(args.radius / 4.0))),
    }
}

fn mix64(mut z: u64) -> u64 {
    // SplitMix64 mixing function.
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn unit(seed: u64, i: u64) -> f64 {
    (mix64(seed ^ i.wrapping_mul(0x9E37_79B9_7F4A_7C15)) >> 11) as f64 / (1u64 << 53) as f64
}

fn sample_batch(args: &BenchArgs) -> anyhow::Result<SampleBatch> {
    let c = args.channels as usize;
    let mut batch = SampleBatch::new(args.channels);
    let mut values = vec![0.0f32; c];
    for i in 0..args.samples as u64 {
        let base = i * (c as u64 + 2);
        let x = unit(args.seed, base) * f64::from(args.width);
        let y = unit(args.seed, base + 1) * f64::from(args.height);
        for (k, v) in values.iter_mut().enumerate() {
            *v = unit(args.seed, base + 2 + k as u64) as f32;
        }
        batch
            .push(splatfilm::Point::new(x, y), &values, true)
            .context("build sample batch")?;
    }
    Ok(batch)
}

fn percentile(times: &[Duration], p: f64) -> Duration {
    let mut sorted = times.to_vec();
    sorted.sort();
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn report_percentiles(runs: &[StrategyRun]) {
    eprintln!("results (ms):");
    for r in runs {
        eprintln!(
            "  {:<10} p50={:>9.3} p90={:>9.3} p99={:>9.3} sha256={}",
            format!("{:?}", r.strategy),
            ms(percentile(&r.times, 0.50)),
            ms(percentile(&r.times, 0.90)),
            ms(percentile(&r.times, 0.99)),
            &r.sha256[..16],
        );
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);

    let mut out = BenchArgs {
        width: 64,
        height: 64,
        channels: 3,
        samples: 200_000,
        filter: FilterKind::Gaussian,
        radius: 2.0,
        warmup: 1,
        repeats: 20,
        threads: None,
        normalize: false,
        coalesce: false,
        seed: 0x5EED,
        out: None,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--width" => out.width = parse_u32(args.next(), "--width")?,
            "--height" => out.height = parse_u32(args.next(), "--height")?,
            "--channels" => out.channels = parse_u32(args.next(), "--channels")?,
            "--samples" => out.samples = parse_usize(args.next(), "--samples")?,
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--threads" => out.threads = Some(parse_usize(args.next(), "--threads")?),
            "--seed" => out.seed = parse_usize(args.next(), "--seed")? as u64,
            "--radius" => {
                let v = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("missing value for --radius"))?;
                out.radius = v
                    .parse::<f32>()
                    .with_context(|| format!("parse --radius value '{v}'"))?;
            }
            "--filter" => {
                let v = args.next().ok_or_else(|| {
                    anyhow::anyhow!("missing value for --filter (box|tent|gaussian)")
                })?;
                out.filter = match v.as_str() {
                    "box" => FilterKind::Box,
                    "tent" => FilterKind::Tent,
                    "gaussian" => FilterKind::Gaussian,
                    _ => anyhow::bail!("unknown --filter '{v}' (expected box|tent|gaussian)"),
                };
            }
            "--out" => {
                out.out = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("missing value for --out (expected a path)")
                })?))
            }
            "--normalize" => out.normalize = true,
            "--coalesce" => out.coalesce = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn print_help() {
    eprintln!(
        r#"splatfilm-bench

Splats a deterministic sample set with every strategy and reports p50/p90/p99 per strategy,
plus a SHA-256 of each resulting buffer.

Usage:
  cargo run -q --release
  cargo run -q --release -- --filter tent --radius 1.5 --samples 1000000
  cargo run -q --release -- --threads 4 --coalesce --out report.json

Args:
  --width N        (default 64)
  --height N       (default 64)
  --channels N     (default 3)
  --samples N      (default 200000)
  --filter KIND    box|tent|gaussian (default gaussian)
  --radius R       filter radius (default 2.0; gaussian uses stddev = R/4)
  --warmup N       (default 1)
  --repeats N      (default 20)
  --threads N      worker threads (default auto)
  --seed N         sample generator seed
  --normalize      normalize splats by their total filter weight
  --coalesce       use the fixed, position-snapped footprint for batched scatter
  --out PATH       write the JSON report to PATH instead of stdout
"#
    );
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn parse_usize(v: Option<String>, flag: &str) -> anyhow::Result<usize> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<usize>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}
