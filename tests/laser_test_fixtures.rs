//! 激光运行测试固件生成器
//!
//! 生成合成的JSON运行文件：单运行场景、回填目录（含损坏文件）。

#![allow(dead_code)]

use fs2::FileExt;
use laser_validation::core::histogram::{Histogram2D, TimeAxis};
use laser_validation::run_data::{RunData, RunFileRecord, RunMetadata, run_file_name};
use std::fs::{File, OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// 时间轴：501 bin，bin中心为 500..=1000 的整数
pub const TIME_BINS: usize = 501;
pub const TIME_MIN: f64 = 499.5;
pub const TIME_MAX: f64 = 1000.5;

/// 场景运行
pub const SCENARIO_RUN: u32 = 50000;
pub const SCENARIO_CHANNELS: usize = 2240;
pub const SCENARIO_ACTIVE_CHANNELS: usize = 900;
pub const SCENARIO_PEAK_HEIGHT: u32 = 5000;
pub const SCENARIO_TOTAL_ENTRIES: u32 = 900_000;
pub const SCENARIO_SIGMA: f64 = 71.5;

/// 幂等性测试运行
pub const IDEMPOTENT_RUN: u32 = 12345;

/// 回填目录中的运行：正常、正常、含一个分裂通道、JSON损坏、缺少直方图
pub const BACKFILL_GOOD_RUNS: [u32; 3] = [30001, 30002, 30003];
pub const BACKFILL_CORRUPT_RUN: u32 = 30004;
pub const BACKFILL_MISSING_HISTOGRAM_RUN: u32 = 30005;

fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

fn fixtures_base_dir() -> &'static PathBuf {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        let path = match std::env::var("LASER_FIXTURES_DIR") {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => PathBuf::from("tests/fixtures"),
        };
        create_dir_all(&path).expect("无法创建测试固件目录");
        path
    })
}

/// 单运行场景目录
pub fn scenario_dir() -> PathBuf {
    fixtures_base_dir().join("scenario")
}

/// 回填目录
pub fn backfill_dir() -> PathBuf {
    fixtures_base_dir().join("backfill")
}

/// 每个测试独立的历史文件路径（位于系统临时目录，先删除旧文件）
pub fn scratch_history(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "laser_it_{tag}_{}.csv",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

/// 确保所有固件生成完毕（幂等）
pub fn ensure_fixtures_generated() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        LaserTestFixtures::new().generate_all();
    });
}

/// 跨进程文件锁 + 进程内互斥，避免并发写入导致的截断文件。
struct FixtureLock {
    _mutex_guard: std::sync::MutexGuard<'static, ()>,
    lock_file: File,
}

impl FixtureLock {
    fn acquire() -> Self {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let mutex = MUTEX.get_or_init(|| Mutex::new(()));
        let guard = mutex.lock().expect("Fixture mutex poisoned");

        let lock_path = fixtures_base_dir().join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .expect("无法创建固件锁文件");
        file.lock_exclusive()
            .expect("无法获取固件文件锁，可能被其他进程占用");

        Self {
            _mutex_guard: guard,
            lock_file: file,
        }
    }
}

impl Drop for FixtureLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

/// 整数化的对称高斯模板（偏移, 计数），总和精确等于 `entries`
///
/// 两侧按比例向下取整保持对称，余数全部加到中心bin。
pub fn gaussian_template(entries: u32, sigma: f64, half_bins: i64) -> Vec<(i64, u32)> {
    let weight = |k: i64| (-0.5 * (k as f64 / sigma).powi(2)).exp();
    let total: f64 = (-half_bins..=half_bins).map(weight).sum();

    let mut template: Vec<(i64, u32)> = (-half_bins..=half_bins)
        .map(|k| {
            let count = if k == 0 {
                0
            } else {
                (entries as f64 * weight(k) / total).floor() as u32
            };
            (k, count)
        })
        .collect();

    let sides: u32 = template.iter().map(|&(_, c)| c).sum();
    if let Some(center) = template.iter_mut().find(|(k, _)| *k == 0) {
        center.1 = entries - sides;
    }
    template
}

/// 单通道计数行：模板放在 `center` 时间处
pub fn channel_row(template: &[(i64, u32)], center: f64) -> Vec<u32> {
    let mut row = vec![0u32; TIME_BINS];
    let center_index = (center - (TIME_MIN + 0.5)).round() as i64;
    for &(k, count) in template {
        let index = center_index + k;
        if (0..TIME_BINS as i64).contains(&index) {
            row[index as usize] += count;
        }
    }
    row
}

/// 在峰右侧挖出空隙并补一个小峰（形成分裂峰）
pub fn split_row(center: f64) -> Vec<u32> {
    let mut row = channel_row(&gaussian_template(1000, 2.0, 12), center);
    let c = (center - (TIME_MIN + 0.5)).round() as usize;
    row[c + 1] = 0;
    row[c + 2] = 0;
    row[c + 3] = 150;
    row[c + 4] = 120;
    row[c + 5] = 60;
    row
}

/// 组装运行数据
pub fn build_run(run: u32, rows: Vec<Vec<u32>>, n_live_pmts: u32, tt8_events: u64) -> RunData {
    let channels = rows.len();
    let counts: Vec<u32> = rows.into_iter().flatten().collect();
    let axis = TimeAxis::new(TIME_BINS, TIME_MIN, TIME_MAX).expect("时间轴无效");
    RunData {
        run,
        metadata: RunMetadata {
            n_live_pmts,
            tt8_events,
        },
        histogram: Histogram2D::new(channels, axis, counts).expect("直方图维度不一致"),
    }
}

/// 场景运行的全局投影：峰在750.0，峰高5000，总条目900000
///
/// σ=71.5 的宽峰逐bin向下取整，差额以对称底座的形式补在距峰25个bin之外，
/// 保证峰值bin唯一且拟合窗口内的数据关于750对称。
pub fn scenario_projection() -> Vec<u32> {
    let peak_index = (750.0 - (TIME_MIN + 0.5)) as usize;
    let mut profile: Vec<u32> = (0..TIME_BINS)
        .map(|i| {
            let x = TIME_MIN + 0.5 + i as f64;
            let u = (x - 750.0) / SCENARIO_SIGMA;
            (SCENARIO_PEAK_HEIGHT as f64 * (-0.5 * u * u).exp()).floor() as u32
        })
        .collect();

    let sum: u32 = profile.iter().sum();
    let mut deficit = SCENARIO_TOTAL_ENTRIES - sum;
    let max_offset = peak_index.min(TIME_BINS - 1 - peak_index);
    let mut offset = 26;
    while deficit >= 2 {
        profile[peak_index - offset] += 1;
        profile[peak_index + offset] += 1;
        deficit -= 2;
        offset = if offset == max_offset { 26 } else { offset + 1 };
    }
    if deficit == 1 {
        profile[TIME_BINS - 1] += 1;
    }
    profile
}

/// 场景运行：2240通道，前900个通道平分全局投影，其余通道为空
///
/// 每个bin的计数在900个通道间轮转分配，单通道峰宽远大于±12 bin，不构成分裂峰。
pub fn scenario_run() -> RunData {
    let projection = scenario_projection();
    let active = SCENARIO_ACTIVE_CHANNELS as u32;
    let rows = (0..SCENARIO_CHANNELS)
        .map(|c| {
            if c < SCENARIO_ACTIVE_CHANNELS {
                projection
                    .iter()
                    .enumerate()
                    .map(|(bin, &total)| {
                        let extra = ((c + bin) % SCENARIO_ACTIVE_CHANNELS) < (total % active) as usize;
                        total / active + u32::from(extra)
                    })
                    .collect()
            } else {
                vec![0; TIME_BINS]
            }
        })
        .collect();
    build_run(SCENARIO_RUN, rows, 1800, 1_000_000)
}

/// 小型运行：10个通道，峰值在 `center`，`split_channels` 个通道为分裂峰
pub fn small_run(run: u32, center: f64, split_channels: usize) -> RunData {
    let template = gaussian_template(1000, 2.0, 12);
    let rows = (0..10)
        .map(|c| {
            if c < split_channels {
                split_row(center)
            } else {
                channel_row(&template, center)
            }
        })
        .collect();
    build_run(run, rows, 1750, 250_000)
}

/// 原子写出（先写临时文件再重命名）
fn write_atomic(path: &Path, write: impl FnOnce(&Path)) {
    let tmp = path.with_extension("tmp");
    write(&tmp);
    std::fs::rename(&tmp, path).expect("无法重命名固件文件");
}

fn write_run(dir: &Path, data: &RunData) {
    let path = dir.join(run_file_name(data.run));
    write_atomic(&path, |tmp| {
        RunFileRecord::from_run_data(data)
            .write(tmp)
            .expect("无法写出运行文件")
    });
}

/// 测试固件生成器
pub struct LaserTestFixtures {
    fixtures_dir: PathBuf,
}

impl LaserTestFixtures {
    pub fn new() -> Self {
        Self {
            fixtures_dir: fixtures_base_dir().clone(),
        }
    }

    /// 生成所有测试固件
    pub fn generate_all(&self) {
        let _guard = FixtureLock::acquire();

        log("开始生成激光运行测试固件...", "Generating laser run fixtures...");

        let scenario = scenario_dir();
        create_dir_all(&scenario).expect("无法创建场景目录");
        write_run(&scenario, &scenario_run());
        write_run(&scenario, &small_run(IDEMPOTENT_RUN, 745.0, 0));

        let backfill = backfill_dir();
        create_dir_all(backfill.join("nested")).expect("无法创建回填目录");
        write_run(&backfill, &small_run(BACKFILL_GOOD_RUNS[0], 700.0, 0));
        write_run(&backfill.join("nested"), &small_run(BACKFILL_GOOD_RUNS[1], 760.0, 0));
        write_run(&backfill, &small_run(BACKFILL_GOOD_RUNS[2], 730.0, 1));

        let corrupt = backfill.join(run_file_name(BACKFILL_CORRUPT_RUN));
        write_atomic(&corrupt, |tmp| {
            std::fs::write(tmp, "{ \"n_live_pmts\": 1800, ").expect("无法写出损坏文件")
        });

        let missing = backfill.join(run_file_name(BACKFILL_MISSING_HISTOGRAM_RUN));
        write_atomic(&missing, |tmp| {
            std::fs::write(tmp, "{ \"n_live_pmts\": 1800, \"tt8_events\": 1000 }")
                .expect("无法写出缺失直方图的文件")
        });

        std::fs::write(backfill.join("README.txt"), "not a run file").expect("无法写出说明文件");

        log(
            format!("固件目录: {}", self.fixtures_dir.display()),
            "Fixtures ready",
        );
    }
}
