//! 峰形拟合：对称高斯与非对称（双侧sigma）高斯
//!
//! 两种拟合都对直方图窗口做分bin泊松似然拟合，最小化Baker-Cousins似然比
//! `2·Σ[f - n + n·ln(n/f)]`（按窗口条目数归一化）。
//!
//! ## 质量判定
//!
//! - 对称高斯：不拒绝结果，仅报告收敛状态
//! - 非对称高斯：未收敛、`sL <= 0`、`sL > 10` 或 `sR > 10` 时四个参数全部置零

use super::histogram::Projection;
use super::optimizer::{BoundedLbfgs, ObjectiveFunction, OptimizerConfig};
use super::projection_stats::ProjectionStats;
use crate::tools::constants::laser_analysis;
use std::f64::consts::PI;

/// 模型值下限，避免 ln(0)
const MODEL_FLOOR: f64 = 1e-12;

/// sigma下界（开区间 (0, …] 的数值实现）
const SIGMA_FLOOR: f64 = 1e-6;

/// 对称高斯参数 `A·exp(-0.5·((x-μ)/σ)²)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GaussParams {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
}

impl GaussParams {
    /// 在x处求值
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.mean) / self.sigma;
        self.amplitude * (-0.5 * u * u).exp()
    }

    /// 峰面积 A·σ·sqrt(2π)
    #[inline]
    pub fn area(&self) -> f64 {
        self.amplitude * self.sigma * (2.0 * PI).sqrt()
    }
}

/// 非对称高斯参数
///
/// `f(x) = 2·N / sqrt(2π) / ((sL+sR)/2) · exp(-0.5·((x-μ)/σ_side)²)`，
/// `x <= μ` 时 `σ_side = sL`，否则 `σ_side = sR`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkewGaussParams {
    pub amplitude: f64,
    pub mean: f64,
    pub left_sigma: f64,
    pub right_sigma: f64,
}

impl SkewGaussParams {
    /// 全零哨兵：表示"没有可用的非对称峰形"
    pub const REJECTED: Self = Self {
        amplitude: 0.0,
        mean: 0.0,
        left_sigma: 0.0,
        right_sigma: 0.0,
    };

    /// 在x处求值
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let s_avg = 0.5 * (self.left_sigma + self.right_sigma);
        let sigma = if x <= self.mean {
            self.left_sigma
        } else {
            self.right_sigma
        };
        let u = (x - self.mean) / sigma;
        2.0 * self.amplitude / (2.0 * PI).sqrt() / s_avg * (-0.5 * u * u).exp()
    }

    /// 是否为全零哨兵
    #[inline]
    pub fn is_rejected(&self) -> bool {
        *self == Self::REJECTED
    }

    /// sigma物理合理性检查
    pub fn is_physical(&self) -> bool {
        let limit = laser_analysis::SKEW_SIGMA_SANITY_LIMIT;
        self.left_sigma > 0.0 && self.left_sigma <= limit && self.right_sigma <= limit
    }
}

/// 拟合结果：参数 + 收敛状态
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome<P> {
    pub params: P,
    pub converged: bool,
    /// 警告信息（未收敛、结果被拒绝）
    pub warning: Option<String>,
}

// ==================== 似然目标函数 ====================

/// 窗口数据上的Baker-Cousins似然比（内部坐标：幅度按初值缩放）
///
/// 内部参数 `z[0] = amplitude / amplitude_scale`，其余参数为物理值
struct PoissonObjective<M> {
    points: Vec<(f64, f64)>,
    amplitude_scale: f64,
    norm: f64,
    model: M,
}

/// 峰形模型：求值与对物理参数的偏导
trait PeakModel: Send + Sync {
    fn value_and_gradient(&self, x: f64, params: &[f64], grad: &mut [f64]) -> f64;
}

struct GaussModel;

impl PeakModel for GaussModel {
    fn value_and_gradient(&self, x: f64, p: &[f64], grad: &mut [f64]) -> f64 {
        let (a, mu, sigma) = (p[0], p[1], p[2]);
        let u = (x - mu) / sigma;
        let e = (-0.5 * u * u).exp();
        let f = a * e;
        grad[0] = e;
        grad[1] = f * u / sigma;
        grad[2] = f * u * u / sigma;
        f
    }
}

struct SkewGaussModel;

impl PeakModel for SkewGaussModel {
    fn value_and_gradient(&self, x: f64, p: &[f64], grad: &mut [f64]) -> f64 {
        let (n, mu, s_left, s_right) = (p[0], p[1], p[2], p[3]);
        let s_avg = 0.5 * (s_left + s_right);
        let left = x <= mu;
        let sigma = if left { s_left } else { s_right };
        let u = (x - mu) / sigma;
        let norm = 2.0 / (2.0 * PI).sqrt() / s_avg;
        let e = (-0.5 * u * u).exp();
        let f = n * norm * e;
        grad[0] = norm * e;
        grad[1] = f * u / sigma;
        let side_term = f * u * u / sigma;
        grad[2] = -0.5 * f / s_avg + if left { side_term } else { 0.0 };
        grad[3] = -0.5 * f / s_avg + if left { 0.0 } else { side_term };
        f
    }
}

impl<M: PeakModel> PoissonObjective<M> {
    fn new(points: Vec<(f64, f64)>, amplitude_scale: f64, model: M) -> Self {
        let entries: f64 = points.iter().map(|&(_, n)| n).sum();
        Self {
            points,
            amplitude_scale,
            norm: entries.max(1.0),
            model,
        }
    }

    fn to_physical(&self, z: &[f64]) -> Vec<f64> {
        let mut p = z.to_vec();
        p[0] *= self.amplitude_scale;
        p
    }
}

impl<M: PeakModel> ObjectiveFunction for PoissonObjective<M> {
    fn eval(&self, z: &[f64]) -> f64 {
        let p = self.to_physical(z);
        let mut scratch = vec![0.0; p.len()];
        let mut chi2 = 0.0;
        for &(x, n) in &self.points {
            let f = self
                .model
                .value_and_gradient(x, &p, &mut scratch)
                .max(MODEL_FLOOR);
            chi2 += f - n;
            if n > 0.0 {
                chi2 += n * (n / f).ln();
            }
        }
        2.0 * chi2 / self.norm
    }

    fn gradient(&self, z: &[f64]) -> Vec<f64> {
        let p = self.to_physical(z);
        let mut df = vec![0.0; p.len()];
        let mut grad = vec![0.0; p.len()];
        for &(x, n) in &self.points {
            let f = self.model.value_and_gradient(x, &p, &mut df);
            let weight = 1.0 - n / f.max(MODEL_FLOOR);
            for (g, d) in grad.iter_mut().zip(&df) {
                *g += weight * d;
            }
        }
        grad[0] *= self.amplitude_scale;
        for g in &mut grad {
            *g *= 2.0 / self.norm;
        }
        grad
    }
}

fn amplitude_scale(guess: f64) -> f64 {
    if guess.is_finite() && guess > 1.0 {
        guess
    } else {
        1.0
    }
}

// ==================== 对称高斯 ====================

/// 对称高斯拟合
///
/// 窗口：bin中心在 `max_x ± 12` 内且落在函数定义域 [500, 1000] 中。
/// 初值：A = 峰值bin ±20 bin积分，μ = max_x，σ = 3。
pub fn fit_gaus(projection: &Projection, stats: &ProjectionStats) -> FitOutcome<GaussParams> {
    let half = laser_analysis::GAUS_FIT_HALF_WIDTH;
    let (domain_lo, domain_hi) = laser_analysis::GAUS_DOMAIN;
    let initial = GaussParams {
        amplitude: stats.peak_integral(projection, laser_analysis::GAUS_AMPLITUDE_HALF_BINS),
        mean: stats.max_x,
        sigma: laser_analysis::GAUS_INITIAL_SIGMA,
    };

    let lo = (stats.max_x - half).max(domain_lo);
    let hi = (stats.max_x + half).min(domain_hi);
    let points = match projection.bins_with_centers_in(lo, hi) {
        Some((first, last)) => projection.points(first, last),
        None => Vec::new(),
    };
    if points.iter().all(|&(_, n)| n <= 0.0) {
        return FitOutcome {
            params: initial,
            converged: false,
            warning: Some("高斯拟合窗口内无条目 / Gaussian fit window is empty".to_string()),
        };
    }

    let scale = amplitude_scale(initial.amplitude);
    let objective = PoissonObjective::new(points, scale, GaussModel);
    let init = [initial.amplitude / scale, initial.mean, initial.sigma];
    let bounds = [
        (0.0, f64::INFINITY),
        (f64::NEG_INFINITY, f64::INFINITY),
        (SIGMA_FLOOR, f64::INFINITY),
    ];

    match BoundedLbfgs::new(OptimizerConfig::default()).minimize(&objective, &init, &bounds) {
        Ok(result) => {
            let params = GaussParams {
                amplitude: result.parameters[0] * scale,
                mean: result.parameters[1],
                sigma: result.parameters[2],
            };
            let warning = (!result.converged)
                .then(|| format!("高斯拟合未收敛 / Gaussian fit did not converge: {}", result.message));
            FitOutcome {
                params,
                converged: result.converged,
                warning,
            }
        }
        Err(e) => FitOutcome {
            params: initial,
            converged: false,
            warning: Some(format!("高斯拟合失败 / Gaussian fit failed: {e}")),
        },
    }
}

// ==================== 非对称高斯 ====================

/// 非对称高斯拟合
///
/// 窗口：bin中心在 `max_x ± 25` 内。均值和RMS在同一窗口内计算后作为初值：
/// N = 总条目数，μ = 均值，sL = sR = RMS。
/// 边界：μ ∈ 均值 ± 3·RMS，sL, sR ∈ (0, 1000]。
pub fn fit_skew_gaus(
    projection: &Projection,
    stats: &ProjectionStats,
) -> FitOutcome<SkewGaussParams> {
    let half = laser_analysis::SKEW_FIT_HALF_WIDTH;

    let Some((mean, rms)) = stats.windowed_mean_rms(projection, half) else {
        return rejected("非对称高斯拟合窗口内无条目 / skew Gaussian fit window is empty");
    };

    let points = match projection.bins_with_centers_in(stats.max_x - half, stats.max_x + half) {
        Some((first, last)) => projection.points(first, last),
        None => Vec::new(),
    };

    let sigma_init = rms.max(SIGMA_FLOOR);
    let scale = amplitude_scale(stats.total_entries);
    let objective = PoissonObjective::new(points, scale, SkewGaussModel);
    let limit = laser_analysis::SKEW_MEAN_RMS_LIMIT * rms;
    let init = [stats.total_entries / scale, mean, sigma_init, sigma_init];
    let bounds = [
        (0.0, f64::INFINITY),
        (mean - limit, mean + limit),
        (SIGMA_FLOOR, laser_analysis::SKEW_SIGMA_UPPER),
        (SIGMA_FLOOR, laser_analysis::SKEW_SIGMA_UPPER),
    ];

    let result = match BoundedLbfgs::new(OptimizerConfig::default()).minimize(&objective, &init, &bounds) {
        Ok(result) => result,
        Err(e) => return rejected(&format!("非对称高斯拟合失败 / skew Gaussian fit failed: {e}")),
    };

    let params = SkewGaussParams {
        amplitude: result.parameters[0] * scale,
        mean: result.parameters[1],
        left_sigma: result.parameters[2],
        right_sigma: result.parameters[3],
    };

    if !result.converged || !params.is_physical() {
        // 收敛状态如实保留，拒绝只体现在全零参数上
        return FitOutcome {
            converged: result.converged,
            ..rejected(&format!(
                "!! WARNING: bad fit! zero returned! (converged={}, sL={:.3}, sR={:.3})",
                result.converged, params.left_sigma, params.right_sigma
            ))
        };
    }

    FitOutcome {
        params,
        converged: true,
        warning: None,
    }
}

fn rejected(reason: &str) -> FitOutcome<SkewGaussParams> {
    FitOutcome {
        params: SkewGaussParams::REJECTED,
        converged: false,
        warning: Some(reason.to_string()),
    }
}
