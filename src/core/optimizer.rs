//! 有界最小化器
//!
//! 基于argmin的L-BFGS + More-Thuente线搜索，边界通过截断参数实现，
//! 在边界上指向外侧的梯度分量置零（投影梯度）。

use crate::error::{LaserError, LaserResult, calculation_error};
use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use std::fmt;

/// 优化器配置
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// 最大迭代次数
    pub max_iter: u64,
    /// 梯度范数收敛容差
    pub tol: f64,
    /// L-BFGS历史修正对数
    pub m: usize,
    /// 求解器未报告收敛时，投影梯度范数低于此值仍视为收敛
    pub gradient_acceptance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-8,
            m: 10,
            gradient_acceptance: 1e-5,
        }
    }
}

/// 最小化结果
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// 最优参数（已截断到边界内）
    pub parameters: Vec<f64>,
    /// 最优点函数值
    pub fval: f64,
    /// 迭代次数
    pub n_iter: u64,
    /// 是否收敛
    pub converged: bool,
    /// 终止原因
    pub message: String,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptimizationResult(fval={:.6e}, n_iter={}, converged={}, {})",
            self.fval, self.n_iter, self.converged, self.message
        )
    }
}

/// 目标函数trait
pub trait ObjectiveFunction: Send + Sync {
    /// 计算目标函数值
    fn eval(&self, params: &[f64]) -> f64;

    /// 计算梯度（默认中心差分）
    fn gradient(&self, params: &[f64]) -> Vec<f64> {
        let mut grad = vec![0.0; params.len()];
        let mut probe = params.to_vec();
        for i in 0..params.len() {
            let eps = 1e-7 * params[i].abs().max(1.0);
            probe[i] = params[i] + eps;
            let f_plus = self.eval(&probe);
            probe[i] = params[i] - eps;
            let f_minus = self.eval(&probe);
            probe[i] = params[i];
            grad[i] = (f_plus - f_minus) / (2.0 * eps);
        }
        grad
    }
}

fn clamp_params(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params
        .iter()
        .zip(bounds.iter())
        .map(|(&v, &(lo, hi))| v.clamp(lo, hi))
        .collect()
}

/// 边界上指向外侧的梯度分量置零
fn project_gradient(params: &[f64], grad: &mut [f64], bounds: &[(f64, f64)]) {
    const EPS: f64 = 1e-12;
    for (i, (&x, &(lo, hi))) in params.iter().zip(bounds.iter()).enumerate() {
        if x <= lo + EPS && grad[i] > 0.0 {
            grad[i] = 0.0;
        }
        if x >= hi - EPS && grad[i] < 0.0 {
            grad[i] = 0.0;
        }
    }
}

/// argmin适配器
struct ArgminProblem<'a> {
    objective: &'a dyn ObjectiveFunction,
    bounds: &'a [(f64, f64)],
}

impl CostFunction for ArgminProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let clamped = clamp_params(params, self.bounds);
        Ok(self.objective.eval(&clamped))
    }
}

impl Gradient for ArgminProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        let clamped = clamp_params(params, self.bounds);
        let mut g = self.objective.gradient(&clamped);
        project_gradient(&clamped, &mut g, self.bounds);
        Ok(g)
    }
}

/// 带边界约束的L-BFGS最小化器
pub struct BoundedLbfgs {
    config: OptimizerConfig,
}

impl BoundedLbfgs {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// 在边界内最小化目标函数
    ///
    /// # 参数
    /// * `objective` - 目标函数
    /// * `init_params` - 初始参数
    /// * `bounds` - 每个参数的 (下界, 上界)
    pub fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        init_params: &[f64],
        bounds: &[(f64, f64)],
    ) -> LaserResult<OptimizationResult> {
        if init_params.len() != bounds.len() {
            return Err(LaserError::InvalidInput(format!(
                "参数与边界数量不一致: {} != {}",
                init_params.len(),
                bounds.len()
            )));
        }
        if bounds.iter().any(|&(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi) {
            return Err(LaserError::InvalidInput(format!("边界无效: {bounds:?}")));
        }

        let init_clamped = clamp_params(init_params, bounds);
        let problem = ArgminProblem { objective, bounds };

        let linesearch = MoreThuenteLineSearch::new();
        let tol_cost = if self.config.tol == 0.0 {
            0.0
        } else {
            (0.1 * self.config.tol).max(1e-14)
        };
        let solver = LBFGS::new(linesearch, self.config.m)
            .with_tolerance_grad(self.config.tol)
            .map_err(|e| LaserError::InvalidInput(format!("优化器配置无效 (tol): {e}")))?
            .with_tolerance_cost(tol_cost)
            .map_err(|e| LaserError::InvalidInput(format!("优化器配置无效 (tol_cost): {e}")))?;

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(init_clamped).max_iters(self.config.max_iter))
            .run()
            .map_err(|e| calculation_error("最小化失败", e))?;

        let state = res.state();
        let best_unclamped = state
            .get_best_param()
            .ok_or_else(|| LaserError::CalculationError("未找到最优参数".to_string()))?;
        let parameters = clamp_params(best_unclamped, bounds);
        let fval = state.get_best_cost();
        let n_iter = state.get_iter();

        let termination = state.get_termination_status();
        let solver_converged = matches!(
            termination,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
        );

        let mut grad = objective.gradient(&parameters);
        project_gradient(&parameters, &mut grad, bounds);
        let grad_norm = grad.iter().map(|g| g * g).sum::<f64>().sqrt();

        let converged =
            fval.is_finite() && (solver_converged || grad_norm < self.config.gradient_acceptance);

        Ok(OptimizationResult {
            parameters,
            fval,
            n_iter,
            converged,
            message: format!("{termination}, |g|={grad_norm:.2e}"),
        })
    }
}

impl Default for BoundedLbfgs {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
