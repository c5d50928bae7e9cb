//! 统一错误处理框架
//!
//! 单次运行处理中所有致命错误的类型定义。重复运行号和拟合失败不属于错误，
//! 分别通过 `UpdateOutcome::Duplicate` 和全零拟合结果上报。

use std::fmt;
use std::io;

/// 激光刻度验证相关的统一错误类型
#[derive(Debug)]
pub enum LaserError {
    /// 输入验证错误（运行号、命令行参数）
    InvalidInput(String),

    /// 文件I/O错误（运行文件缺失、历史文件不可写）
    IoError(io::Error),

    /// 数据格式错误（JSON损坏、直方图维度不一致、历史文件行格式错误）
    FormatError(String),

    /// 运行文件中缺少预期对象（直方图、元数据字段）
    MissingObject(String),

    /// 计算异常
    CalculationError(String),

    /// 资源访问错误（线程池等）
    ResourceError(String),
}

impl fmt::Display for LaserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaserError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            LaserError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            LaserError::FormatError(msg) => write!(f, "数据格式错误: {msg}"),
            LaserError::MissingObject(msg) => write!(f, "缺少对象: {msg}"),
            LaserError::CalculationError(msg) => write!(f, "计算异常: {msg}"),
            LaserError::ResourceError(msg) => write!(f, "资源访问错误: {msg}"),
        }
    }
}

impl std::error::Error for LaserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaserError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LaserError {
    fn from(err: io::Error) -> Self {
        LaserError::IoError(err)
    }
}

impl From<serde_json::Error> for LaserError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            LaserError::IoError(io::Error::other(err))
        } else {
            LaserError::FormatError(format!("JSON解析错误: {err}"))
        }
    }
}

/// 激光验证操作的标准Result类型
pub type LaserResult<T> = Result<T, LaserError>;

// ==================== 错误转换Helper函数 ====================

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> LaserError {
    LaserError::FormatError(format!("{context}: {err}"))
}

/// 创建计算错误的helper函数
#[inline]
pub fn calculation_error<E: fmt::Display>(context: &str, err: E) -> LaserError {
    LaserError::CalculationError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量回填中的错误统计和退出码映射

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 格式相关错误（JSON损坏、维度不一致、历史行损坏）
    Format,
    /// 运行文件缺少预期对象
    MissingObject,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
    /// 计算相关错误
    Calculation,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从LaserError提取错误类别
    pub fn from_laser_error(e: &LaserError) -> Self {
        match e {
            LaserError::FormatError(_) => Self::Format,
            LaserError::MissingObject(_) => Self::MissingObject,
            LaserError::IoError(_) => Self::Io,
            LaserError::CalculationError(_) => Self::Calculation,
            LaserError::InvalidInput(_) | LaserError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::MissingObject => "对象缺失",
            Self::Io => "I/O错误",
            Self::Calculation => "计算错误",
            Self::Other => "其他错误",
        }
    }
}
