//! 核心模块
//! 包含与 Web 框架解耦的模型与运行时抽象

pub mod models;
pub mod traits;

// 重导出常用类型
pub use traits::{Clock, ManualClock, SystemClock};
