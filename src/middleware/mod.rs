pub mod profiler;

pub use profiler::{capture, Profiler};
