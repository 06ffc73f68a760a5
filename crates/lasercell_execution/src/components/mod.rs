//! Data carried through the execution pipeline.

mod buffer;
mod status;
mod task_point;

pub use buffer::TaskBuffer;
pub use status::{CalibResult, DeviceState, PrepareResult, ShapeType, WorkResult};
pub use task_point::{CalibPoint, HomePoint, TaskPoint};
