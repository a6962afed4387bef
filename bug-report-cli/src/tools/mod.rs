//! Optional diagnostic tools: what exists, what to install, what to skip

pub mod installer;
pub mod inventory;
pub mod registry;
pub mod resolver;

pub use installer::{Apt, PackageManager};
pub use inventory::{ToolCheck, check_tools};
pub use registry::{Registry, ToolRequirement};
pub use resolver::{Availability, Decision, Resolution, ResolvedTool, SkipReason, resolve};
