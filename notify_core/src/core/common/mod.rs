// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod common_atomic;
pub mod common_enums;
pub mod common_wake_pipe;

// Re-export.
pub use common_atomic::*;
pub use common_enums::*;
pub use common_wake_pipe::*;
