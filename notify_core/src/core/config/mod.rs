// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod notify_tunables;

// Re-export.
pub use notify_tunables::*;
