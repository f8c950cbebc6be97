// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod sync_fixtures;

// Re-export.
pub use sync_fixtures::*;
