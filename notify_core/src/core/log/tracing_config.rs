// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_core::LevelFilter;

/// Where tracing output goes and how much of it.
///
/// Use [`TracingConfig::install_global`] from `main()`, or
/// [`TracingConfig::install_thread_local`] from a test that wants to see the
/// `DEBUG_*` gated events from the background threads it drives.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    File(String /* tracing_log_file_path */),
    DisplayAndFile(DisplayPreference, String /* tracing_log_file_path */),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayPreference {
    Stdout,
    #[default]
    Stderr,
}

impl TracingConfig {
    #[must_use]
    pub fn new_display(display_preference: DisplayPreference) -> Self {
        Self {
            writer_config: WriterConfig::Display(display_preference),
            level_filter: LevelFilter::DEBUG,
        }
    }

    #[must_use]
    pub fn new_file(file_path: impl Into<String>) -> Self {
        Self {
            writer_config: WriterConfig::File(file_path.into()),
            level_filter: LevelFilter::DEBUG,
        }
    }

    #[must_use]
    pub fn with_level_filter(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self
    }

    #[must_use]
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { self.level_filter }
}

impl WriterConfig {
    /// Combine an optional display target and an optional file path. Both absent means
    /// [`WriterConfig::None`].
    #[must_use]
    pub fn from_parts(
        display: Option<DisplayPreference>,
        file_path: Option<String>,
    ) -> Self {
        match (display, file_path) {
            (None, None) => WriterConfig::None,
            (Some(display), None) => WriterConfig::Display(display),
            (None, Some(path)) => WriterConfig::File(path),
            (Some(display), Some(path)) => WriterConfig::DisplayAndFile(display, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, None => WriterConfig::None)]
    #[test_case(Some(DisplayPreference::Stdout), None
        => WriterConfig::Display(DisplayPreference::Stdout))]
    #[test_case(None, Some("a.log".into()) => WriterConfig::File("a.log".into()))]
    #[test_case(Some(DisplayPreference::Stderr), Some("a.log".into())
        => WriterConfig::DisplayAndFile(DisplayPreference::Stderr, "a.log".into()))]
    fn writer_config_from_parts(
        display: Option<DisplayPreference>,
        file_path: Option<String>,
    ) -> WriterConfig {
        WriterConfig::from_parts(display, file_path)
    }

    #[test]
    fn level_filter_builder() {
        let it = TracingConfig::new_display(DisplayPreference::Stderr)
            .with_level_filter(LevelFilter::WARN);
        assert_eq!(it.get_level_filter(), LevelFilter::WARN);
    }
}
