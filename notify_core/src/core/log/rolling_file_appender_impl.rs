// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

/// Creates a file appender that never rolls over. Wrapping the result in
/// `tracing_appender::non_blocking` loses events from detached background threads that
/// outlive the guard, so the writer is used as-is.
///
/// # Errors
///
/// Returns an error if the path has no parent directory or no file name.
pub fn try_create_file_appender(
    path_str: &str,
) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = PathBuf::from(path_str);

    let parent = path
        .parent()
        .filter(|it| !it.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    let file_name = path.file_name().ok_or_else(|| {
        miette::miette!(
            "Can't use {} as a log file. It has no file name component.",
            path.display()
        )
    })?;

    Ok(tracing_appender::rolling::never(parent, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_without_file_name() {
        assert!(try_create_file_appender("/").is_err());
    }

    #[test]
    fn creates_file_under_parent_dir() {
        let dir = std::env::temp_dir().join(format!(
            "shell_notify_appender_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("appender.log");
        let result = try_create_file_appender(file_path.to_str().unwrap());
        assert!(result.is_ok());
        assert!(file_path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
