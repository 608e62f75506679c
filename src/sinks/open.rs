//! Resolve output paths to sinks

use super::{combine, FileSink, StderrSink, StdoutSink, WriteSyncer};
use crate::core::{LoggerError, MultiError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Named sinks consulted before a path is treated as a file
pub type SinkRegistry = HashMap<String, Arc<dyn WriteSyncer>>;

/// Registry holding `"stdout"` and `"stderr"`
pub fn default_sinks() -> SinkRegistry {
    let mut sinks = SinkRegistry::with_capacity(2);
    sinks.insert("stdout".to_string(), Arc::new(StdoutSink));
    sinks.insert("stderr".to_string(), Arc::new(StderrSink));
    sinks
}

/// Open every path and combine them into one sink
///
/// `"stdout"` and `"stderr"` name the standard streams; anything else is a
/// file opened for appending. Every path is attempted and all failures are
/// reported together; on failure nothing is returned.
///
/// # Example
///
/// ```
/// use rust_structured_logger::sinks::open;
///
/// let sink = open(&["stdout", "stderr"]).unwrap();
/// assert!(open(&["/no/such/dir/app.log"]).is_err());
/// ```
pub fn open<S: AsRef<str>>(paths: &[S]) -> Result<Arc<dyn WriteSyncer>> {
    open_with_sinks(&default_sinks(), paths)
}

/// Like [`open`], resolving names through `registry` first
///
/// # Example
///
/// ```
/// use rust_structured_logger::sinks::{default_sinks, open_with_sinks, MemorySink, WriteSyncer};
/// use std::sync::Arc;
///
/// let audit = MemorySink::new();
/// let mut registry = default_sinks();
/// registry.insert("audit".to_string(), Arc::new(audit.clone()));
///
/// let sink = open_with_sinks(&registry, &["audit"]).unwrap();
/// sink.write(b"granted\n").unwrap();
/// assert_eq!(audit.contents(), "granted\n");
/// ```
pub fn open_with_sinks<S: AsRef<str>>(
    registry: &SinkRegistry,
    paths: &[S],
) -> Result<Arc<dyn WriteSyncer>> {
    let mut sinks: Vec<Arc<dyn WriteSyncer>> = Vec::with_capacity(paths.len());
    let mut errs = MultiError::default();

    for path in paths {
        let path = path.as_ref();
        if let Some(sink) = registry.get(path) {
            sinks.push(Arc::clone(sink));
            continue;
        }
        match FileSink::new(path) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(err) => errs.push(LoggerError::sink(path, err.to_string())),
        }
    }

    errs.into_result()?;
    Ok(combine(sinks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use tempfile::tempdir;

    #[test]
    fn test_single_path_is_not_wrapped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        let sink = open(&[path.to_str().unwrap()]).unwrap();
        sink.write(b"x\n").unwrap();
        sink.sync().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn test_fan_out_to_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        let paths = vec![a.display().to_string(), b.display().to_string()];
        let sink = open(paths.as_slice()).unwrap();
        sink.write(b"both\n").unwrap();
        sink.sync().unwrap();
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "both\n");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "both\n");
    }

    #[test]
    fn test_all_failures_are_reported() {
        let dir = tempdir().unwrap();
        let bad1 = dir.path().join("missing1").join("a.log");
        let bad2 = dir.path().join("missing2").join("b.log");
        let paths = [
            bad1.display().to_string(),
            "stdout".to_string(),
            bad2.display().to_string(),
        ];
        let err = match open(&paths) {
            Ok(_) => panic!("expected failure"),
            Err(err) => err,
        };
        match err {
            LoggerError::Multiple(list) => assert_eq!(list.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_registry_is_consulted_before_files() {
        let dir = tempdir().unwrap();
        let named = MemorySink::new();
        let file = dir.path().join("c.log");
        let mut registry = default_sinks();
        registry.insert("capture".to_string(), Arc::new(named.clone()));

        let paths = ["capture".to_string(), file.display().to_string()];
        let sink = open_with_sinks(&registry, &paths).unwrap();
        sink.write(b"shared\n").unwrap();
        sink.sync().unwrap();

        assert_eq!(named.contents(), "shared\n");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "shared\n");
        assert!(!dir.path().join("capture").exists());
    }

    #[test]
    fn test_empty_registry_treats_stdout_as_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stdout");
        let name = path.display().to_string();
        let sink = open_with_sinks(&SinkRegistry::new(), &[name.as_str()]).unwrap();
        sink.write(b"f\n").unwrap();
        sink.sync().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "f\n");
    }

    #[test]
    fn test_empty_paths_discard() {
        let sink = open::<&str>(&[]).unwrap();
        assert_eq!(sink.write(b"gone").unwrap(), 4);
    }
}
