//! Tests for the process-wide logger
//!
//! Kept in their own binary so no other test installs a global logger first.

use rust_structured_logger::global;
use rust_structured_logger::prelude::*;
use std::sync::Arc;

#[test]
fn test_global_logger_lifecycle() {
    assert!(!global::is_configured());
    let before = global::logger();
    assert!(!before.enabled(Level::Fatal));
    before.error("dropped", &[]);

    let sink = MemorySink::new();
    let logger = Logger::builder()
        .output(Arc::new(sink.clone()))
        .stub_time()
        .build();
    global::configure(logger).unwrap();
    assert!(global::is_configured());

    global::logger().info("hello", &[Field::int("n", 1)]);
    assert_eq!(
        sink.contents(),
        "{\"msg\":\"hello\",\"level\":\"info\",\"ts\":0,\"fields\":{\"n\":1}}\n"
    );

    let err = global::configure(Logger::nop()).unwrap_err();
    assert!(matches!(err, LoggerError::AlreadyConfigured));

    // The first logger stays installed
    global::logger().info("again", &[]);
    assert_eq!(sink.lines().len(), 2);
}
