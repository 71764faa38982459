//! Recording collaborator contract for compile/execute coverage
//!
//! Generated plans report which paths were compiled and which executed, keyed
//! per logical converter identity. The core only consumes the sink through
//! the `Recorder` trait, threaded as an explicit handle; how records are
//! stored or reported is the collaborator's business. The in-crate
//! `CoverageRecorder` is a thread-safe reference implementation used by
//! coverage tooling and tests.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

/// Sink for compile-time and run-time path records
///
/// Implementations must provide thread-safe accumulation: compiled plans run
/// concurrently and may report against the same logical record tree.
pub trait Recorder: Send + Sync {
    /// Record that `path` was compiled with the given value expression
    fn record_compiling(&self, converter: &str, path: &str, value: &str, excluded: bool);

    /// Record that `path` executed at runtime with the given value expression
    fn record_executing(&self, converter: &str, path: &str, value: &str);
}

/// A recorder that drops everything
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record_compiling(&self, _converter: &str, _path: &str, _value: &str, _excluded: bool) {}

    fn record_executing(&self, _converter: &str, _path: &str, _value: &str) {}
}

/// One node of an aggregated coverage record tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordNode {
    pub compiled: usize,
    pub executed: usize,
    pub excluded: bool,
    pub values: Vec<String>,
    pub children: BTreeMap<String, RecordNode>,
}

/// Thread-safe in-memory coverage recorder
///
/// Aggregates records into a tree of named nodes per converter, keyed by the
/// segments of each canonical path, with compiled and executed counts.
#[derive(Debug, Default)]
pub struct CoverageRecorder {
    converters: Mutex<BTreeMap<String, RecordNode>>,
}

impl CoverageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the record tree for one converter
    pub fn report(&self, converter: &str) -> Option<RecordNode> {
        self.converters
            .lock()
            .expect("coverage recorder poisoned")
            .get(converter)
            .cloned()
    }

    fn with_node(&self, converter: &str, path: &str, update: impl FnOnce(&mut RecordNode)) {
        let mut converters = self.converters.lock().expect("coverage recorder poisoned");
        let mut node = converters.entry(converter.to_string()).or_default();
        for segment in path.split('.').filter(|s| !s.is_empty() && *s != "$") {
            node = node.children.entry(segment.to_string()).or_default();
        }
        update(node);
    }
}

impl Recorder for CoverageRecorder {
    fn record_compiling(&self, converter: &str, path: &str, value: &str, excluded: bool) {
        self.with_node(converter, path, |node| {
            if excluded {
                node.excluded = true;
            } else {
                node.compiled += 1;
            }
            if !node.values.iter().any(|v| v == value) {
                node.values.push(value.to_string());
            }
        });
    }

    fn record_executing(&self, converter: &str, path: &str, value: &str) {
        self.with_node(converter, path, |node| {
            node.executed += 1;
            if !node.values.iter().any(|v| v == value) {
                node.values.push(value.to_string());
            }
        });
    }
}
