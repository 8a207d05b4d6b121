#![allow(dead_code)]

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use vellum::{
    ComponentCompiler, ComponentDefinition, CompilerConfiguration,
    diagnostics::{Diagnostic, DiagnosticsAggregator},
};

/// Compiler with default settings, independent of `VELLUM_*` variables.
pub fn compiler() -> ComponentCompiler {
    ComponentCompiler::with_configuration(CompilerConfiguration::default())
}

/// Compile `source`, failing the test with rendered diagnostics on error.
pub fn compile(source: &str) -> ComponentDefinition {
    let mut compiler = compiler();
    match compiler.build_from_source(source, "test.vel") {
        Some(definition) => definition,
        None => panic!(
            "compilation failed:\n{}",
            DiagnosticsAggregator::new(compiler.diagnostics())
                .with_default_source("test.vel", source)
                .render()
        ),
    }
}

/// Compile `source` expecting failure; returns the diagnostics.
pub fn compile_err(source: &str) -> Vec<Diagnostic> {
    let mut compiler = compiler();
    let definition = compiler.build_from_source(source, "test.vel");
    assert!(definition.is_none(), "expected compilation to fail");
    compiler.diagnostics().to_vec()
}

pub fn codes(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .filter_map(|d| d.code().map(str::to_string))
        .collect()
}

pub fn temp_root(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut root = std::env::temp_dir();
    root.push(format!("vellum_{}_{}_{}", label, std::process::id(), nanos));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}

// NO_COLOR is process-global; tests that render through it take this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub struct EnvGuard {
    prev: Option<OsString>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.prev {
                Some(val) => std::env::set_var("NO_COLOR", val),
                None => std::env::remove_var("NO_COLOR"),
            }
        }
    }
}

pub fn with_no_color(value: Option<&str>) -> (MutexGuard<'static, ()>, EnvGuard) {
    let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let prev = std::env::var_os("NO_COLOR");
    unsafe {
        match value {
            Some(val) => std::env::set_var("NO_COLOR", val),
            None => std::env::remove_var("NO_COLOR"),
        }
    }
    (lock, EnvGuard { prev })
}
