//! Compiles `.vel` documents into [`ComponentDefinition`]s.

pub mod builtins;
pub mod expression_tree;
pub mod langtype;
pub(crate) mod loader;
pub(crate) mod lower;
pub mod object_tree;
pub mod std_widgets;

use std::{
    env,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::diagnostics::{
    Diagnostic, has_errors,
    error_codes::{NO_COMPONENT, NO_EXPORTED_COMPONENT, UNKNOWN_STYLE},
};
use crate::runtime::definition::ComponentDefinition;
use crate::syntax::document::Item;

use loader::{DocumentCache, ItemRef, LoadedDocument, Loader};

pub const STYLE_ENV: &str = "VELLUM_STYLE";
pub const INCLUDE_PATH_ENV: &str = "VELLUM_INCLUDE_PATH";

/// Settings read at the start of every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfiguration {
    pub include_paths: Vec<PathBuf>,
    pub style: String,
}

impl Default for CompilerConfiguration {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            style: std_widgets::DEFAULT_STYLE.to_string(),
        }
    }
}

impl CompilerConfiguration {
    /// Defaults overridden by `VELLUM_STYLE` and `VELLUM_INCLUDE_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(style) = env::var(STYLE_ENV) {
            if !style.is_empty() {
                config.style = style;
            }
        }
        if let Some(paths) = env::var_os(INCLUDE_PATH_ENV) {
            config.include_paths = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        config
    }
}

/// Outcome of one build.
#[derive(Debug)]
pub struct CompilationResult {
    pub definition: Option<ComponentDefinition>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

#[derive(Default)]
pub struct ComponentCompiler {
    config: CompilerConfiguration,
    diagnostics: Vec<Diagnostic>,
    cache: DocumentCache,
}

impl ComponentCompiler {
    pub fn new() -> Self {
        Self::with_configuration(CompilerConfiguration::from_env())
    }

    pub fn with_configuration(config: CompilerConfiguration) -> Self {
        Self {
            config,
            diagnostics: Vec::new(),
            cache: DocumentCache::default(),
        }
    }

    pub fn configuration(&self) -> &CompilerConfiguration {
        &self.config
    }

    pub fn set_style(&mut self, style: impl Into<String>) {
        self.config.style = style.into();
    }

    pub fn style(&self) -> &str {
        &self.config.style
    }

    pub fn set_include_paths(&mut self, include_paths: Vec<PathBuf>) {
        self.config.include_paths = include_paths;
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.config.include_paths
    }

    /// Diagnostics of the most recent `build_from_*` call.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of parsed documents kept for later builds.
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Compile `source`. `path` names the document in diagnostics and anchors
    /// relative imports.
    pub fn build_from_source(&mut self, source: &str, path: impl AsRef<Path>) -> Option<ComponentDefinition> {
        self.diagnostics.clear();
        let result = self.compile_source(source, path);
        self.diagnostics = result.diagnostics;
        result.definition
    }

    pub fn build_from_path(&mut self, path: impl AsRef<Path>) -> Option<ComponentDefinition> {
        self.diagnostics.clear();
        let result = self.compile_path(path);
        self.diagnostics = result.diagnostics;
        result.definition
    }

    pub fn compile_source(&mut self, source: &str, path: impl AsRef<Path>) -> CompilationResult {
        let path = path.as_ref();
        let file = path.display().to_string();
        log::debug!("compiling {} (style {})", file, self.config.style);
        let style = self.config.style.clone();
        let include_paths = self.config.include_paths.clone();
        let mut loader = Loader::new(&style, &include_paths, &mut self.cache);
        let main = loader.load_source(source, &file);
        let documents = std::mem::take(&mut loader.documents);
        let diagnostics = std::mem::take(&mut loader.diagnostics);
        let source_path = (!file.is_empty()).then(|| path.to_path_buf());
        finish(documents, main, diagnostics, &style, source_path)
    }

    pub fn compile_path(&mut self, path: impl AsRef<Path>) -> CompilationResult {
        let path = path.as_ref();
        log::debug!("compiling {} (style {})", path.display(), self.config.style);
        let style = self.config.style.clone();
        let include_paths = self.config.include_paths.clone();
        let mut loader = Loader::new(&style, &include_paths, &mut self.cache);
        let main = loader.load_path(path);
        let documents = std::mem::take(&mut loader.documents);
        let mut diagnostics = std::mem::take(&mut loader.diagnostics);
        match main {
            Some(main) => finish(documents, main, diagnostics, &style, Some(path.to_path_buf())),
            None => {
                check_style(&style, &mut diagnostics);
                CompilationResult {
                    definition: None,
                    diagnostics,
                }
            }
        }
    }
}

fn check_style(style: &str, diagnostics: &mut Vec<Diagnostic>) {
    if !std_widgets::is_known_style(style) {
        diagnostics.insert(0, Diagnostic::make_unlocated(&UNKNOWN_STYLE, &[style], None));
    }
}

fn finish(
    documents: Vec<LoadedDocument>,
    main: usize,
    mut diagnostics: Vec<Diagnostic>,
    style: &str,
    source_path: Option<PathBuf>,
) -> CompilationResult {
    check_style(style, &mut diagnostics);

    let Some((name, component)) = main_component(&documents, main, &mut diagnostics) else {
        return CompilationResult {
            definition: None,
            diagnostics,
        };
    };

    let exported_globals: Vec<(String, ItemRef)> = documents[main]
        .exports
        .iter()
        .filter(|(_, item)| matches!(documents[item.doc].item(item.item), Item::Global(_)))
        .map(|(name, item)| (name.clone(), *item))
        .collect();

    let (mut compiled, lowering) = lower::lower_component(&documents, component, &name, &exported_globals);
    diagnostics.extend(lowering);

    if has_errors(&diagnostics) {
        log::debug!("build of {} failed with {} diagnostic(s)", name, diagnostics.len());
        return CompilationResult {
            definition: None,
            diagnostics,
        };
    }

    compiled.source_path = source_path;
    compiled.style = style.to_string();
    log::debug!("built component {}", name);
    CompilationResult {
        definition: Some(ComponentDefinition::new(Rc::new(compiled))),
        diagnostics,
    }
}

/// The last exported component of the main document, else its last
/// component with a warning.
fn main_component(
    documents: &[LoadedDocument],
    main: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(String, ItemRef)> {
    let doc = &documents[main];
    let exported = doc
        .exports
        .iter()
        .rev()
        .find(|(_, item)| matches!(documents[item.doc].item(item.item), Item::Component(_)));
    if let Some((name, item)) = exported {
        return Some((name.clone(), *item));
    }

    let last = doc
        .document
        .items
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, item)| match item {
            Item::Component(decl) => Some((index, decl)),
            _ => None,
        });
    match last {
        Some((index, decl)) => {
            diagnostics.push(Diagnostic::make(
                &NO_EXPORTED_COMPONENT,
                &[decl.name.as_str()],
                doc.file.clone(),
                decl.name.span,
            ));
            Some((
                decl.name.name.clone(),
                ItemRef {
                    doc: main,
                    item: index,
                },
            ))
        }
        None => {
            diagnostics.push(Diagnostic::make_unlocated(&NO_COMPONENT, &[], Some(&doc.file)));
            None
        }
    }
}
