//! Parses the main document and everything it imports.
//!
//! Imports resolve relative to the importing file's directory, then against
//! each include path in order. `std-widgets.vel` is a builtin module whose
//! source depends on the style. Parsed documents are cached by the SHA-256
//! of their name and text, so rebuilding with unchanged imports skips the
//! parser.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::compiler::std_widgets;
use crate::diagnostics::{
    Diagnostic, DiagnosticBuilder,
    error_codes::{
        DUPLICATE_DECLARATION, FILE_READ, IMPORT_CYCLE, IMPORT_NOT_FOUND, UNKNOWN_IMPORT,
        UNKNOWN_NAME,
    },
};
use crate::syntax::{
    Identifier,
    document::{Document, ImportDecl, Item},
    parse_document,
};

/// A top-level item: document index and item index within that document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ItemRef {
    pub doc: usize,
    pub item: usize,
}

pub(crate) struct LoadedDocument {
    /// Name used in diagnostics.
    pub file: String,
    /// Directory for relative imports and image paths.
    pub dir: Option<PathBuf>,
    pub document: Rc<Document>,
    /// Names visible inside the document: its own items and its imports.
    pub scope: HashMap<String, ItemRef>,
    /// Public names, in declaration order.
    pub exports: IndexMap<String, ItemRef>,
}

impl LoadedDocument {
    pub fn item(&self, index: usize) -> &Item {
        &self.document.items[index]
    }
}

#[derive(Clone)]
struct ParsedDocument {
    document: Rc<Document>,
    diagnostics: Vec<Diagnostic>,
}

/// Parse results that survive across builds.
#[derive(Default)]
pub(crate) struct DocumentCache {
    entries: HashMap<[u8; 32], ParsedDocument>,
}

impl DocumentCache {
    fn parse(&mut self, file: &str, source: &str) -> ParsedDocument {
        let key = cache_key(file, source);
        if let Some(parsed) = self.entries.get(&key) {
            log::debug!("document cache hit for {}", file);
            return parsed.clone();
        }
        let (document, diagnostics) = parse_document(source, Some(file));
        let parsed = ParsedDocument {
            document: Rc::new(document),
            diagnostics,
        };
        self.entries.insert(key, parsed.clone());
        parsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn cache_key(file: &str, source: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(file.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

pub(crate) struct Loader<'a> {
    style: &'a str,
    include_paths: &'a [PathBuf],
    cache: &'a mut DocumentCache,
    pub documents: Vec<LoadedDocument>,
    loaded: HashMap<String, usize>,
    /// `(key, file)` of documents whose imports are being resolved.
    stack: Vec<(String, String)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Loader<'a> {
    pub fn new(style: &'a str, include_paths: &'a [PathBuf], cache: &'a mut DocumentCache) -> Self {
        Self {
            style,
            include_paths,
            cache,
            documents: Vec::new(),
            loaded: HashMap::new(),
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Load the main document from memory. Returns its index.
    pub fn load_source(&mut self, source: &str, file: &str) -> usize {
        let dir = Path::new(file)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.load(format!("source:{}", file), file.to_string(), dir, source)
    }

    /// Load the main document from disk. `None` when it cannot be read.
    pub fn load_path(&mut self, path: &Path) -> Option<usize> {
        let file = path.display().to_string();
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                let reason = err.to_string();
                self.diagnostics.push(Diagnostic::make_unlocated(
                    &FILE_READ,
                    &[&file, &reason],
                    Some(&file),
                ));
                return None;
            }
        };
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let dir = canonical.parent().map(Path::to_path_buf);
        Some(self.load(canonical.display().to_string(), file, dir, &source))
    }

    fn load(&mut self, key: String, file: String, dir: Option<PathBuf>, source: &str) -> usize {
        let parsed = self.cache.parse(&file, source);
        self.diagnostics.extend(parsed.diagnostics.iter().cloned());
        let document = parsed.document;

        let mut scope = HashMap::new();
        self.stack.push((key.clone(), file.clone()));
        for item in &document.items {
            if let Item::Import(import) = item {
                self.resolve_import(import, &file, dir.as_deref(), &mut scope);
            }
        }
        self.stack.pop();

        // Imports push their documents first, so this index is final.
        let index = self.documents.len();
        for (item_index, item) in document.items.iter().enumerate() {
            let Some(name) = declared_name(item) else {
                continue;
            };
            if scope.contains_key(name.as_str()) {
                self.diagnostics.push(Diagnostic::make(
                    &DUPLICATE_DECLARATION,
                    &[name.as_str()],
                    file.clone(),
                    name.span,
                ));
                continue;
            }
            scope.insert(
                name.name.clone(),
                ItemRef {
                    doc: index,
                    item: item_index,
                },
            );
        }

        let exports = self.collect_exports(&document, index, &scope, &file);
        self.documents.push(LoadedDocument {
            file,
            dir,
            document,
            scope,
            exports,
        });
        self.loaded.insert(key, index);
        index
    }

    fn collect_exports(
        &mut self,
        document: &Document,
        index: usize,
        scope: &HashMap<String, ItemRef>,
        file: &str,
    ) -> IndexMap<String, ItemRef> {
        let mut exports = IndexMap::new();
        for (item_index, item) in document.items.iter().enumerate() {
            let exported = match item {
                Item::Component(c) => c.exported.then_some(&c.name),
                Item::Struct(s) => s.exported.then_some(&s.name),
                Item::Global(g) => g.exported.then_some(&g.name),
                Item::Export(list) => {
                    for alias in &list.names {
                        match scope.get(alias.name.as_str()) {
                            Some(item) => {
                                exports.insert(alias.visible_name().name.clone(), *item);
                            }
                            None => self.diagnostics.push(Diagnostic::make(
                                &UNKNOWN_NAME,
                                &[alias.name.as_str()],
                                file.to_string(),
                                alias.name.span,
                            )),
                        }
                    }
                    None
                }
                Item::Import(_) => None,
            };
            if let Some(name) = exported {
                exports.insert(
                    name.name.clone(),
                    ItemRef {
                        doc: index,
                        item: item_index,
                    },
                );
            }
        }
        exports
    }

    fn resolve_import(
        &mut self,
        import: &ImportDecl,
        file: &str,
        dir: Option<&Path>,
        scope: &mut HashMap<String, ItemRef>,
    ) {
        let Some(target) = self.load_import(import, file, dir) else {
            return;
        };
        for alias in &import.names {
            let visible = alias.visible_name();
            match self.documents[target].exports.get(alias.name.as_str()) {
                Some(item) if !scope.contains_key(visible.as_str()) => {
                    scope.insert(visible.name.clone(), *item);
                }
                Some(_) => self.diagnostics.push(Diagnostic::make(
                    &DUPLICATE_DECLARATION,
                    &[visible.as_str()],
                    file.to_string(),
                    visible.span,
                )),
                None => self.diagnostics.push(Diagnostic::make(
                    &UNKNOWN_IMPORT,
                    &[alias.name.as_str(), &import.path],
                    file.to_string(),
                    alias.name.span,
                )),
            }
        }
    }

    fn load_import(&mut self, import: &ImportDecl, file: &str, dir: Option<&Path>) -> Option<usize> {
        if import.path == std_widgets::MODULE_NAME {
            let key = format!("builtin:{}", std_widgets::MODULE_NAME);
            if let Some(&index) = self.loaded.get(&key) {
                return Some(index);
            }
            // An unknown style is reported once by the compiler.
            let source = std_widgets::source(self.style)?;
            let file = std_widgets::MODULE_NAME.to_string();
            return Some(self.load(key, file, None, &source));
        }

        let Some(path) = self.find_import(&import.path, dir) else {
            let searched: Vec<String> = dir
                .into_iter()
                .map(Path::to_path_buf)
                .chain(self.include_paths.iter().cloned())
                .map(|p| p.display().to_string())
                .collect();
            let mut diag = Diagnostic::make(&IMPORT_NOT_FOUND, &[&import.path], file, import.span);
            if !searched.is_empty() {
                diag = diag.with_hint(format!("Searched: {}", searched.join(", ")));
            }
            self.diagnostics.push(diag);
            return None;
        };

        let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        let key = canonical.display().to_string();
        if let Some(start) = self.stack.iter().position(|(k, _)| *k == key) {
            let mut chain: Vec<&str> = self.stack[start..].iter().map(|(_, f)| f.as_str()).collect();
            chain.push(&self.stack[start].1);
            let chain = chain.join(" -> ");
            self.diagnostics.push(Diagnostic::make(
                &IMPORT_CYCLE,
                &[&chain],
                file,
                import.span,
            ));
            return None;
        }
        if let Some(&index) = self.loaded.get(&key) {
            return Some(index);
        }

        let source = match fs::read_to_string(&canonical) {
            Ok(source) => source,
            Err(err) => {
                let reason = err.to_string();
                self.diagnostics.push(Diagnostic::make(
                    &FILE_READ,
                    &[&path.display().to_string(), &reason],
                    file,
                    import.span,
                ));
                return None;
            }
        };
        let dir = canonical.parent().map(Path::to_path_buf);
        Some(self.load(key, path.display().to_string(), dir, &source))
    }

    fn find_import(&self, name: &str, dir: Option<&Path>) -> Option<PathBuf> {
        dir.into_iter()
            .map(|dir| dir.join(name))
            .chain(self.include_paths.iter().map(|root| root.join(name)))
            .find(|candidate| candidate.is_file())
    }
}

fn declared_name(item: &Item) -> Option<&Identifier> {
    match item {
        Item::Component(c) => Some(&c.name),
        Item::Struct(s) => Some(&s.name),
        Item::Global(g) => Some(&g.name),
        Item::Import(_) | Item::Export(_) => None,
    }
}
