//! Compilation sessions
//!
//! A session parses any number of units against one shared Global scope.
//! Imported units are located on the search paths and parsed before the unit
//! that imports them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::frontend::ast::Program;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::parse_tokens;
use crate::frontend::semantic::SymbolTable;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, SourceFile, Span};

/// Source file extension
pub const SOURCE_EXTENSION: &str = "sr";

/// A parsed compilation unit
#[derive(Debug, Clone)]
pub struct Unit {
    pub file: Arc<SourceFile>,
    pub program: Program,
}

/// An `import` found by the pre-scan
#[derive(Debug, Clone, PartialEq)]
struct ImportRequest {
    /// Candidate module paths, most specific first
    candidates: Vec<Vec<String>>,
    span: Span,
}

/// A unit whose imports are still loading
#[derive(Debug, Clone)]
struct Pending {
    name: String,
    /// Canonical path, absent for units parsed from memory
    path: Option<PathBuf>,
}

pub struct Session {
    table: SymbolTable,
    search_paths: Vec<PathBuf>,
    units: Vec<Unit>,
    /// Canonical file path to unit index
    loaded: HashMap<PathBuf, usize>,
    /// Units currently being parsed, for cycle detection
    stack: Vec<Pending>,
    next_file_id: usize,
}

impl Session {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            search_paths: vec![PathBuf::from(".")],
            units: Vec::new(),
            loaded: HashMap::new(),
            stack: Vec::new(),
            next_file_id: 0,
        }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Read and parse a unit from disk, loading its imports first
    pub fn parse_file(&mut self, path: &Path) -> Result<&Unit> {
        let canonical = canonical_path(path)?;
        if let Some(&index) = self.loaded.get(&canonical) {
            return Ok(&self.units[index]);
        }
        let text = read_source(path)?;

        let pending = Pending {
            name: module_name_of(path),
            path: Some(canonical.clone()),
        };
        let index = self.parse_named(pending, path.display().to_string(), text)?;
        self.loaded.insert(canonical, index);
        Ok(&self.units[index])
    }

    /// Parse a unit from memory. Imports still resolve against the search paths.
    pub fn parse_source(
        &mut self,
        path: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&Unit> {
        let path = path.into();
        let pending = Pending {
            name: module_name_of(Path::new(&path)),
            path: None,
        };
        let index = self.parse_named(pending, path, text.into())?;
        Ok(&self.units[index])
    }

    fn parse_named(&mut self, pending: Pending, path: String, text: String) -> Result<usize> {
        let file = SourceFile::new(self.next_file_id, path, text);
        self.next_file_id += 1;
        let tokens = Lexer::new(&file).tokenize()?;

        self.stack.push(pending);
        let result = self.load_imports(&file, &tokens);
        let result = result.and_then(|_| parse_tokens(&mut self.table, &file, tokens));
        self.stack.pop();
        let program = result?;

        log::debug!("unit {} parsed", file.path);
        self.units.push(Unit { file, program });
        Ok(self.units.len() - 1)
    }

    fn load_imports(&mut self, file: &Arc<SourceFile>, tokens: &[Token]) -> Result<()> {
        for request in scan_imports(tokens) {
            let found = request
                .candidates
                .iter()
                .find_map(|segments| self.find_module_file(segments).map(|path| (segments, path)));

            let (segments, path) = match found {
                Some(found) => found,
                None => {
                    log::debug!(
                        "import {} matches no file on the search paths",
                        display_import(&request)
                    );
                    continue;
                }
            };

            let name = segments.join("::");
            let cycle = self.stack.iter().any(|p| match &p.path {
                Some(pending) => *pending == path,
                None => p.name == name,
            });
            if cycle {
                let mut chain: Vec<&str> = self.stack.iter().map(|p| p.name.as_str()).collect();
                chain.push(&name);
                let message = format!("Circular import detected: {}", chain.join(" -> "));
                return Err(Error::semantic(message).with_reference(file, request.span));
            }
            if self.loaded.contains_key(&path) {
                continue;
            }

            let text = read_source(&path)?;
            let pending = Pending {
                name: name.clone(),
                path: Some(path.clone()),
            };
            let index = self.parse_named(pending, path.display().to_string(), text)?;
            self.loaded.insert(path.clone(), index);
            log::debug!("import {} loaded from {}", name, path.display());
        }
        Ok(())
    }

    /// `a::b` is looked up as `a/b.sr` on each search path
    fn find_module_file(&self, segments: &[String]) -> Option<PathBuf> {
        let mut relative: PathBuf = segments.iter().collect();
        relative.set_extension(SOURCE_EXTENSION);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
            .and_then(|candidate| fs::canonicalize(candidate).ok())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))
}

fn module_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn display_import(request: &ImportRequest) -> String {
    request
        .candidates
        .first()
        .map(|segments| segments.join("::"))
        .unwrap_or_default()
}

/// Find `import` statements without parsing the unit.
///
/// `import a::b::{X, Y};` names module `a::b`. `import a::b::X;` could name
/// module `a::b::X` or item `X` of module `a::b`, so both are candidates.
fn scan_imports(tokens: &[Token]) -> Vec<ImportRequest> {
    let tokens: Vec<&Token> = tokens.iter().filter(|t| t.kind != TokenKind::Comment).collect();
    let mut requests = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind != TokenKind::Import {
            i += 1;
            continue;
        }
        let span = tokens[i].span;
        i += 1;

        let mut segments = Vec::new();
        let mut has_list = false;
        while i < tokens.len() && tokens[i].kind == TokenKind::Ident {
            segments.push(tokens[i].lexeme.clone());
            i += 1;
            if i + 1 < tokens.len() && tokens[i].kind == TokenKind::ColonColon {
                if tokens[i + 1].kind == TokenKind::LBrace {
                    has_list = true;
                    break;
                }
                i += 1;
            } else {
                break;
            }
        }

        if segments.is_empty() {
            continue;
        }
        let mut candidates = vec![segments.clone()];
        if !has_list && segments.len() > 1 {
            candidates.push(segments[..segments.len() - 1].to_vec());
        }
        requests.push(ImportRequest { candidates, span });
    }
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<Token> {
        let file = SourceFile::new(0, "scan.sr", source);
        Lexer::new(&file).tokenize().unwrap()
    }

    /// Fresh directory under the system temp dir
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("stride-session-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scan_imports() {
        let requests = scan_imports(&tokens(
            "import math::{sqrt, pow}; // comment\nimport io::print; import single;",
        ));
        let candidates: Vec<Vec<Vec<String>>> =
            requests.into_iter().map(|r| r.candidates).collect();
        let owned = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            candidates,
            vec![
                vec![owned(&["math"])],
                vec![owned(&["io", "print"]), owned(&["io"])],
                vec![owned(&["single"])],
            ]
        );
    }

    #[test]
    fn test_units_share_global_scope() {
        let mut session = Session::new();
        session
            .parse_source("lib.sr", "fn square(x: i64): i64 { return x * x; }")
            .unwrap();
        session
            .parse_source("main.sr", "fn main(): void { const y: i64 = square(4L); }")
            .unwrap();
        assert_eq!(session.units().len(), 2);
        let global = session.table().global();
        assert!(session.table().get_function_def(global, "square(i64)").is_some());
    }

    #[test]
    fn test_imports_load_first() {
        let dir = scratch_dir("imports");
        fs::create_dir_all(dir.join("geometry")).unwrap();
        fs::write(
            dir.join("geometry").join("area.sr"),
            "fn area(w: i64, h: i64): i64 { return w * h; }",
        )
        .unwrap();

        let mut session = Session::new();
        session.add_search_path(&dir);
        session
            .parse_source(
                "main.sr",
                "import geometry::area::{area}; fn main(): void { const a: i64 = area(2L, 3L); }",
            )
            .unwrap();
        assert_eq!(session.units().len(), 2);
        assert!(session.units()[0].file.path.ends_with("area.sr"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_import_is_not_an_error() {
        let mut session = Session::new();
        assert!(session
            .parse_source("main.sr", "import std::io::{print}; fn main(): void { }")
            .is_ok());
    }

    #[test]
    fn test_circular_import() {
        let dir = scratch_dir("cycle");
        fs::write(dir.join("a.sr"), "import b::{g}; fn f(): void { }").unwrap();
        fs::write(dir.join("b.sr"), "import a::{f}; fn g(): void { }").unwrap();

        let mut session = Session::new();
        session.add_search_path(&dir);
        let err = session.parse_file(&dir.join("a.sr")).err().expect("cycle should fail");
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
        assert_eq!(err.message(), "Circular import detected: a -> b -> a");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_direct_file_is_not_imported_twice() {
        let dir = scratch_dir("reload");
        fs::write(dir.join("lib.sr"), "fn helper(x: i32): void { }").unwrap();

        let mut session = Session::new();
        session.add_search_path(&dir);
        session.parse_file(&dir.join(".").join("lib.sr")).unwrap();
        session
            .parse_source("main.sr", "import lib::{helper}; fn main(): void { helper(1); }")
            .unwrap();
        assert_eq!(session.units().len(), 2);

        session.parse_file(&dir.join("lib.sr")).unwrap();
        assert_eq!(session.units().len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_circular_import_through_other_spelling() {
        let dir = scratch_dir("respelled");
        fs::write(dir.join("a.sr"), "import b::{g}; fn f(): void { }").unwrap();
        fs::write(dir.join("b.sr"), "import a::{f}; fn g(): void { }").unwrap();

        let mut session = Session::new();
        session.add_search_path(&dir);
        let err = session.parse_file(&dir.join(".").join("a.sr")).err().unwrap();
        assert_eq!(err.message(), "Circular import detected: a -> b -> a");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unreadable_file() {
        let mut session = Session::new();
        let err = session.parse_file(Path::new("/nonexistent/stride/file.sr")).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
