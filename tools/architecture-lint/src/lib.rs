//! Layer boundary check for the gateway crate.
//!
//! Every file under `domain`, `inbound`, `middleware` and `outbound` is parsed
//! with `syn`. Each path it names is reduced to a root (a sibling module of
//! the crate or a third-party crate) and checked against the deny lists of
//! the file's layer:
//!
//! | layer        | may not name                                  |
//! |--------------|-----------------------------------------------|
//! | `domain`     | any adapter module; web, HTTP or SQL crates   |
//! | `inbound`    | `outbound`, `server`; reqwest and Diesel      |
//! | `middleware` | same as `inbound`                             |
//! | `outbound`   | `inbound`, `middleware`, `server`; actix-web  |

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name of the gateway crate as written in absolute paths.
const CRATE_NAME: &str = "marketplace_gateway";

/// A file that names something its layer may not depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path relative to the crate's `src/`.
    pub file: PathBuf,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

#[derive(Debug)]
pub enum LintError {
    Io(io::Error),
    /// The file could not be parsed or sits outside every layer.
    Source { file: PathBuf, message: String },
    Violations(Vec<Violation>),
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read gateway sources: {err}"),
            Self::Source { file, message } => write!(f, "{}: {message}", file.display()),
            Self::Violations(violations) => {
                writeln!(f, "{} layer boundary violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "  {violation}"))
            }
        }
    }
}

impl std::error::Error for LintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Source { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for LintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A gateway source file and its path relative to `src/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Middleware,
    Outbound,
}

impl Layer {
    const ALL: [Self; 4] = [Self::Domain, Self::Inbound, Self::Middleware, Self::Outbound];

    const fn dir(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Middleware => "middleware",
            Self::Outbound => "outbound",
        }
    }

    fn of(path: &Path) -> Option<Self> {
        let top = path.components().next()?.as_os_str().to_str()?;
        Self::ALL.into_iter().find(|layer| layer.dir() == top)
    }

    const fn denied_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["inbound", "middleware", "outbound", "server"],
            Self::Inbound | Self::Middleware => &["outbound", "server"],
            Self::Outbound => &["inbound", "middleware", "server"],
        }
    }

    const fn denied_crates(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &[
                "actix_http",
                "actix_web",
                "diesel",
                "diesel_async",
                "reqwest",
                "utoipa",
                "utoipa_swagger_ui",
            ],
            Self::Inbound | Self::Middleware => &["diesel", "diesel_async", "reqwest"],
            Self::Outbound => &["actix_http", "actix_web", "utoipa", "utoipa_swagger_ui"],
        }
    }
}

/// What a path ultimately points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root<'a> {
    Module(&'a str),
    Crate(&'a str),
}

fn root_of(segments: &[String]) -> Option<Root<'_>> {
    let first = segments.first()?.as_str();
    if matches!(first, "crate" | "self" | "super") {
        return segments
            .iter()
            .map(String::as_str)
            .find(|segment| !matches!(*segment, "crate" | "self" | "super"))
            .map(Root::Module);
    }
    if first == CRATE_NAME {
        return segments.get(1).map(|segment| Root::Module(segment.as_str()));
    }
    if Layer::ALL.iter().any(|layer| layer.dir() == first) {
        return Some(Root::Module(first));
    }
    Some(Root::Crate(first))
}

/// Every path a file names, through `use` trees and inline paths alike.
#[derive(Default)]
struct NamedPaths(BTreeSet<Vec<String>>);

impl NamedPaths {
    fn add_use_tree(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.add_use_tree(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.0.insert(prefix);
            }
            syn::UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.0.insert(prefix);
            }
            syn::UseTree::Glob(_) => {
                self.0.insert(prefix);
            }
            syn::UseTree::Group(group) => group
                .items
                .iter()
                .for_each(|item| self.add_use_tree(item, prefix.clone())),
        }
    }
}

impl<'ast> Visit<'ast> for NamedPaths {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node.segments.iter().map(|s| s.ident.to_string()).collect();
        if !segments.is_empty() {
            self.0.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.add_use_tree(&node.tree, Vec::new());
    }
}

fn check_file(path: &Path, layer: Layer, syntax: &syn::File) -> Vec<Violation> {
    let mut named = NamedPaths::default();
    named.visit_file(syntax);

    let messages: BTreeSet<String> = named
        .0
        .iter()
        .filter_map(|segments| match root_of(segments)? {
            Root::Module(module) if layer.denied_modules().iter().any(|m| *m == module) => {
                Some(format!("{} must not depend on crate::{module}", layer.dir()))
            }
            Root::Crate(name) if layer.denied_crates().iter().any(|c| *c == name) => {
                Some(format!("{} must not depend on {name}", layer.dir()))
            }
            Root::Module(_) | Root::Crate(_) => None,
        })
        .collect();

    messages
        .into_iter()
        .map(|message| Violation {
            file: path.to_path_buf(),
            message,
        })
        .collect()
}

/// Check in-memory sources. Paths are relative to the crate's `src/`.
pub fn lint(files: &[SourceFile]) -> Result<(), LintError> {
    let mut violations = Vec::new();
    for file in files {
        let layer = Layer::of(&file.path).ok_or_else(|| LintError::Source {
            file: file.path.clone(),
            message: "not under domain, inbound, middleware or outbound".to_owned(),
        })?;
        let syntax = syn::parse_file(&file.text).map_err(|err| LintError::Source {
            file: file.path.clone(),
            message: err.to_string(),
        })?;
        violations.extend(check_file(&file.path, layer, &syntax));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(LintError::Violations(violations))
    }
}

/// Read and check the layered modules of the crate rooted at `crate_dir`.
pub fn lint_crate(crate_dir: &Path) -> Result<(), LintError> {
    let src = crate_dir.join("src");
    let mut files = Vec::new();
    for layer in Layer::ALL {
        let dir = src.join(layer.dir());
        if dir.is_dir() {
            read_sources(&src, &dir, &mut files)?;
        }
    }
    lint(&files)
}

fn read_sources(src: &Path, dir: &Path, files: &mut Vec<SourceFile>) -> Result<(), LintError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            read_sources(src, &path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let relative = path.strip_prefix(src).unwrap_or(&path).to_path_buf();
            files.push(SourceFile {
                text: fs::read_to_string(&path)?,
                path: relative,
            });
        }
    }
    Ok(())
}
