//! Resource addressing.
//!
//! A resource is a path plus an optional query selecting part of the file:
//!
//! | Query               | Selects                           | Valid for            |
//! |---------------------|-----------------------------------|----------------------|
//! | `?mesh=<name>`      | mesh by name (case-insensitive)   | `Mesh`, `Skeleton`   |
//! | `?modelIndex=<n>`   | mesh by index                     | `Mesh`, `Skeleton`   |
//! | `?animation=<name>` | clips by exact name, then substring | `Scene`, `Timeline` |
//!
//! At most one parameter may be given.

use std::path::{Path, PathBuf};

use url::form_urlencoded;

use crate::errors::{ImportError, Result};

/// What an import call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Scene,
    Mesh,
    Skeleton,
    Timeline,
}

/// The part of a file a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Mesh(String),
    ModelIndex(usize),
    Animation(String),
}

impl Selector {
    fn key(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::ModelIndex(_) => "modelIndex",
            Self::Animation(_) => "animation",
        }
    }

    fn allows(&self, kind: OutputKind) -> bool {
        match self {
            Self::Mesh(_) | Self::ModelIndex(_) => {
                matches!(kind, OutputKind::Mesh | OutputKind::Skeleton)
            }
            Self::Animation(_) => matches!(kind, OutputKind::Scene | OutputKind::Timeline),
        }
    }
}

/// A parsed resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub kind: OutputKind,
    pub selector: Option<Selector>,
    /// Query keys that were not recognised.
    pub ignored: Vec<String>,
}

impl ImportRequest {
    /// Parses `path[?query]` for the given output kind.
    pub fn parse(resource: &str, kind: OutputKind) -> Result<Self> {
        let (path, query) = match resource.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (resource, None),
        };
        if path.is_empty() {
            return Err(ImportError::argument(format!("resource '{resource}' has no path")));
        }

        let mut selector: Option<Selector> = None;
        let mut ignored = Vec::new();
        for (key, value) in query.map(|q| form_urlencoded::parse(q.as_bytes())).into_iter().flatten() {
            let parsed = match key.as_ref() {
                "mesh" => Selector::Mesh(value.into_owned()),
                "modelIndex" => {
                    let index = value.trim().parse::<usize>().map_err(|_| {
                        ImportError::argument(format!("modelIndex '{value}' is not a valid index"))
                    })?;
                    Selector::ModelIndex(index)
                }
                "animation" => Selector::Animation(value.into_owned()),
                _ => {
                    ignored.push(key.to_string());
                    continue;
                }
            };
            if let Some(previous) = &selector {
                return Err(ImportError::argument(format!(
                    "'{}' and '{}' cannot be combined in '{resource}'",
                    previous.key(),
                    parsed.key()
                )));
            }
            selector = Some(parsed);
        }

        if let Some(s) = &selector
            && !s.allows(kind)
        {
            return Err(ImportError::argument(format!(
                "'{}' cannot be used when importing a {kind:?}",
                s.key()
            )));
        }

        Ok(Self {
            path: PathBuf::from(path),
            kind,
            selector,
            ignored,
        })
    }

    /// Lower-cased file extension, used to pick a handler.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Directory relative references inside the file resolve against.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}
