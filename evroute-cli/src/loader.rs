use evroute_game::DataLoader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads tables and routes relative to the plan's directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn read(&self, name: &str) -> Result<String, LoadError> {
        let path = self.resolve(name);
        log::debug!("reading {}", path.display());
        std::fs::read_to_string(&path).map_err(|source| LoadError::Read { path, source })
    }
}

impl DataLoader for FsLoader {
    type Error = LoadError;

    fn load_yield_source(&self, name: &str) -> Result<String, Self::Error> {
        self.read(name)
    }

    fn load_route_source(&self, name: &str) -> Result<String, Self::Error> {
        self.read(name)
    }
}
