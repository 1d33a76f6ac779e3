//! Saving and loading a group's tree through the format adapters.

use std::path::Path;

use tracing::{debug, warn};

use super::Group;
use crate::format::{self, Format};
use crate::object::Root;
use crate::ConfigError;

impl Group {
    /// Writes the current tree to `path`; the extension selects the format.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let contents = format::encode(format, &self.tree)?;
        format::write_config_file(path, &contents)?;
        debug!(group = %self.name, path = %path.display(), %format, "saved config");
        Ok(())
    }

    /// Parses `path` and applies it to `root`, replacing the current tree.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        root: &mut Root,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let contents = format::read_config_file(path)?;
        let raw = format::decode(format, &contents)?;
        self.load_from_mapping(raw, root)?;
        debug!(group = %self.name, path = %path.display(), %format, "loaded config");
        Ok(())
    }

    /// Writes the current tree to the group's file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.default_path()?;
        self.save_to_file(path)
    }

    /// Loads the group's file into `root`, or writes the current tree there
    /// if the file does not exist yet.
    ///
    /// A lenient group that fails to load an existing file logs the error,
    /// keeps its current tree and overwrites the file with it.
    pub fn load(&mut self, root: &mut Root) -> Result<(), ConfigError> {
        let path = self.default_path()?.to_path_buf();
        if !path.exists() {
            debug!(
                group = %self.name,
                path = %path.display(),
                "no config file yet, writing defaults"
            );
            return self.save_to_file(&path);
        }

        let defaults = self.tree.clone();
        match self.load_from_file(&path, root) {
            Ok(()) => Ok(()),
            Err(e) if self.lenient => {
                warn!(
                    group = %self.name,
                    path = %path.display(),
                    error = %e,
                    "failed to load config, rewriting defaults"
                );
                self.tree = defaults;
                self.save_to_file(&path)
            }
            Err(e) => Err(e),
        }
    }

    fn default_path(&self) -> Result<&Path, ConfigError> {
        self.filepath
            .as_deref()
            .ok_or_else(|| ConfigError::NoFilePath(self.name.clone()))
    }
}
