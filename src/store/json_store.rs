use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::engine::state::AppState;
use crate::engine::syllabus::Syllabus;
use crate::store::schema::{decode_import, decode_state, encode_state};

const STATE_FILE: &str = "state.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(default_data_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("failed to create data directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Loads the saved state, falling back to the syllabus defaults when the
    /// record is absent or unusable. Never fails.
    ///
    /// A record that exists but cannot be decoded is copied aside to
    /// `state.json.corrupt` before the defaults are returned, since the next
    /// save would otherwise overwrite it.
    pub fn load_state(&self, syllabus: &Syllabus) -> AppState {
        let path = self.file_path(STATE_FILE);
        if !path.exists() {
            // First run, not an error
            info!(path = %path.display(), "no saved state, starting from defaults");
            return syllabus.initial_state();
        }

        let decoded = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| decode_state(&content, syllabus).map_err(anyhow::Error::from));

        match decoded {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "saved state unreadable, using defaults");
                let corrupt = self.file_path("state.json.corrupt");
                if let Err(copy_err) = fs::copy(&path, &corrupt) {
                    warn!(error = %copy_err, "could not keep a copy of the unreadable state");
                }
                syllabus.initial_state()
            }
        }
    }

    /// Writes the full state through a temporary file so a crash mid-write
    /// leaves the previous record intact.
    pub fn save_state(&self, state: &AppState) -> Result<()> {
        let json = encode_state(state)?;
        write_atomically(&self.file_path(STATE_FILE), &json)
    }

    /// Copies the current record to `dest`.
    pub fn export_to(&self, state: &AppState, dest: &Path) -> Result<()> {
        let json = encode_state(state)?;
        write_atomically(dest, &json).with_context(|| format!("failed to export to {}", dest.display()))
    }

    /// Reads a record from `src` and makes it the saved state. Unlike
    /// [`load_state`](Self::load_state) this refuses a file that does not look
    /// like a record at all, since it would replace the current progress.
    pub fn import_from(&self, src: &Path, syllabus: &Syllabus) -> Result<AppState> {
        let content =
            fs::read_to_string(src).with_context(|| format!("failed to read {}", src.display()))?;
        let state = decode_import(&content, syllabus)
            .with_context(|| format!("{} is not a saved study state", src.display()))?;
        self.save_state(&state)?;
        Ok(state)
    }
}

/// Sibling of `path` with `.tmp` appended, so `notes.json` never clobbers `notes.tmp`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let tmp = tmp_path(path);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studydraw")
}
