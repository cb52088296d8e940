use crate::schema::BenchmarkData;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PREFIX: &str = "window.BENCHMARK_DATA = ";

#[derive(Error, Debug)]
pub enum DataJsError {
    #[error("missing `window.BENCHMARK_DATA = ` prefix")]
    MissingPrefix,
    #[error("benchmark data is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn parse(script: &str) -> Result<BenchmarkData, DataJsError> {
    let body = script
        .trim_start()
        .strip_prefix(PREFIX.trim_end())
        .ok_or(DataJsError::MissingPrefix)?;
    let body = body.trim();
    let body = body.strip_suffix(';').unwrap_or(body);

    Ok(serde_json::from_str(body)?)
}

pub fn render(data: &BenchmarkData) -> Result<String, DataJsError> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(format!("{PREFIX}{json}"))
}

pub fn load(path: &Path) -> Result<BenchmarkData, DataJsError> {
    let script = fs::read_to_string(path).map_err(|source| DataJsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&script)
}

/// Like [`load`], but a missing file yields an empty dataset for `repo_url`.
pub fn load_or_default(path: &Path, repo_url: &str) -> Result<BenchmarkData, DataJsError> {
    match fs::read_to_string(path) {
        Ok(script) => parse(&script),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BenchmarkData::new(repo_url)),
        Err(source) => Err(DataJsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn save(path: &Path, data: &BenchmarkData) -> Result<(), DataJsError> {
    let script = render(data)?;
    let io_error = |source: std::io::Error| DataJsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, script).map_err(io_error)
}
