// project save/load as pretty-printed json
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::project::{ProjectFile, FORMAT_VERSION, PROJECT_EXTENSION};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed project: {0}")]
    Format(#[from] serde_json::Error),
    #[error("unsupported project version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

// foo -> foo.pitchwarp, foo.pitchwarp stays as is
pub fn with_project_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == PROJECT_EXTENSION => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(PROJECT_EXTENSION);
            PathBuf::from(name)
        }
    }
}

pub fn is_project_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION)
}

// Parse a project, rejecting any format version we don't know
pub fn load_project(path: &Path) -> Result<ProjectFile, ProjectError> {
    let data = std::fs::read_to_string(path)?;
    let project: ProjectFile = serde_json::from_str(&data)?;
    if project.format_version != FORMAT_VERSION {
        return Err(ProjectError::Version {
            found: project.format_version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(project)
}

// Save the project, returns where it actually went
pub fn save_project(path: &Path, project: &ProjectFile) -> Result<PathBuf, ProjectError> {
    let path = with_project_extension(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Marker;

    fn sample_project() -> ProjectFile {
        ProjectFile::new(
            vec![0.0, 0.25, -0.5, 1.0],
            44100,
            vec![Marker {
                sample: 2,
                note: 57.5,
                d_time: 0.125,
                pitch_bend: -1.5,
            }],
            42.0,
            128.0,
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("round_trip");
        let project = sample_project();

        let written = save_project(&base, &project).expect("save");
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some(PROJECT_EXTENSION));

        let loaded = load_project(&written).expect("load");
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = with_project_extension(&dir.path().join("version"));
        let mut project = sample_project();
        project.format_version = 2;
        std::fs::write(&path, serde_json::to_string(&project).expect("json")).expect("write");

        assert!(matches!(load_project(&path), Err(ProjectError::Version { found: 2, .. })));
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = with_project_extension(&dir.path().join("garbage"));
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(load_project(&path), Err(ProjectError::Format(_))));
        std::fs::remove_file(&path).expect("remove");

        assert!(matches!(load_project(&path), Err(ProjectError::Io(_))));
    }

    #[test]
    fn test_extension_appended_once() {
        assert_eq!(with_project_extension(Path::new("a/song")), PathBuf::from("a/song.pitchwarp"));
        assert_eq!(with_project_extension(Path::new("song.wav")), PathBuf::from("song.wav.pitchwarp"));
        assert_eq!(with_project_extension(Path::new("x.pitchwarp")), PathBuf::from("x.pitchwarp"));
        assert!(is_project_path(Path::new("x.pitchwarp")));
        assert!(!is_project_path(Path::new("x.wav")));
    }
}
