// ABOUTME: Integration tests for artifact validation.
// ABOUTME: Validation is local filesystem inspection only, so everything runs against temp dirs.

use std::fs;
use stelno::artifact::{ArtifactDescriptor, ArtifactKind, ValidationError};
use tempfile::TempDir;

mod web_content {
    use super::*;

    /// Test: a directory with index.html at its root is a valid web artifact.
    /// Expected: validation succeeds.
    #[test]
    fn directory_with_entry_point_is_valid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let artifact = ArtifactDescriptor::new(ArtifactKind::WebContent, dir.path());
        assert!(artifact.validate().is_ok());
    }

    /// Test: a directory without index.html is rejected.
    /// Expected: a distinct error naming the missing entry point.
    #[test]
    fn missing_entry_point_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();

        let artifact = ArtifactDescriptor::new(ArtifactKind::WebContent, dir.path());
        let err = artifact.validate().unwrap_err();

        assert!(matches!(err, ValidationError::MissingEntryPoint(_)));
        assert!(err.to_string().contains("index.html"));
    }

    /// Test: index.html must sit at the artifact root, not in a subdirectory.
    /// Expected: validation fails.
    #[test]
    fn nested_entry_point_does_not_count() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/index.html"), "<html></html>").unwrap();

        let artifact = ArtifactDescriptor::new(ArtifactKind::WebContent, dir.path());
        assert!(matches!(
            artifact.validate(),
            Err(ValidationError::MissingEntryPoint(_))
        ));
    }
}

mod linux_service {
    use super::*;

    /// Test: any existing directory is a valid service artifact.
    /// Expected: validation succeeds with no structural checks.
    #[test]
    fn any_directory_is_valid() {
        let dir = TempDir::new().unwrap();

        let artifact = ArtifactDescriptor::new(ArtifactKind::LinuxService, dir.path());
        assert!(artifact.validate().is_ok());
    }

    /// Test: a file path is not a valid service artifact.
    /// Expected: a not-a-directory error.
    #[test]
    fn file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("server");
        fs::write(&file, "binary").unwrap();

        let artifact = ArtifactDescriptor::new(ArtifactKind::LinuxService, &file);
        assert!(matches!(
            artifact.validate(),
            Err(ValidationError::NotADirectory(_))
        ));
    }
}

mod common_rules {
    use super::*;

    /// Test: an empty path is rejected before touching the filesystem.
    /// Expected: EmptyPath.
    #[test]
    fn empty_path_is_rejected() {
        let artifact = ArtifactDescriptor::new(ArtifactKind::WebContent, "");
        assert!(matches!(artifact.validate(), Err(ValidationError::EmptyPath)));
    }

    /// Test: a nonexistent path is rejected with the path in the message.
    /// Expected: Missing.
    #[test]
    fn missing_path_is_rejected() {
        let artifact =
            ArtifactDescriptor::new(ArtifactKind::LinuxService, "/nonexistent/build/output");
        let err = artifact.validate().unwrap_err();

        assert!(matches!(err, ValidationError::Missing(_)));
        assert!(err.to_string().contains("/nonexistent/build/output"));
    }

    /// Test: kind strings parse from their CLI spellings.
    /// Expected: "web" and "service" parse, anything else errors.
    #[test]
    fn kind_parsing() {
        assert_eq!("web".parse::<ArtifactKind>().unwrap(), ArtifactKind::WebContent);
        assert_eq!(
            "service".parse::<ArtifactKind>().unwrap(),
            ArtifactKind::LinuxService
        );
        assert!("webgl".parse::<ArtifactKind>().is_err());
    }
}
