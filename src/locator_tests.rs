use super::*;
use std::fs;
use tempfile::TempDir;

fn make_env(root: &Path, rel: &str, layout: InterpreterLayout) -> PathBuf {
    let env = root.join(rel);
    let marker = env.join(layout.marker());
    fs::create_dir_all(marker.parent().unwrap()).unwrap();
    fs::write(&marker, "").unwrap();
    env
}

fn names(envs: &[EnvironmentRef]) -> Vec<String> {
    let mut names: Vec<String> = envs.iter().map(|e| e.name.clone()).collect();
    names.sort();
    names
}

#[test]
fn test_locate_finds_posix_envs() {
    let temp = TempDir::new().unwrap();
    make_env(temp.path(), "alpha", InterpreterLayout::Posix);
    make_env(temp.path(), "group/beta", InterpreterLayout::Posix);
    fs::create_dir_all(temp.path().join("not-an-env/bin")).unwrap();

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();

    assert_eq!(names(&envs), vec!["alpha", "beta"]);
    let beta = envs.iter().find(|e| e.name == "beta").unwrap();
    assert_eq!(beta.root_path, temp.path().join("group/beta"));
    assert_eq!(beta.interpreter_path, temp.path().join("group/beta/bin/python"));
}

#[test]
fn test_locate_respects_layout() {
    let temp = TempDir::new().unwrap();
    make_env(temp.path(), "winenv", InterpreterLayout::Windows);
    make_env(temp.path(), "posixenv", InterpreterLayout::Posix);

    let windows = EnvironmentLocator::new(InterpreterLayout::Windows)
        .locate(temp.path())
        .unwrap();
    assert_eq!(names(&windows), vec!["winenv"]);
    assert!(windows[0].interpreter_path.ends_with("Scripts/python.exe"));

    let posix = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();
    assert_eq!(names(&posix), vec!["posixenv"]);
}

#[test]
fn test_locate_does_not_descend_into_envs() {
    let temp = TempDir::new().unwrap();
    let outer = make_env(temp.path(), "outer", InterpreterLayout::Posix);
    // Looks like an environment but lives inside one.
    make_env(&outer, "lib/python3.12/site-packages/nested", InterpreterLayout::Posix);

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();

    assert_eq!(names(&envs), vec!["outer"]);
    for a in &envs {
        for b in &envs {
            if a != b {
                assert!(!b.root_path.starts_with(&a.root_path));
            }
        }
    }
}

#[test]
fn test_locate_root_is_itself_an_env() {
    let temp = TempDir::new().unwrap();
    let env = make_env(temp.path(), "solo", InterpreterLayout::Posix);

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(&env)
        .unwrap();

    assert_eq!(envs.len(), 1);
    assert_eq!(envs[0].name, "solo");
}

#[test]
fn test_locate_empty_tree_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a/b/c")).unwrap();

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();

    assert!(envs.is_empty());
}

#[test]
fn test_locate_invalid_root() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let err = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(&missing)
        .unwrap_err();
    assert!(matches!(err, AuditError::InvalidRoot { .. }));

    let file = temp.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    let err = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(&file)
        .unwrap_err();
    assert!(matches!(err, AuditError::InvalidRoot { .. }));
}

#[test]
fn test_marker_must_be_a_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("odd/bin/python")).unwrap();

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();

    assert!(envs.is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinked_env_deduplicated_when_following_links() {
    let temp = TempDir::new().unwrap();
    let real = make_env(temp.path(), "real", InterpreterLayout::Posix);
    std::os::unix::fs::symlink(&real, temp.path().join("alias")).unwrap();

    let skipped = EnvironmentLocator::new(InterpreterLayout::Posix)
        .locate(temp.path())
        .unwrap();
    assert_eq!(skipped.len(), 1);

    let followed = EnvironmentLocator::new(InterpreterLayout::Posix)
        .follow_links(true)
        .locate(temp.path())
        .unwrap();
    assert_eq!(followed.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_link_into_found_env_is_not_reported_again() {
    let temp = TempDir::new().unwrap();
    let real = make_env(temp.path(), "real", InterpreterLayout::Posix);
    let inner = make_env(&real, "lib/inner", InterpreterLayout::Posix);
    std::os::unix::fs::symlink(&inner, temp.path().join("shortcut")).unwrap();

    let envs = EnvironmentLocator::new(InterpreterLayout::Posix)
        .follow_links(true)
        .locate(temp.path())
        .unwrap();

    assert_eq!(envs.len(), 1);
    let canonical: Vec<PathBuf> = envs
        .iter()
        .map(|e| e.root_path.canonicalize().unwrap())
        .collect();
    for a in &canonical {
        for b in &canonical {
            if a != b {
                assert!(!b.starts_with(a));
            }
        }
    }
}
