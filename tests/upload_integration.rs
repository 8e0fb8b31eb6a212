//! End-to-end runs against a mocked transport.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use pantheon_uploader::cli::{run, Cli};
use pantheon_uploader::plan::{Payload, UploadRequest};
use pantheon_uploader::upload::{MockTransport, UploadOutcome};

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
}

fn write_config(dir: &Path, yaml: &str) {
    let mut file = File::create(dir.join("pantheon2.yml")).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
}

fn cli_for(dir: &Path) -> Cli {
    Cli {
        operation: "push".into(),
        server: Some("http://pantheon.test".into()),
        repository: None,
        attr_file: None,
        user: None,
        password: Some("secret".into()),
        directory: Some(dir.to_path_buf()),
        dry: false,
        sandbox: false,
        verbose: false,
        sample: false,
    }
}

/// Transport that answers every probe and records every POST.
fn recording_transport(seen: Arc<Mutex<Vec<UploadRequest>>>) -> MockTransport {
    let mut transport = MockTransport::new();
    transport
        .expect_head_ok()
        .withf(|url| url == "http://pantheon.test/pantheon")
        .return_const(true);
    transport.expect_post().returning(move |request, _auth| {
        seen.lock().unwrap().push(request.clone());
        Ok(UploadOutcome {
            status: 201,
            reason: "Created".into(),
        })
    });
    transport
}

fn labels_of<'a>(seen: &'a [UploadRequest], label: &str) -> Vec<&'a UploadRequest> {
    seen.iter().filter(|r| r.label == label).collect()
}

#[test]
fn full_run_uploads_each_classified_file_once() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        r#"
repositories:
  - name: demoRepo
    modules:
      - '*.adoc'
      - modules/*.adoc
    resources:
      - resources/*
"#,
    );
    touch(&dir.path().join("a.adoc"));
    touch(&dir.path().join("modules/b.adoc"));
    touch(&dir.path().join("notes.txt"));
    touch(&dir.path().join("resources/logo.png"));
    touch(&dir.path().join(".git/c.adoc"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    run(&cli_for(dir.path()), &transport).unwrap();

    let seen = seen.lock().unwrap();

    // Workspace node first, at the repository root.
    assert_eq!(seen[0].label, "workspace");
    assert_eq!(
        seen[0].url,
        "http://pantheon.test/content/repositories/demoRepo"
    );

    let modules = labels_of(&seen, "module");
    let mut module_urls: Vec<&str> = modules.iter().map(|r| r.url.as_str()).collect();
    module_urls.sort();
    assert_eq!(
        module_urls,
        [
            "http://pantheon.test/content/repositories/demoRepo/a.adoc",
            "http://pantheon.test/content/repositories/demoRepo/modules/b.adoc",
        ]
    );

    let resources = labels_of(&seen, "resource");
    assert_eq!(resources.len(), 1);
    assert_eq!(
        resources[0].url,
        "http://pantheon.test/content/repositories/demoRepo/resources/logo.png"
    );

    // notes.txt is a leftover, .git/c.adoc was never scanned.
    assert_eq!(seen.len(), 1 + modules.len() + resources.len());
    assert!(!seen.iter().any(|r| r.url.contains("notes.txt")));
    assert!(!seen.iter().any(|r| r.url.contains(".git")));

    // Resources are processed before modules.
    let first_module = seen.iter().position(|r| r.label == "module").unwrap();
    let last_resource = seen
        .iter()
        .rposition(|r| r.label == "resource")
        .unwrap();
    assert!(last_resource < first_module);
}

#[cfg(unix)]
#[test]
fn relative_symlink_uploads_a_target_field() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    resources:\n      - resources/*\n",
    );
    touch(&dir.path().join("shared/x.adoc"));
    fs::create_dir_all(dir.path().join("resources")).unwrap();
    symlink("../shared/x", dir.path().join("resources/link")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    run(&cli_for(dir.path()), &transport).unwrap();

    let seen = seen.lock().unwrap();
    let symlinks = labels_of(&seen, "symlink");
    assert_eq!(symlinks.len(), 1);
    assert_eq!(
        symlinks[0].url,
        "http://pantheon.test/content/repositories/demoRepo/resources/link"
    );
    assert!(symlinks[0]
        .fields
        .contains(&("pant:target".to_string(), "../shared/x".to_string())));
    assert_eq!(symlinks[0].payload, Payload::None);
}

#[cfg(unix)]
#[test]
fn absolute_symlink_is_skipped_and_run_continues() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    resources:\n      - resources/*\n",
    );
    fs::create_dir_all(dir.path().join("resources")).unwrap();
    symlink("/etc/passwd", dir.path().join("resources/bad")).unwrap();
    touch(&dir.path().join("resources/ok.png"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    run(&cli_for(dir.path()), &transport).unwrap();

    let seen = seen.lock().unwrap();
    assert!(labels_of(&seen, "symlink").is_empty());
    assert_eq!(labels_of(&seen, "resource").len(), 1);
}

#[test]
fn dry_run_makes_no_network_calls_beyond_the_probe() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    modules:\n      - '*.adoc'\n",
    );
    touch(&dir.path().join("a.adoc"));

    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(true);
    transport.expect_post().times(0);

    let mut cli = cli_for(dir.path());
    cli.dry = true;
    run(&cli, &transport).unwrap();
}

#[test]
fn unreachable_server_aborts_before_any_upload() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    modules:\n      - '*.adoc'\n",
    );
    touch(&dir.path().join("a.adoc"));

    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(false);
    transport.expect_post().times(0);

    let err = run(&cli_for(dir.path()), &transport).unwrap_err();
    assert!(err.to_string().contains("not reachable"));
}

#[test]
fn attr_file_is_appended_to_resources_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    resources:\n      - resources/*\n",
    );
    touch(&dir.path().join("path/to/attr.adoc"));
    touch(&dir.path().join("resources/logo.png"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    let mut cli = cli_for(dir.path());
    cli.attr_file = Some("path/to/attr.adoc".into());
    run(&cli, &transport).unwrap();

    let seen = seen.lock().unwrap();

    // The workspace node advertises the attribute file.
    assert!(seen[0]
        .fields
        .contains(&("pant:attributeFile".to_string(), "path/to/attr.adoc".to_string())));

    let attr_uploads: Vec<&UploadRequest> = seen
        .iter()
        .filter(|r| r.url.ends_with("path/to/attr.adoc"))
        .collect();
    assert_eq!(attr_uploads.len(), 1);
    assert_eq!(attr_uploads[0].label, "resource");
}

#[test]
fn missing_attribute_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "repositories:\n  - name: demoRepo\n");

    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(true);
    transport.expect_post().times(0);

    let mut cli = cli_for(dir.path());
    cli.attr_file = Some("nope/attr.adoc".into());
    let err = run(&cli, &transport).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn missing_repository_name_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "repositories:\n  - modules:\n      - '*.adoc'\n");

    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(true);
    transport.expect_post().times(0);

    let err = run(&cli_for(dir.path()), &transport).unwrap_err();
    assert!(err.to_string().contains("repository is not set"));
}

#[test]
fn sandbox_pushes_to_the_user_area() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    modules:\n      - '*.adoc'\n",
    );
    touch(&dir.path().join("a.adoc"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    let mut cli = cli_for(dir.path());
    cli.sandbox = true;
    cli.user = Some("jdoe".into());
    run(&cli, &transport).unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .all(|r| r.url.starts_with("http://pantheon.test/content/sandbox/jdoe")));
}

#[test]
fn config_without_repositories_uploads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "server: http://pantheon.test\n");
    touch(&dir.path().join("notes.txt"));
    touch(&dir.path().join("sub/other.bin"));

    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(true);
    transport.expect_post().times(0);

    let mut cli = cli_for(dir.path());
    cli.repository = Some("demoRepo".into());
    run(&cli, &transport).unwrap();
}

#[test]
fn missing_config_treats_every_scanned_file_as_a_resource() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("notes.txt"));
    touch(&dir.path().join("sub/other.bin"));
    touch(&dir.path().join(".git/ignored"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());

    let mut cli = cli_for(dir.path());
    cli.repository = Some("demoRepo".into());
    run(&cli, &transport).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].label, "workspace");
    assert!(labels_of(&seen, "module").is_empty());

    let resources = labels_of(&seen, "resource");
    let mut urls: Vec<&str> = resources.iter().map(|r| r.url.as_str()).collect();
    urls.sort();
    assert_eq!(
        urls,
        [
            "http://pantheon.test/content/repositories/demoRepo/notes.txt",
            "http://pantheon.test/content/repositories/demoRepo/sub/other.bin",
        ]
    );
    // workspace + one resource per scanned file, nothing else
    assert_eq!(seen.len(), 3);
}

#[cfg(unix)]
#[test]
fn absolute_symlink_rejection_is_reported_at_error_severity() {
    use std::os::unix::fs::symlink;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{Layer, Registry};

    /// Custom layer collecting emitted event levels and messages.
    struct EventCollector {
        events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
    }

    impl<S> Layer<S> for EventCollector
    where
        S: tracing::Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            use std::fmt::Write as FmtWrite;
            let mut msg = String::new();
            let _ = write!(&mut msg, "{:?}", event);
            self.events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), msg));
        }
    }

    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    resources:\n      - resources/*\n",
    );
    fs::create_dir_all(dir.path().join("resources")).unwrap();
    symlink("/etc/passwd", dir.path().join("resources/bad")).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = recording_transport(seen.clone());
    run(&cli_for(dir.path()), &transport).unwrap();

    let events = events.lock().unwrap();
    assert!(
        events.iter().any(|(level, msg)| *level == tracing::Level::ERROR
            && msg.contains("absolute symlink paths are unsupported")),
        "expected an ERROR event for the rejected symlink, got: {events:?}"
    );
}

#[test]
fn upload_failures_do_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "repositories:\n  - name: demoRepo\n    modules:\n      - '*.adoc'\n",
    );
    touch(&dir.path().join("a.adoc"));
    touch(&dir.path().join("b.adoc"));

    let calls = Arc::new(Mutex::new(0usize));
    let calls_in_mock = calls.clone();
    let mut transport = MockTransport::new();
    transport.expect_head_ok().return_const(true);
    transport.expect_post().returning(move |_request, _auth| {
        *calls_in_mock.lock().unwrap() += 1;
        Ok(UploadOutcome {
            status: 500,
            reason: "Internal Server Error".into(),
        })
    });

    // Every planned request is still attempted despite the failures.
    run(&cli_for(dir.path()), &transport).unwrap();
    assert_eq!(*calls.lock().unwrap(), 3); // workspace + two modules
}
