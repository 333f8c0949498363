use async_trait::async_trait;
use hostpkg::{
    CancelHandle, CommandLine, CommandRunner, Invocation, ManagerConfig, PackageManager,
    PackagingError, ProxySettings, Variant,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies with scripted outcomes in order and records every command it runs.
#[derive(Clone, Default)]
struct ScriptedRunner {
    replies: Arc<Mutex<VecDeque<(i32, String)>>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    fn new(replies: &[(i32, &str)]) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                replies.iter().map(|(c, o)| (*c, o.to_string())).collect(),
            )),
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> std::io::Result<Invocation> {
        self.seen.lock().unwrap().push(command.argv().join(" "));
        let (code, output) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((0, String::new()));
        Ok(Invocation::new(command.clone(), Some(code), output))
    }
}

fn manager(variant: Variant, runner: &ScriptedRunner) -> PackageManager<ScriptedRunner> {
    let config = ManagerConfig::new().with_delay(Duration::ZERO);
    PackageManager::new(variant, config, runner.clone())
}

#[tokio::test]
async fn test_snap_install_missing_package() {
    let runner = ScriptedRunner::new(&[(1, "error: snap \"foo\" not found")]);
    let pm = manager(Variant::Snap, &runner);

    let err = pm.install(&["foo"]).await.unwrap_err();

    assert!(matches!(&err, PackagingError::NotFound { name, .. } if name == "foo"));
    assert_eq!(runner.seen(), vec!["snap install foo"]);
}

#[tokio::test(start_paused = true)]
async fn test_apt_update_transient_then_success() {
    let runner = ScriptedRunner::new(&[
        (100, "E: Could not get lock /var/lib/apt/lists/lock"),
        (0, ""),
    ]);
    let delay = Duration::from_secs(10);
    let pm = PackageManager::new(
        Variant::Apt,
        ManagerConfig::new().with_delay(delay),
        runner.clone(),
    );

    let start = tokio::time::Instant::now();
    pm.update().await.unwrap();

    assert_eq!(runner.seen().len(), 2);
    assert!(runner.seen()[0].ends_with(" update"));
    assert!(start.elapsed() >= delay);
}

#[tokio::test]
async fn test_attempts_are_bounded() {
    let runner = ScriptedRunner::new(&[(100, "lock"), (100, "lock"), (100, "lock"), (0, "")]);
    let config = ManagerConfig::new()
        .with_attempts(3)
        .with_delay(Duration::ZERO);
    let pm = PackageManager::new(Variant::Yum, config, runner.clone());

    let err = pm.upgrade().await.unwrap_err();

    assert!(matches!(err, PackagingError::AttemptsExceeded { attempts: 3, code: 100, .. }));
    assert_eq!(err.output(), Some("lock"));
    assert_eq!(runner.seen().len(), 3);
}

#[tokio::test]
async fn test_snap_proxy_unset_and_configured() {
    let runner = ScriptedRunner::new(&[
        (1, "error: snap \"system\" has no \"proxy\" configuration option"),
        (0, "Key          Value\nproxy.http   localhost:8080\nproxy.https  localhost:8181\n"),
    ]);
    let pm = manager(Variant::Snap, &runner);

    assert_eq!(pm.get_proxy_settings().await.unwrap(), ProxySettings::default());
    assert_eq!(
        pm.get_proxy_settings().await.unwrap(),
        ProxySettings {
            http: "localhost:8080".to_string(),
            https: "localhost:8181".to_string(),
            ..Default::default()
        }
    );
    assert_eq!(runner.seen(), vec!["snap get system proxy"; 2]);
}

#[tokio::test]
async fn test_apt_proxy_round_trip_through_apt_config() {
    let settings = ProxySettings {
        http: "http://proxy:3128".to_string(),
        https: "http://proxy:3129".to_string(),
        ftp: String::new(),
        no_proxy: "localhost,10.0.0.1".to_string(),
    };
    let config = ManagerConfig::new();
    let codec = hostpkg::proxy::ProxyCodec::for_variant(Variant::Apt, &config);
    let dumped = codec.contents(&settings);

    let runner = ScriptedRunner::new(&[(0, dumped.as_str())]);
    let pm = manager(Variant::Apt, &runner);

    assert_eq!(pm.get_proxy_settings().await.unwrap(), settings);
}

#[tokio::test]
async fn test_set_proxy_runs_one_command_per_field() {
    let runner = ScriptedRunner::new(&[]);
    let pm = PackageManager::new(
        Variant::Snap,
        ManagerConfig::new().with_snap_scope("core"),
        runner.clone(),
    );
    let settings = ProxySettings {
        http: "http://proxy:3128".to_string(),
        no_proxy: "localhost".to_string(),
        ..Default::default()
    };

    pm.set_proxy(&settings).await.unwrap();

    assert_eq!(
        runner.seen(),
        vec![
            "snap set core proxy.http=http://proxy:3128",
            "snap set core proxy.no-proxy=localhost",
        ]
    );
}

#[tokio::test]
async fn test_set_proxy_aborts_at_first_failure() {
    let runner = ScriptedRunner::new(&[(0, ""), (2, "sh: permission denied"), (0, "")]);
    let pm = manager(Variant::Yum, &runner);
    let settings = ProxySettings {
        http: "http://a:1".to_string(),
        https: "http://b:2".to_string(),
        ftp: "ftp://c:3".to_string(),
        no_proxy: String::new(),
    };

    let err = pm.set_proxy(&settings).await.unwrap_err();

    assert!(matches!(err, PackagingError::Fatal { code: Some(2), .. }));
    assert_eq!(runner.seen().len(), 2);
}

#[tokio::test]
async fn test_listing_installed_packages() {
    let runner = ScriptedRunner::new(&[(
        0,
        "bash\t\tinstall\nlibc6:amd64\tinstall\nvim\t\tdeinstall\n",
    )]);
    let pm = manager(Variant::Apt, &runner);

    assert_eq!(pm.list_installed().await.unwrap(), vec!["bash", "libc6"]);
    assert_eq!(runner.seen(), vec!["dpkg --get-selections"]);
}

#[tokio::test]
async fn test_cancel_stops_retry_loop() {
    let runner = ScriptedRunner::new(&[(100, "lock"); 5]);
    let handle = CancelHandle::new();
    let pm = PackageManager::new(
        Variant::Apt,
        ManagerConfig::new().with_delay(Duration::from_secs(3600)),
        runner.clone(),
    )
    .with_cancel(handle.token());

    let (result, _) = tokio::join!(pm.update(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    assert!(matches!(result, Err(PackagingError::Cancelled { .. })));
    assert_eq!(runner.seen().len(), 1);
}

#[tokio::test]
async fn test_zypper_repositories() {
    let runner = ScriptedRunner::new(&[
        (0, ""),
        (
            0,
            "# | Alias    | Name     | Enabled\n--+----------+----------+--------\n1 | repo-oss | Main OSS | Yes\n",
        ),
    ]);
    let pm = manager(Variant::Zypper, &runner);

    pm.add_repository("https://download.opensuse.org/repositories/x/x.repo")
        .await
        .unwrap();
    assert_eq!(pm.list_repositories().await.unwrap(), vec!["repo-oss"]);
    assert!(
        runner.seen()[0]
            .ends_with("addrepo --refresh https://download.opensuse.org/repositories/x/x.repo")
    );
}
