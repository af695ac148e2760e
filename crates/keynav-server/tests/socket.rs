use std::{
    path::{Path, PathBuf},
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    time::Duration,
};

use async_trait::async_trait;
use ax_query::mock::{MockAx, MockElement};
use config::LoadedConfig;
use keynav_engine::{
    Collaborators, Engine,
    mock::{MockEventTap, MockGrid, MockHotkeyApi, MockOverlay, MockPointer},
};
use keynav_protocol::{Command, Response};
use keynav_server::{Client, CommandHandler, Error, IPCServer, Server};
use tokio::{io::AsyncWriteExt, net::UnixStream, time::sleep};

fn socket_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("keynav-it-{}-{}", std::process::id(), name));
    dir.join("keynav.sock")
}

async fn wait_for(path: &Path) {
    for _ in 0..250 {
        if path.exists() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("socket {} never appeared", path.display());
}

fn engine(hotkeys: &MockHotkeyApi) -> (Engine, MockAx) {
    let window = MockElement::new(1, "AXWindow", (0, 0, 800, 600))
        .child(MockElement::new(2, "AXButton", (10, 10, 40, 20)).title("ok"));
    let ax = MockAx::new().with_window(window);
    let deps = Collaborators {
        ax: Arc::new(ax.clone()),
        overlay: Arc::new(MockOverlay::new()),
        tap: Arc::new(MockEventTap::new()),
        hotkeys: Arc::new(hotkeys.clone()),
        pointer: Arc::new(MockPointer::new()),
        grid: Arc::new(MockGrid::default()),
    };
    (Engine::new(deps, LoadedConfig::defaults()), ax)
}

fn cmd(line: &str) -> Command {
    Command::parse(line).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn daemon_round_trip() {
    let path = socket_path("daemon");
    let hotkeys = MockHotkeyApi::new();
    let (engine, _ax) = engine(&hotkeys);
    let server = Server::new(engine.clone()).with_socket_path(path.to_string_lossy());
    let shutdown = server.shutdown_handle();
    let task = tokio::spawn(server.run());
    wait_for(&path).await;
    assert_eq!(hotkeys.registered().len(), 3);

    let client = Client::new_with_socket(path.to_string_lossy());
    assert_eq!(client.send(&cmd("ping")).await.unwrap().message, "pong");

    let resp = client.send(&cmd("hints")).await.unwrap();
    assert!(resp.success, "{}", resp.message);
    let status = client.send(&cmd("status")).await.unwrap();
    assert_eq!(status.data.unwrap()["mode"], "hints");

    let resp = client.send(&cmd("teleport now")).await.unwrap();
    assert!(!resp.success);
    assert_eq!(resp.message, "unknown command: teleport");

    shutdown.store(true, Ordering::SeqCst);
    task.await.unwrap().unwrap();
    assert_eq!(engine.mode_name().await, "idle");
    assert!(hotkeys.registered().is_empty());
    assert!(!path.exists());

    match client.send(&cmd("ping")).await {
        Err(Error::NotRunning(_)) => {}
        other => panic!("{:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_request_gets_a_failure() {
    let path = socket_path("malformed");
    let (engine, _ax) = engine(&MockHotkeyApi::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let server = Arc::new(IPCServer::new(
        path.to_string_lossy(),
        Arc::new(engine),
        shutdown.clone(),
    ));
    let running = server.clone();
    let task = tokio::spawn(async move { running.run().await });
    wait_for(&path).await;

    let mut raw = UnixStream::connect(&path).await.unwrap();
    raw.write_all(&[0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'])
        .await
        .unwrap();
    let mut io = keynav_protocol::ipc::framed(raw);
    let resp: Response = keynav_protocol::ipc::recv(&mut io).await.unwrap().unwrap();
    assert!(!resp.success);
    assert!(resp.message.starts_with("invalid request"));
    assert!(
        keynav_protocol::ipc::recv::<_, Response>(&mut io)
            .await
            .unwrap()
            .is_none()
    );

    shutdown.store(true, Ordering::SeqCst);
    task.await.unwrap().unwrap();
}

/// Never answers within any reasonable time.
struct Stalled;

#[async_trait]
impl CommandHandler for Stalled {
    async fn handle(&self, _cmd: Command) -> Response {
        sleep(Duration::from_secs(60)).await;
        Response::ok("late")
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_connections_are_bounded() {
    let path = socket_path("stalled");
    let shutdown = Arc::new(AtomicBool::new(false));
    let server = Arc::new(
        IPCServer::new(path.to_string_lossy(), Arc::new(Stalled), shutdown.clone())
            .with_connection_deadline(Duration::from_millis(100)),
    );
    let running = server.clone();
    let task = tokio::spawn(async move { running.run().await });
    wait_for(&path).await;

    // the server drops the connection at its deadline
    let client = Client::new_with_socket(path.to_string_lossy());
    match client.send(&cmd("ping")).await {
        Err(Error::Ipc(_)) | Err(Error::Protocol(_)) => {}
        other => panic!("{:?}", other),
    }

    // the client gives up first when its own timeout is shorter
    let server_patient = socket_path("patient");
    let shutdown2 = Arc::new(AtomicBool::new(false));
    let patient = Arc::new(IPCServer::new(
        server_patient.to_string_lossy(),
        Arc::new(Stalled),
        shutdown2.clone(),
    ));
    let running = patient.clone();
    let task2 = tokio::spawn(async move { running.run().await });
    wait_for(&server_patient).await;
    let client = Client::new_with_socket(server_patient.to_string_lossy())
        .with_request_timeout(Duration::from_millis(100));
    match client.send(&cmd("ping")).await {
        Err(Error::Timeout(_)) => {}
        other => panic!("{:?}", other),
    }

    shutdown.store(true, Ordering::SeqCst);
    shutdown2.store(true, Ordering::SeqCst);
    task.await.unwrap().unwrap();
    task2.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refuses_to_replace_a_regular_file() {
    let path = socket_path("occupied");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"not a socket").unwrap();
    let (engine, _ax) = engine(&MockHotkeyApi::new());
    let server = IPCServer::new(
        path.to_string_lossy(),
        Arc::new(engine),
        Arc::new(AtomicBool::new(false)),
    );
    assert!(server.run().await.is_err());
    drop(server);
    assert!(path.exists());
}
