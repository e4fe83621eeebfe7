use std::{path::PathBuf, sync::Arc, time::Duration};

use sea_orm::Database;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerConfig, TlsFiles};

async fn engine() -> Arc<Engine> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Arc::new(Engine::builder().database(db).build().await.unwrap())
}

/// Self-signed certificate for `localhost` / `127.0.0.1`.
fn fixtures() -> TlsFiles {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    TlsFiles {
        cert_path: dir.join("cert.pem"),
        key_path: dir.join("key.pem"),
    }
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn https_listener_comes_up() {
    let port = free_port();
    let config = ServerConfig {
        port,
        tls: Some(fixtures()),
        ..ServerConfig::default()
    };
    let handle = tokio::spawn(server::run(engine().await, config));

    let mut connected = false;
    for _ in 0..100 {
        if handle.is_finished() {
            break;
        }
        if tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .is_ok()
        {
            connected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(!handle.is_finished());
    assert!(connected);
    handle.abort();
}

#[tokio::test]
async fn missing_key_file_fails_startup() {
    let mut tls = fixtures();
    tls.key_path = tls.key_path.with_file_name("missing.pem");
    let config = ServerConfig {
        port: free_port(),
        tls: Some(tls),
        ..ServerConfig::default()
    };

    let err = server::run(engine().await, config).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
