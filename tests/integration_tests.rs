//! Integration tests against real object_store backends
//!
//! Tests the full flow: file bytes → parts → concurrent workers → completed object

use bytes::Bytes;
use clap::Parser;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, ObjectStore};
use solidafy_load::cli::{upload_parts, Cli, Runner};
use solidafy_load::object_storage::{
    CloudDestination, ObjectKey, ObjectLoaderPartLoader, ObjectStoreClient, PartFactory,
    UploadsInProgress,
};
use solidafy_load::{DestinationCatalog, DestinationConfig, DestinationStream};
use std::sync::Arc;

fn catalog() -> Arc<DestinationCatalog> {
    Arc::new(DestinationCatalog::new(vec![DestinationStream::new("users")
        .with_namespace("public")
        .with_generation_id(12)]))
}

fn payload(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()
}

fn memory_loader() -> (Arc<ObjectLoaderPartLoader>, Arc<InMemory>) {
    let store = Arc::new(InMemory::new());
    let destination = CloudDestination::from_store(store.clone(), "memory", "");
    let loader = ObjectLoaderPartLoader::new(
        Arc::new(ObjectStoreClient::new(destination)),
        catalog(),
        Arc::new(UploadsInProgress::new()),
        Arc::new(DestinationConfig::new("memory://")),
    );
    (Arc::new(loader), store)
}

// ============================================================================
// In-Memory Store
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_workers_produce_one_object() {
    let (loader, store) = memory_loader();
    let data = payload(10_000);
    let parts = PartFactory::new("users/data.bin")
        .split(data.clone(), 1_000)
        .unwrap();
    assert_eq!(parts.len(), 10);

    let key = ObjectKey::new("public.users", "users/data.bin");
    let completed = upload_parts(Arc::clone(&loader), key, parts, 4)
        .await
        .unwrap();

    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].object_key, "users/data.bin");
    assert_eq!(completed[0].location, "memory://users/data.bin");
    assert_eq!(completed[0].parts, 10);
    assert!(loader.uploads().is_empty());

    let result = store
        .get(&ObjectPath::from("users/data.bin"))
        .await
        .unwrap();
    let generation = result
        .attributes
        .get(&Attribute::Metadata("ab-generation-id".into()))
        .map(|v| AsRef::<str>::as_ref(v).to_string());
    assert_eq!(generation.as_deref(), Some("12"));
    assert_eq!(result.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn test_more_workers_than_parts() {
    let (loader, store) = memory_loader();
    let parts = PartFactory::new("users/small.bin")
        .split(Bytes::from_static(b"tiny"), 1_000)
        .unwrap();

    let key = ObjectKey::new("users", "users/small.bin").with_upload_id("run-1");
    let completed = upload_parts(loader, key, parts, 8).await.unwrap();

    assert_eq!(completed.len(), 1);
    let bytes = store
        .get(&ObjectPath::from("users/small.bin"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), b"tiny");
}

#[tokio::test]
async fn test_empty_payload_creates_empty_object() {
    let (loader, store) = memory_loader();
    let parts = PartFactory::new("users/empty.bin")
        .split(Bytes::new(), 1_000)
        .unwrap();

    let key = ObjectKey::new("users", "users/empty.bin");
    let completed = upload_parts(loader, key, parts, 2).await.unwrap();

    assert_eq!(completed[0].parts, 1);
    let bytes = store
        .get(&ObjectPath::from("users/empty.bin"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_unknown_stream_fails_upload() {
    let (loader, _store) = memory_loader();
    let parts = PartFactory::new("x").split(payload(10), 5).unwrap();

    let err = upload_parts(loader, ObjectKey::new("missing", "x"), parts, 2)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found in catalog"));
}

// ============================================================================
// Local Filesystem via CLI
// ============================================================================

#[tokio::test]
async fn test_cli_upload_to_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("dest");
    let input = dir.path().join("users.jsonl");
    let data = payload(4_096);
    std::fs::write(&input, &data).unwrap();

    let config_path = dir.path().join("destination.yaml");
    std::fs::write(
        &config_path,
        format!(
            "destination: \"{}\"\npart_size_bytes: 1000\npart_workers: 3\n",
            dest.display()
        ),
    )
    .unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(
        &catalog_path,
        r#"{"streams": [{"namespace": "public", "name": "users"}]}"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "solidafy-load",
        "--config",
        config_path.to_str().unwrap(),
        "upload",
        "--catalog",
        catalog_path.to_str().unwrap(),
        "--stream",
        "public.users",
        "--input",
        input.to_str().unwrap(),
        "--key",
        "out/users.jsonl",
    ])
    .unwrap();
    Runner::new(cli).run().await.unwrap();

    let written = std::fs::read(dest.join("out").join("users.jsonl")).unwrap();
    assert_eq!(written, data.to_vec());
}

#[tokio::test]
async fn test_cli_check_requires_config() {
    let cli = Cli::try_parse_from(["solidafy-load", "check"]).unwrap();
    let err = Runner::new(cli).run().await.unwrap_err();
    assert!(err.to_string().contains("--config is required"));
}
