use super::*;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::embedding::test_support::MockEmbedder;
use crate::git::test_support::init_fixture_repo;
use crate::toolchain::ToolChainKind;
use crate::vector_db::test_support::InMemoryVectorDb;
use crate::vector_db::{CommitRow, CommitSearchResult, TimeWindow};
use std::collections::HashSet;
use tempfile::TempDir;

const DIM: usize = 8;

struct Harness {
    client: TimeMachineClient,
    vector_db: Arc<InMemoryVectorDb>,
    catalog: Arc<Catalog>,
    _scratch: TempDir,
}

fn harness_with(embedder: MockEmbedder) -> Harness {
    let scratch = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.scratch_dir = scratch.path().join("temprepo");

    let vector_db = Arc::new(InMemoryVectorDb::default());
    let catalog = Arc::new(Catalog::open_in_memory().unwrap());
    let client = TimeMachineClient::with_components(
        config,
        Arc::new(embedder),
        vector_db.clone(),
        catalog.clone(),
    );

    Harness {
        client,
        vector_db,
        catalog,
        _scratch: scratch,
    }
}

fn harness() -> Harness {
    harness_with(MockEmbedder::new(DIM))
}

fn local_request(path: &Path, tool_chains: Vec<ToolChainKind>) -> LoadRequest {
    let mut req = LoadRequest::new(path.to_string_lossy(), "", tool_chains);
    req.local = true;
    req
}

fn table_for(path: &Path, kind: ToolChainKind) -> String {
    crate::git::repo_url_to_table_name(&path.to_string_lossy(), kind.as_str())
}

#[tokio::test]
async fn test_load_local_repository() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 10);
    let h = harness();

    let summary = h
        .client
        .load(local_request(repo_dir.path(), vec![ToolChainKind::LangChain]))
        .await
        .unwrap();

    assert_eq!(summary.commit_count, 10);
    assert_eq!(
        summary.workloads.iter().map(|r| r.count).collect::<Vec<_>>(),
        vec![1, 1, 1, 1, 1, 5]
    );
    assert_eq!(summary.ranges.len(), 6);
    assert!(summary.is_complete());
    assert_eq!(summary.rows_written["langchain"], 10);

    let table = table_for(repo_dir.path(), ToolChainKind::LangChain);
    let rows = h.vector_db.rows(&table);
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r.vector.len() == DIM));

    let hashes: HashSet<&str> = rows.iter().map(|r| r.commit_hash.as_str()).collect();
    assert_eq!(hashes.len(), 10, "every commit is stored exactly once");
    let ids: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_load_records_catalog_and_recreates_tables() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 4);
    let h = harness();

    let summary = h
        .client
        .load(local_request(
            repo_dir.path(),
            vec![ToolChainKind::LangChain, ToolChainKind::LlamaIndex],
        ))
        .await
        .unwrap();

    let langchain_table = table_for(repo_dir.path(), ToolChainKind::LangChain);
    let llamaindex_table = table_for(repo_dir.path(), ToolChainKind::LlamaIndex);
    assert_eq!(summary.tables["langchain"], langchain_table);
    assert_eq!(summary.tables["llamaindex"], llamaindex_table);

    let recreated = h.vector_db.recreated.lock().unwrap().clone();
    assert_eq!(
        recreated,
        vec![(langchain_table.clone(), DIM), (llamaindex_table.clone(), DIM)]
    );

    let repo_url = repo_dir.path().to_string_lossy().to_string();
    assert_eq!(
        h.catalog.read(ToolChainKind::LlamaIndex).unwrap()[&repo_url],
        llamaindex_table
    );
    assert_eq!(h.vector_db.rows(&langchain_table).len(), 4);
    assert_eq!(h.vector_db.rows(&llamaindex_table).len(), 4);
}

#[tokio::test]
async fn test_only_non_empty_ranges_are_spawned() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 3);
    let h = harness();

    let summary = h
        .client
        .load(local_request(repo_dir.path(), vec![ToolChainKind::LangChain]))
        .await
        .unwrap();

    assert_eq!(summary.workloads.len(), 6);
    assert_eq!(summary.ranges.len(), 1);
    assert_eq!(summary.ranges[0].name, "Thread_skip_0_3");
    assert_eq!(summary.ranges[0].commits_read, 3);
}

#[tokio::test]
async fn test_empty_repository_still_sets_up_tables() {
    let repo_dir = TempDir::new().unwrap();
    git2::Repository::init(repo_dir.path()).unwrap();
    let h = harness();

    let summary = h
        .client
        .load(local_request(repo_dir.path(), vec![ToolChainKind::LangChain]))
        .await
        .unwrap();

    assert_eq!(summary.commit_count, 0);
    assert!(summary.ranges.is_empty());
    assert_eq!(summary.rows_written["langchain"], 0);
    assert_eq!(h.vector_db.recreated.lock().unwrap().len(), 1);
    assert_eq!(h.catalog.entries().unwrap().len(), 1);
}

#[tokio::test]
async fn test_max_threads_override() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 7);
    let h = harness();

    let mut req = local_request(repo_dir.path(), vec![ToolChainKind::LangChain]);
    req.max_threads = Some(2);
    let summary = h.client.load(req).await.unwrap();

    assert_eq!(
        summary.workloads,
        vec![
            CommitRange { skip: 0, count: 3 },
            CommitRange { skip: 3, count: 4 }
        ]
    );
    assert_eq!(summary.rows_written["langchain"], 7);
}

#[tokio::test]
async fn test_embedding_failures_skip_commits_without_failing_ranges() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 6);
    let mut embedder = MockEmbedder::new(DIM);
    embedder.fail_first = 2;
    let h = harness_with(embedder);

    let mut req = local_request(repo_dir.path(), vec![ToolChainKind::LlamaIndex]);
    req.max_threads = Some(1);
    let summary = h.client.load(req).await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.rows_written["llamaindex"], 4);
    assert_eq!(summary.ranges[0].commits_skipped["llamaindex"], 2);
}

#[tokio::test]
async fn test_create_index_after_load() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 2);
    let h = harness();

    let mut req = local_request(repo_dir.path(), vec![ToolChainKind::LangChain]);
    req.create_index = true;
    let summary = h.client.load(req).await.unwrap();

    let table = table_for(repo_dir.path(), ToolChainKind::LangChain);
    assert_eq!(summary.indexed_tables, vec![table.clone()]);
    assert_eq!(h.vector_db.indexed.lock().unwrap().clone(), vec![table]);
}

#[tokio::test]
async fn test_missing_local_path_fails() {
    let h = harness();
    let req = local_request(
        Path::new("/definitely/not/a/repository"),
        vec![ToolChainKind::LangChain],
    );

    let err = h.client.load(req).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_load_clones_into_scratch_dir() {
    let source = TempDir::new().unwrap();
    let repo = init_fixture_repo(source.path(), 5);
    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let h = harness();

    let repo_url = source.path().to_string_lossy().to_string();
    let summary = h
        .client
        .load_git_history(&repo_url, &branch, &[ToolChainKind::LangChain])
        .await
        .unwrap();

    assert_eq!(summary.commit_count, 5);
    assert!(h.client.config.storage.scratch_dir.exists());
    assert_eq!(
        h.vector_db
            .rows(&table_for(source.path(), ToolChainKind::LangChain))
            .len(),
        5
    );
}

/// Store whose writes always fail
struct BrokenStore;

#[async_trait::async_trait]
impl VectorDatabase for BrokenStore {
    async fn recreate_table(&self, _table: &str, _dimension: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, table: &str, _rows: Vec<CommitRow>) -> Result<usize> {
        anyhow::bail!("disk full while writing {}", table)
    }

    async fn create_index(&self, _table: &str) -> Result<bool> {
        Ok(false)
    }

    async fn count_rows(&self, _table: &str) -> Result<usize> {
        Ok(0)
    }

    async fn search(
        &self,
        _table: &str,
        _query_vector: Vec<f32>,
        _limit: usize,
        _window: TimeWindow,
    ) -> Result<Vec<CommitSearchResult>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_failed_workers_are_reported() {
    let repo_dir = TempDir::new().unwrap();
    init_fixture_repo(repo_dir.path(), 12);
    let client = TimeMachineClient::with_components(
        Config::default(),
        Arc::new(MockEmbedder::new(DIM)),
        Arc::new(BrokenStore),
        Arc::new(Catalog::open_in_memory().unwrap()),
    );

    let mut req = local_request(repo_dir.path(), vec![ToolChainKind::LangChain]);
    req.max_threads = Some(3);
    let summary = client.load(req).await.unwrap();

    assert!(!summary.is_complete());
    assert_eq!(
        summary.failed_ranges,
        vec!["Thread_skip_0_4", "Thread_skip_4_4", "Thread_skip_8_4"]
    );
    assert!(summary.ranges.is_empty());
    assert_eq!(summary.rows_written["langchain"], 0);
}
