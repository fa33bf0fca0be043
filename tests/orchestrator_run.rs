//! End-to-end tests of the retrieval orchestration loop with stub providers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use deep_research_core::{
    CoverageReport, DeepResearchOrchestrator, DocumentResult, OrchestratorConfig, Provider,
    ProviderError, ProviderKind, ProviderQuery, RunParams, Section, SeedDocumentProvider,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Returns a fixed document list and records every sub-query it receives.
struct RecordingProvider {
    id: String,
    docs: Vec<DocumentResult>,
    received: Arc<Mutex<Vec<String>>>,
}

impl RecordingProvider {
    fn new(id: &str, docs: Vec<DocumentResult>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                id: id.to_string(),
                docs,
                received: Arc::clone(&received),
            },
            received,
        )
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::WebSearch
    }

    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
        self.received
            .lock()
            .unwrap()
            .extend(query.subqueries.iter().cloned());
        Ok(self.docs.clone())
    }
}

fn doc(id: &str, url: &str, score: f64) -> DocumentResult {
    DocumentResult::new(id, format!("content of {id}"))
        .with_url(url)
        .with_score(score)
}

fn run_params(sections: Vec<Section>, providers: Vec<Arc<dyn Provider>>) -> RunParams {
    RunParams {
        question: "カーボンプライシング".to_string(),
        base_subqueries: vec!["炭素税 税率の推移".to_string()],
        providers,
        sections,
        limit: 10,
        seed_urls: vec![],
        seed_provider: None,
    }
}

#[tokio::test]
async fn early_exit_when_targets_met_in_first_iteration() {
    init_tracing();
    let (web, _) = RecordingProvider::new(
        "web",
        vec![
            doc("1", "http://a.example/1", 0.9),
            doc("2", "http://a.example/2", 0.8),
        ],
    );
    let sections = vec![Section::new("overview", vec!["web".into()], 2)];

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections.clone(), vec![Arc::new(web)]))
        .await;

    assert_eq!(outcome.iterations, 1);
    let coverage = CoverageReport::compute(&sections, &outcome.section_hits);
    assert!(coverage.is_complete());
    assert_eq!(coverage.current["overview"], 2);
}

#[tokio::test]
async fn partial_coverage_after_cap_is_normal_return() {
    init_tracing();
    let (web, _) = RecordingProvider::new("web", vec![]);
    let sections = vec![Section::new("overview", vec!["web".into()], 3)];

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections.clone(), vec![Arc::new(web)]))
        .await;

    assert_eq!(outcome.iterations, 3);
    assert!(outcome.all_docs.is_empty());
    let coverage = CoverageReport::compute(&sections, &outcome.section_hits);
    assert_eq!(coverage.missing["overview"], 3);
}

#[tokio::test]
async fn no_provider_ever_receives_a_repeated_query_string() {
    init_tracing();
    // Empty results force the full three iterations; unknown section keys fall
    // back to the bare question, so the second section's only candidate is
    // already seen and it goes quiet after iteration one.
    let (web, received) = RecordingProvider::new("web", vec![]);
    let sections = vec![
        Section::new("mystery-a", vec!["web".into()], 2),
        Section::new("mystery-b", vec!["web".into()], 2),
        Section::new("overview", vec!["web".into()], 2),
    ];

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections, vec![Arc::new(web)]))
        .await;
    assert_eq!(outcome.iterations, 3);

    let received = received.lock().unwrap();
    assert!(!received.is_empty());
    let mut unique = received.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), received.len(), "repeated query dispatched: {received:?}");
}

#[tokio::test]
async fn later_sections_see_entities_from_earlier_sections_same_iteration() {
    init_tracing();
    // Section one returns a document carrying a speaker; section two runs
    // after it in the same iteration and must weave that speaker into its
    // follow-up queries.
    let speaker_doc = doc("1", "http://kokkai.example/1", 0.9).with_extra("speaker", "山田太郎");
    let (first, _) = RecordingProvider::new("vdb", vec![speaker_doc]);
    let (second, received) = RecordingProvider::new("web", vec![]);

    let sections = vec![
        Section::new("overview", vec!["vdb".into()], 1),
        Section::new("background", vec!["web".into()], 1),
    ];

    DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections, vec![Arc::new(first), Arc::new(second)]))
        .await;

    let received = received.lock().unwrap();
    assert!(
        received.iter().any(|q| q.contains("山田太郎")),
        "expected a speaker-expanded query, got: {received:?}"
    );
}

#[tokio::test]
async fn repeated_document_never_double_counts_coverage() {
    init_tracing();
    // The provider returns the same document every call; coverage must stay
    // at one unique hit however many iterations run.
    let (web, _) = RecordingProvider::new("web", vec![doc("1", "http://a.example/1", 0.9)]);
    let sections = vec![Section::new("overview", vec!["web".into()], 2)];

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections.clone(), vec![Arc::new(web)]))
        .await;

    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.section_hits.len(), 1);
    let coverage = CoverageReport::compute(&sections, &outcome.section_hits);
    assert_eq!(coverage.current["overview"], 1);
    assert_eq!(coverage.missing["overview"], 1);
}

#[tokio::test]
async fn coverage_counts_attribution_not_relevance() {
    init_tracing();
    // A document counts toward every section that retrieved it, whether or
    // not it is semantically relevant to that section's topic. Known gap in
    // the coverage model; pinned here rather than silently "fixed".
    let shared = doc("1", "http://a.example/1", 0.9);
    let (p1, _) = RecordingProvider::new("vdb", vec![shared.clone()]);
    let (p2, _) = RecordingProvider::new("web", vec![shared]);

    let sections = vec![
        Section::new("overview", vec!["vdb".into()], 1),
        Section::new("timeline", vec!["web".into()], 1),
    ];

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(run_params(sections.clone(), vec![Arc::new(p1), Arc::new(p2)]))
        .await;

    assert_eq!(outcome.iterations, 1);
    let coverage = CoverageReport::compute(&sections, &outcome.section_hits);
    assert_eq!(coverage.current["overview"], 1);
    assert_eq!(coverage.current["timeline"], 1);
    assert_eq!(outcome.section_hits.len(), 1);
}

#[tokio::test]
async fn seed_provider_contributes_to_allow_listed_sections() {
    init_tracing();
    let seed_docs = vec![
        DocumentResult::new("s1", "seed one").with_url("http://seed.example/1"),
        DocumentResult::new("s2", "seed two").with_url("http://seed.example/2"),
    ];
    let (web, _) = RecordingProvider::new("web", vec![]);

    let sections = vec![Section::new(
        "overview",
        vec!["web".into(), "seed".into()],
        2,
    )];
    let mut params = run_params(sections.clone(), vec![Arc::new(web)]);
    params.seed_provider = Some(Arc::new(SeedDocumentProvider::new("seed", seed_docs)));

    let outcome = DeepResearchOrchestrator::new(OrchestratorConfig::default())
        .run(params)
        .await;

    assert_eq!(outcome.iterations, 1);
    let coverage = CoverageReport::compute(&sections, &outcome.section_hits);
    assert!(coverage.is_complete());
}

#[tokio::test]
async fn custom_iteration_cap_is_respected() {
    init_tracing();
    let (web, _) = RecordingProvider::new("web", vec![]);
    let sections = vec![Section::new("overview", vec!["web".into()], 1)];

    let config = OrchestratorConfig {
        max_iterations: 1,
        ..OrchestratorConfig::default()
    };
    let outcome = DeepResearchOrchestrator::new(config)
        .run(run_params(sections, vec![Arc::new(web)]))
        .await;
    assert_eq!(outcome.iterations, 1);
}
