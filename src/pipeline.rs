//! Row-by-row enrichment: lookup, classification, industry join, and output.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::classify::{Classifier, classify_company};
use crate::search::{SearchClient, SearchError};
use crate::table::{
    ClientRecord, IndustryRecord, OutputLayout, OutputRow, Table, TableError, write_output,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("search failed for {company}: {source}")]
    Search {
        company: String,
        source: SearchError,
    },
}

/// Allowed industry names in file order, plus a name → id lookup.
#[derive(Debug, Default)]
pub struct IndustryIndex {
    names: Vec<String>,
    ids: HashMap<String, String>,
}

impl IndustryIndex {
    pub fn from_records(records: impl IntoIterator<Item = IndustryRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            index.names.push(record.name.clone());
            if !record.id.is_empty() {
                index.ids.insert(record.name, record.id);
            }
        }
        if index.names.is_empty() {
            warn!("allowed industry list is empty");
        }
        index
    }

    /// Rows without a name are left out with a warning; rows without an id
    /// stay in the allowed list but join to an empty id.
    pub fn from_table(table: &Table) -> Self {
        Self::from_records(table.rows().filter_map(|row| {
            let record = IndustryRecord::from_row(&row);
            if record.is_none() {
                warn!(row = %row.to_json(), "skipping industry with missing name");
            }
            record
        }))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Empty when the classifier returned a name outside the allowed list.
    pub fn industry_id(&self, name: &str) -> &str {
        self.ids.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub degraded: usize,
}

#[derive(Debug, Clone)]
pub struct RunPaths {
    pub clients: PathBuf,
    pub industries: PathBuf,
    pub output: PathBuf,
}

struct Processed {
    row: OutputRow,
    degraded: bool,
}

/// Loads both tables, classifies every client, and overwrites the output table.
///
/// Nothing is written unless every row made it through the search step.
pub async fn run(
    paths: &RunPaths,
    layout: OutputLayout,
    search: &impl SearchClient,
    classifier: &impl Classifier,
    concurrency: usize,
) -> Result<RunSummary, RunError> {
    let clients = Table::load(&paths.clients)?;
    let industries = Table::load(&paths.industries)?;
    let index = IndustryIndex::from_table(&industries);
    info!(
        clients = clients.len(),
        industries = index.names().len(),
        "tables loaded"
    );

    let (rows, summary) = classify_clients(&clients, &index, search, classifier, concurrency).await?;

    write_output(&paths.output, &rows, layout)?;
    info!(
        path = %paths.output.display(),
        written = summary.written,
        skipped = summary.skipped,
        degraded = summary.degraded,
        "output written"
    );
    Ok(summary)
}

/// Classifies each client row. Up to `concurrency` rows are in flight at once;
/// output order always matches input order.
pub async fn classify_clients(
    clients: &Table,
    index: &IndustryIndex,
    search: &impl SearchClient,
    classifier: &impl Classifier,
    concurrency: usize,
) -> Result<(Vec<OutputRow>, RunSummary), RunError> {
    let model = classifier.describe();
    let model = model.as_str();

    let outcomes: Vec<Option<Processed>> = stream::iter(clients.rows())
        .map(|row| async move {
            let Some(client) = ClientRecord::from_row(&row) else {
                warn!(row = %row.to_json(), "skipping row with missing id or name");
                return Ok(None);
            };
            process_client(client, index, search, classifier, model)
                .await
                .map(Some)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut summary = RunSummary::default();
    let mut rows = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Some(processed) => {
                summary.written += 1;
                summary.degraded += usize::from(processed.degraded);
                rows.push(processed.row);
            }
            None => summary.skipped += 1,
        }
    }
    Ok((rows, summary))
}

async fn process_client(
    client: ClientRecord,
    index: &IndustryIndex,
    search: &impl SearchClient,
    classifier: &impl Classifier,
    model: &str,
) -> Result<Processed, RunError> {
    info!(id = %client.id, "→ Looking up {}", client.name);
    let lookup = search
        .search(&client.name)
        .await
        .map_err(|source| RunError::Search {
            company: client.name.clone(),
            source,
        })?;

    info!(id = %client.id, "→ Classifying {} using {model}", client.name);
    let classified = classify_company(classifier, &client.name, &lookup, index.names()).await;
    let result = classified.result;
    let industry_id = index.industry_id(&result.industry).to_string();

    info!(
        "✔ [{}] {} → {} (ID: {}) ({}%)",
        client.id, client.name, result.industry, industry_id, result.confidence
    );

    Ok(Processed {
        row: OutputRow {
            id: client.id,
            name: client.name,
            industry_id,
            industry: result.industry,
            confidence: result.confidence,
        },
        degraded: classified.degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifyError;
    use crate::search::LookupResult;
    use crate::table::records::Confidence;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MockSearch {
        queries: Mutex<Vec<String>>,
        fail_on: Option<String>,
        delays_ms: HashMap<String, u64>,
    }

    impl MockSearch {
        fn failing_on(name: &str) -> Self {
            Self {
                fail_on: Some(name.to_string()),
                ..Self::default()
            }
        }

        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays_ms: delays.iter().map(|(n, d)| (n.to_string(), *d)).collect(),
                ..Self::default()
            }
        }

        fn captured_queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl SearchClient for MockSearch {
        async fn search(&self, query: &str) -> Result<LookupResult, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(ms) = self.delays_ms.get(query) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.fail_on.as_deref() == Some(query) {
                return Err(SearchError::RateLimited);
            }
            Ok(LookupResult(serde_json::json!({"query": query})))
        }
    }

    /// Replies per company name, found on the prompt's `Name:` line.
    struct StubClassifier {
        replies: HashMap<String, Result<String, u16>>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubClassifier {
        fn new(replies: &[(&str, &str)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(n, r)| (n.to_string(), Ok(r.to_string())))
                    .collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(mut self, name: &str, code: u16) -> Self {
            self.replies.insert(name.to_string(), Err(code));
            self
        }
    }

    impl Classifier for StubClassifier {
        fn describe(&self) -> String {
            "stub model".into()
        }

        async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let name = prompt
                .lines()
                .find_map(|line| line.strip_prefix("Name: "))
                .unwrap_or_default();
            match self.replies.get(name) {
                Some(Ok(reply)) => Ok(reply.clone()),
                Some(Err(code)) => Err(ClassifyError::Api {
                    code: *code,
                    message: "server error".into(),
                }),
                None => Ok("I don't know.".into()),
            }
        }
    }

    fn index() -> IndustryIndex {
        IndustryIndex::from_records([
            IndustryRecord {
                id: "10".into(),
                name: "Banking".into(),
            },
            IndustryRecord {
                id: "20".into(),
                name: "Retail - apparel".into(),
            },
        ])
    }

    fn write_inputs(dir: &Path, clients: &str) -> RunPaths {
        let paths = RunPaths {
            clients: dir.join("clients.csv"),
            industries: dir.join("industries.csv"),
            output: dir.join("classified_clients.csv"),
        };
        fs::write(&paths.clients, clients).unwrap();
        fs::write(&paths.industries, "id,name\n10,Banking\n20,Retail - apparel\n").unwrap();
        paths
    }

    #[test]
    fn industry_id_empty_when_name_unknown() {
        let index = index();
        assert_eq!(index.industry_id("Banking"), "10");
        assert_eq!(index.industry_id("Space Mining"), "");
        assert_eq!(index.names(), ["Banking", "Retail - apparel"]);
    }

    #[test]
    fn industry_index_skips_rows_without_name() {
        let table = Table::from_rows(&["id", "name"], &[&["1", "Banking"], &["2", ""]]);
        let index = IndustryIndex::from_table(&table);
        assert_eq!(index.names(), ["Banking"]);
    }

    #[test]
    fn name_only_industries_table_fills_allowed_list() {
        let table = Table::from_rows(&["name"], &[&["Banking"], &["Retail"]]);
        let index = IndustryIndex::from_table(&table);
        assert_eq!(index.names(), ["Banking", "Retail"]);
        assert_eq!(index.industry_id("Banking"), "");
    }

    #[test]
    fn blank_id_row_stays_allowed_but_joins_empty() {
        let table = Table::from_rows(&["id", "name"], &[&["1", "Banking"], &["", "Insurance"]]);
        let index = IndustryIndex::from_table(&table);
        assert_eq!(index.names(), ["Banking", "Insurance"]);
        assert_eq!(index.industry_id("Banking"), "1");
        assert_eq!(index.industry_id("Insurance"), "");
    }

    #[tokio::test]
    async fn name_only_industries_reach_the_prompt() {
        let clients = Table::from_rows(&["id", "name"], &[&["1", "Acme"]]);
        let industries = Table::from_rows(&["name"], &[&["Banking"], &["Retail"]]);
        let classifier = StubClassifier::new(&[("Acme", r#"{"industry":"Retail","confidence":70}"#)]);

        let (rows, _) = classify_clients(
            &clients,
            &IndustryIndex::from_table(&industries),
            &MockSearch::default(),
            &classifier,
            1,
        )
        .await
        .unwrap();

        let prompts = classifier.prompts.lock().unwrap();
        assert!(prompts[0].contains("Allowed industries:\nBanking\nRetail\n"));
        assert_eq!(rows[0].industry, "Retail");
        assert_eq!(rows[0].industry_id, "");
    }

    #[tokio::test]
    async fn valid_rows_written_in_order_and_invalid_skipped() {
        let clients = Table::from_rows(
            &["id", "name"],
            &[&["1", "Acme"], &["", "Ghost"], &["2", "Threads"], &["3", ""]],
        );
        let search = MockSearch::default();
        let classifier = StubClassifier::new(&[
            ("Acme", r#"{"industry":"Banking","confidence":64}"#),
            ("Threads", r#"Sure! {"industry":"Retail - apparel","confidence":87} Done."#),
        ]);

        let (rows, summary) = classify_clients(&clients, &index(), &search, &classifier, 1)
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                written: 2,
                skipped: 2,
                degraded: 0
            }
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[0].industry_id, "10");
        assert_eq!(rows[1].name, "Threads");
        assert_eq!(rows[1].industry, "Retail - apparel");
        assert_eq!(rows[1].confidence, Confidence(87.0));
        assert_eq!(search.captured_queries(), ["Acme", "Threads"]);
    }

    #[tokio::test]
    async fn unknown_industry_keeps_name_with_empty_id() {
        let clients = Table::from_rows(&["id", "name"], &[&["1", "Acme"]]);
        let classifier =
            StubClassifier::new(&[("Acme", r#"{"industry":"Space Mining","confidence":12}"#)]);

        let (rows, _) = classify_clients(&clients, &index(), &MockSearch::default(), &classifier, 1)
            .await
            .unwrap();

        assert_eq!(rows[0].industry, "Space Mining");
        assert_eq!(rows[0].industry_id, "");
    }

    #[tokio::test]
    async fn classifier_failures_degrade_without_aborting() {
        let clients = Table::from_rows(
            &["id", "name"],
            &[&["1", "Acme"], &["2", "Mumble"], &["3", "Threads"]],
        );
        let classifier = StubClassifier::new(&[(
            "Threads",
            r#"{"industry":"Retail - apparel","confidence":87}"#,
        )])
        .failing_for("Acme", 500);

        let (rows, summary) =
            classify_clients(&clients, &index(), &MockSearch::default(), &classifier, 1)
                .await
                .unwrap();

        assert_eq!(summary.written, 3);
        assert_eq!(summary.degraded, 2);
        assert_eq!(rows[0].industry, "Unknown");
        assert_eq!(rows[0].confidence, Confidence(0.0));
        assert_eq!(rows[0].industry_id, "");
        assert_eq!(rows[1].industry, "Unknown");
        assert_eq!(rows[2].industry_id, "20");
    }

    #[tokio::test]
    async fn concurrent_lookups_keep_input_order() {
        let clients = Table::from_rows(
            &["id", "name"],
            &[&["1", "Slow"], &["2", "Medium"], &["3", "Fast"]],
        );
        let search = MockSearch::with_delays(&[("Slow", 60), ("Medium", 30), ("Fast", 0)]);
        let classifier = StubClassifier::new(&[]);

        let (rows, _) = classify_clients(&clients, &index(), &search, &classifier, 3)
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn search_failure_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), "id,name\n1,Acme\n2,Broken\n");
        let search = MockSearch::failing_on("Broken");
        let classifier = StubClassifier::new(&[]);

        let err = run(&paths, OutputLayout::WithIndustryId, &search, &classifier, 1)
            .await
            .unwrap_err();

        match err {
            RunError::Search { company, source } => {
                assert_eq!(company, "Broken");
                assert!(matches!(source, SearchError::RateLimited));
            }
            other => panic!("expected Search error, got: {other:?}"),
        }
        assert!(!paths.output.exists());
    }

    #[tokio::test]
    async fn missing_clients_file_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), "id,name\n1,Acme\n");
        fs::remove_file(&paths.clients).unwrap();
        fs::write(&paths.output, "previous run\n").unwrap();

        let err = run(
            &paths,
            OutputLayout::WithIndustryId,
            &MockSearch::default(),
            &StubClassifier::new(&[]),
            1,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RunError::Table(TableError::NotFound(_))));
        assert_eq!(fs::read_to_string(&paths.output).unwrap(), "previous run\n");
    }

    #[tokio::test]
    async fn rerun_with_same_inputs_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), "id,name\n1,Acme\n2,Threads\n3,Mystery\n");
        let classifier = StubClassifier::new(&[
            ("Acme", r#"{"industry":"Banking","confidence":64}"#),
            ("Threads", r#"{"industry":"Retail - apparel","confidence":87.5}"#),
        ]);

        run(&paths, OutputLayout::WithIndustryId, &MockSearch::default(), &classifier, 1)
            .await
            .unwrap();
        let first = fs::read(&paths.output).unwrap();

        run(&paths, OutputLayout::WithIndustryId, &MockSearch::default(), &classifier, 1)
            .await
            .unwrap();
        let second = fs::read(&paths.output).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "id,name,industry_id,industry,confidence\n\
             1,Acme,10,Banking,64\n\
             2,Threads,20,Retail - apparel,87.5\n\
             3,Mystery,,Unknown,0\n"
        );
    }
}
