use super::classifier::ClassificationPolicy;
use super::corpus::FixtureCorpus;
use super::store::{ExpectationStore, StoreError, StoreSnapshot};
use crate::domain::{Category, Fixture, Statistics};

/// Category of each fixture against one snapshot, in fixture order.
pub fn classify_fixtures(
    fixtures: &[Fixture],
    snapshot: &StoreSnapshot,
    policy: &ClassificationPolicy,
) -> Vec<Category> {
    fixtures
        .iter()
        .map(|fixture| policy.classify(snapshot.text_for(&fixture.file_name)))
        .collect()
}

pub fn aggregate(categories: &[Category]) -> Statistics {
    let mut statistics = Statistics::default();
    for category in categories {
        statistics.record(*category);
    }
    statistics
}

/// Counts per category for the corpus as the store currently stands.
pub fn collect_statistics(
    corpus: &FixtureCorpus,
    store: &ExpectationStore,
    policy: &ClassificationPolicy,
) -> Result<Statistics, StoreError> {
    let snapshot = store.snapshot(corpus)?;
    Ok(aggregate(&classify_fixtures(
        corpus.fixtures(),
        &snapshot,
        policy,
    )))
}

#[cfg(test)]
mod tests {
    use super::{aggregate, classify_fixtures, collect_statistics};
    use crate::domain::{Category, ExpectationRecord, Fixture, Statistics};
    use crate::modules::classifier::ClassificationPolicy;
    use crate::modules::corpus::FixtureCorpus;
    use crate::modules::store::{ExpectationStore, StoreSnapshot};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn counts_sum_to_corpus_size() {
        let fixtures: Vec<Fixture> = ["a.png", "b.png", "c.png", "d.png", "e.png"]
            .iter()
            .map(|name| Fixture::from_path(format!("/corpus/{name}")).expect("fixture"))
            .collect();
        let mut snapshot = StoreSnapshot::default();
        snapshot.insert(ExpectationRecord::loaded("a.png", "No errors detected."));
        snapshot.insert(ExpectationRecord::loaded("b.png", "ERROR: CRC error in chunk."));
        snapshot.insert(ExpectationRecord::loaded(
            "c.png",
            "additional data after IEND chunk",
        ));
        snapshot.insert(ExpectationRecord::loaded("d.png", "OK"));

        let categories =
            classify_fixtures(&fixtures, &snapshot, &ClassificationPolicy::default());
        assert_eq!(
            categories,
            [
                Category::Valid,
                Category::Invalid,
                Category::Warning,
                Category::Valid,
                Category::Unknown
            ]
        );

        let statistics = aggregate(&categories);
        assert_eq!(
            statistics,
            Statistics {
                valid: 2,
                invalid: 1,
                warning: 1,
                unknown: 1,
                total: 5,
            }
        );
        assert_eq!(
            statistics.valid + statistics.invalid + statistics.warning + statistics.unknown,
            statistics.total
        );
    }

    #[test]
    fn statistics_read_the_store_on_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let fixtures = temp.path().join("fixtures");
        fs::create_dir_all(&fixtures).expect("fixture dir");
        fs::write(fixtures.join("good.png"), b"x").expect("fixture");
        fs::write(fixtures.join("new.png"), b"x").expect("fixture");
        let corpus = FixtureCorpus::scan(&fixtures, "*.png").expect("scan");

        let store = ExpectationStore::new(temp.path().join("store"), "out");
        store
            .write(&corpus.fixtures()[0], "No errors detected.")
            .expect("write");

        let statistics =
            collect_statistics(&corpus, &store, &ClassificationPolicy::default()).expect("stats");
        assert_eq!(statistics.valid, 1);
        assert_eq!(statistics.unknown, 1);
        assert_eq!(statistics.total, 2);
    }
}
