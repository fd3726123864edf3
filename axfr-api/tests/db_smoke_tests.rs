//! Smoke tests against real dataset databases.
//!
//! Needs `AXFR_DB_HOST` and at least one `AXFR_<DATASET>_*` credential set.

#![cfg(feature = "db-tests")]

use axfr_api::{ApiResult, DatasetRegistry, DbClient, DbConfig};
use axfr_core::{DomainPattern, Page};
use axfr_storage::SnapshotStore;

fn test_db() -> ApiResult<DbClient> {
    DbClient::from_config(&DbConfig::from_env(), &DatasetRegistry::from_env())
}

#[tokio::test]
async fn smoke_test_every_dataset_answers() -> Result<(), Box<dyn std::error::Error>> {
    let db = test_db()?;
    assert!(!db.datasets().is_empty(), "no dataset credentials in the environment");

    for dataset in db.datasets() {
        db.ping(dataset).await?;

        let stats = db.date_amounts(dataset).await?;
        assert!(stats.windows(2).all(|w| w[0].date < w[1].date), "{dataset}");
    }
    Ok(())
}

#[tokio::test]
async fn smoke_test_diff_listing_and_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let db = test_db()?;

    for dataset in db.datasets().into_iter().filter(|d| d.is_diff()) {
        let dates = db.list_dates(dataset, Page::new(0)).await?;
        assert!(dates.len() <= 20);
        assert!(dates.windows(2).all(|w| w[0].date > w[1].date), "{dataset}");

        let Some(newest) = dates.first() else { continue };
        let date = newest.date.to_string().parse()?;
        let domains = db.list_domains(dataset, date, Page::new(0)).await?;
        assert!(domains.len() <= 20);

        if let Some(record) = domains.first() {
            let earliest = db
                .first_appearance(dataset, &DomainPattern::parse(&record.domain))
                .await?;
            assert!(earliest.is_some_and(|d| d <= date));
        }
    }
    Ok(())
}

#[tokio::test]
async fn smoke_test_search_shortest_first() -> Result<(), Box<dyn std::error::Error>> {
    let db = test_db()?;

    for dataset in db.datasets() {
        let found = db.search(dataset, "exa").await?;
        assert!(found.iter().all(|r| r.domain.contains("exa")));
        assert!(found
            .windows(2)
            .all(|w| w[0].domain.chars().count() <= w[1].domain.chars().count()));
    }
    Ok(())
}
