//! PostgreSQL Repository Tests
//!
//! Runs against `FB_TEST_DATABASE_URL` when set, otherwise against a
//! PostgreSQL container started with testcontainers. Docker must be running
//! in the second case, so the tests are ignored by default:
//!
//! ```text
//! cargo test -p fb-platform --test postgres_repository_tests -- --ignored
//! ```
//!
//! Every test tags its rows with a fresh marker, so a shared database can be
//! reused between runs.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

use fb_platform::domain::{Event, EventFilter, NewVenue, SportType, Venue};
use fb_platform::repository::{EventRepository, PostgresEventRepository};
use fb_platform::PlatformError;

struct TestDb {
    // Keeps the container alive for the duration of the test
    _container: Option<ContainerAsync<Postgres>>,
    pool: PgPool,
    repo: PostgresEventRepository,
}

async fn connect(database_url: &str) -> PgPool {
    let mut attempts = 0;
    loop {
        match PgPool::connect(database_url).await {
            Ok(pool) => return pool,
            Err(e) => {
                assert!(attempts < 30, "could not connect to {}: {}", database_url, e);
                attempts += 1;
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
        }
    }
}

async fn test_db() -> TestDb {
    let (container, database_url) = match std::env::var("FB_TEST_DATABASE_URL") {
        Ok(url) => (None, url),
        Err(_) => {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");
            let host = container.get_host().await.expect("container host");
            let port = container.get_host_port_ipv4(5432).await.expect("container port");
            let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
            (Some(container), url)
        }
    };

    let pool = connect(&database_url).await;
    let repo = PostgresEventRepository::new(pool.clone());
    repo.init_schema().await.expect("schema");

    TestDb {
        _container: container,
        pool,
        repo,
    }
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, 18, 0, 0).unwrap()
}

fn event(user: Uuid, name: &str, sport: SportType, day: u32) -> Event {
    Event::new(user, name, sport, at(day))
}

async fn venue_rows(pool: &PgPool, event_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM venues WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_insert_and_find_with_venues() {
    let db = test_db().await;
    let owner = Uuid::new_v4();
    let created = event(owner, &format!("{} Pickup", tag()), SportType::Basketball, 1)
        .with_description(Some("Bring water".to_string()));
    db.repo.insert_event(&created).await.unwrap();

    let venues = vec![
        Venue::new(created.id, NewVenue::new("Court A").with_capacity(10)),
        Venue::new(created.id, NewVenue::new("Court B").with_address("12 Main St")),
    ];
    db.repo.insert_venues(&venues).await.unwrap();

    let found = db.repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.event.id, created.id);
    assert_eq!(found.event.user_id, owner);
    assert_eq!(found.event.name, created.name);
    assert_eq!(found.event.sport_type, SportType::Basketball);
    assert_eq!(found.event.date_time, at(1));
    assert_eq!(found.event.description.as_deref(), Some("Bring water"));
    assert!(found.event.poster_url.is_none());

    let mut names: Vec<_> = found.venues.iter().map(|v| v.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Court A", "Court B"]);
    let court_a = found.venues.iter().find(|v| v.name == "Court A").unwrap();
    assert_eq!(court_a.capacity, Some(10));

    assert!(db.repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_duplicate_event_id_rejected() {
    let db = test_db().await;
    let created = event(Uuid::new_v4(), &format!("{} Match", tag()), SportType::Soccer, 2);
    db.repo.insert_event(&created).await.unwrap();

    let err = db.repo.insert_event(&created).await.unwrap_err();
    assert!(matches!(err, PlatformError::Duplicate { .. }));
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_venue_batch_is_atomic() {
    let db = test_db().await;
    let created = event(Uuid::new_v4(), &format!("{} Match", tag()), SportType::Soccer, 2);
    db.repo.insert_event(&created).await.unwrap();

    let batch = vec![
        Venue::new(created.id, NewVenue::new("Field 1")),
        Venue::new(created.id, NewVenue::new("Field 2").with_capacity(-5)),
    ];
    assert!(db.repo.insert_venues(&batch).await.is_err());
    assert_eq!(venue_rows(&db.pool, created.id).await, 0);
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_venue_requires_parent_event() {
    let db = test_db().await;
    let orphan = Venue::new(Uuid::new_v4(), NewVenue::new("Court A"));
    assert!(db.repo.insert_venues(&[orphan]).await.is_err());
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_delete_is_owner_scoped_and_cascades() {
    let db = test_db().await;
    let owner = Uuid::new_v4();
    let created = event(owner, &format!("{} Match", tag()), SportType::Soccer, 3);
    db.repo.insert_event(&created).await.unwrap();
    db.repo
        .insert_venues(&[Venue::new(created.id, NewVenue::new("Field 1"))])
        .await
        .unwrap();

    assert!(!db.repo.delete_event(created.id, Uuid::new_v4()).await.unwrap());
    assert!(db.repo.find_owned(created.id, owner).await.unwrap().is_some());
    assert_eq!(venue_rows(&db.pool, created.id).await, 1);

    assert!(db.repo.delete_event(created.id, owner).await.unwrap());
    assert!(db.repo.find_by_id(created.id).await.unwrap().is_none());
    assert_eq!(venue_rows(&db.pool, created.id).await, 0);
    assert!(!db.repo.delete_event(created.id, owner).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_update_poster_is_owner_scoped() {
    let db = test_db().await;
    let owner = Uuid::new_v4();
    let created = event(owner, &format!("{} Match", tag()), SportType::Soccer, 3);
    db.repo.insert_event(&created).await.unwrap();
    let url = format!("http://x/{}/{}.png", owner, created.id);

    assert!(!db.repo.update_poster_url(created.id, Uuid::new_v4(), Some(&url)).await.unwrap());
    assert!(db.repo.find_owned(created.id, Uuid::new_v4()).await.unwrap().is_none());
    assert!(!db.repo.poster_url_in_use(&url).await.unwrap());

    assert!(db.repo.update_poster_url(created.id, owner, Some(&url)).await.unwrap());
    let stored = db.repo.find_owned(created.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.poster_url.as_deref(), Some(url.as_str()));
    assert!(db.repo.poster_url_in_use(&url).await.unwrap());

    assert!(db.repo.update_poster_url(created.id, owner, None).await.unwrap());
    assert!(!db.repo.poster_url_in_use(&url).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_list_sorted_and_filtered() {
    let db = test_db().await;
    let marker = tag();
    let user = Uuid::new_v4();
    let late = event(user, &format!("{} Evening Run", marker), SportType::Basketball, 20);
    let early = event(user, &format!("{} Morning run", marker), SportType::Basketball, 10);
    let tennis = event(user, &format!("{} Doubles", marker), SportType::Tennis, 15);
    for e in [&late, &early, &tennis] {
        db.repo.insert_event(e).await.unwrap();
    }
    db.repo
        .insert_venues(&[
            Venue::new(early.id, NewVenue::new("Gym")),
            Venue::new(tennis.id, NewVenue::new("Court 1")),
            Venue::new(tennis.id, NewVenue::new("Court 2")),
        ])
        .await
        .unwrap();

    let all = db
        .repo
        .list(&EventFilter {
            name_contains: Some(marker.clone()),
            sport_type: None,
        })
        .await
        .unwrap();
    let ids: Vec<_> = all.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![early.id, tennis.id, late.id]);
    let venue_counts: Vec<_> = all.iter().map(|e| e.venues.len()).collect();
    assert_eq!(venue_counts, vec![1, 2, 0]);

    let runs = db
        .repo
        .list(&EventFilter {
            name_contains: Some(format!("{} ", marker.to_uppercase())),
            sport_type: Some(SportType::Basketball),
        })
        .await
        .unwrap();
    let ids: Vec<_> = runs.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);

    let tennis_only = db
        .repo
        .list(&EventFilter {
            name_contains: Some(marker.clone()),
            sport_type: Some(SportType::Tennis),
        })
        .await
        .unwrap();
    assert_eq!(tennis_only.len(), 1);
    assert_eq!(tennis_only[0].event.id, tennis.id);
}

#[tokio::test]
#[ignore = "requires Docker or FB_TEST_DATABASE_URL"]
async fn test_search_wildcards_match_literally() {
    let db = test_db().await;
    let marker = tag();
    let user = Uuid::new_v4();
    let sale = event(user, &format!("{} 50% Off Run", marker), SportType::Other, 4);
    let club = event(user, &format!("{} 500 Club", marker), SportType::Other, 5);
    let snake = event(user, &format!("{} a_b Cup", marker), SportType::Other, 6);
    let plain = event(user, &format!("{} axb Cup", marker), SportType::Other, 7);
    for e in [&sale, &club, &snake, &plain] {
        db.repo.insert_event(e).await.unwrap();
    }

    let percent = db
        .repo
        .list(&EventFilter {
            name_contains: Some(format!("{} 50%", marker)),
            sport_type: None,
        })
        .await
        .unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].event.id, sale.id);

    let underscore = db
        .repo
        .list(&EventFilter {
            name_contains: Some(format!("{} a_b", marker)),
            sport_type: None,
        })
        .await
        .unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].event.id, snake.id);
}
