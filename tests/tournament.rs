//! End-to-end tests over a CSV data directory
//!
//! The fixture holds seven players in two series, each series with one
//! 4-seat and one 3-seat table.

use chrono::{NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use skat_tournament::store::{
    PlayerRepository, ResultRepository, SeriesRepository, TableRepository,
};
use skat_tournament::{
    rank_rows, CsvStore, GameResult, NewPlayer, NewSeries, ResultKey, ResultUpdate, SkatError,
    SortKey, Table, TableKey, Tournament,
};
use tempfile::TempDir;

const RESULTS: [(u32, u32, i64, u32, u32); 14] = [
    (1, 6, 50, 7, 3),
    (1, 3, 450, 5, 1),
    (1, 4, 250, 2, 2),
    (1, 1, 100, 3, 2),
    (1, 5, 700, 3, 1),
    (2, 1, 500, 1, 2),
    (1, 2, 200, 3, 4),
    (1, 7, 350, 2, 1),
    (2, 7, 200, 4, 2),
    (2, 2, 300, 4, 5),
    (2, 3, 730, 9, 4),
    (2, 5, 440, 5, 1),
    (2, 6, 240, 2, 0),
    (2, 4, 100, 2, 0),
];

fn fixture() -> (TempDir, Tournament<CsvStore>) {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CsvStore::open(dir.path()).unwrap();

    for i in 1..=7 {
        store
            .add_player(NewPlayer::new(format!("P{}", i)).with_remarks("rem"))
            .unwrap();
    }

    let first = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap();
    let second = NaiveDate::from_ymd_opt(2024, 2, 11).unwrap();
    store
        .add_series(NewSeries::new("Nr1", first.and_time(NaiveTime::MIN)))
        .unwrap();
    store
        .add_series(NewSeries::new("Nr2", second.and_time(NaiveTime::MIN)))
        .unwrap();

    for (series_id, player_id, points, won, lost) in RESULTS {
        store
            .add_result(GameResult::new(series_id, player_id, points, won, lost))
            .unwrap();
    }

    store.add_table(Table::new(1, 1, vec![2, 4, 6, 7]).unwrap()).unwrap();
    store.add_table(Table::new(1, 2, vec![1, 3, 5]).unwrap()).unwrap();
    store.add_table(Table::new(2, 1, vec![1, 3, 4, 7]).unwrap()).unwrap();
    store.add_table(Table::new(2, 2, vec![2, 5, 6]).unwrap()).unwrap();

    (dir, Tournament::new(store))
}

#[test]
fn test_data_survives_reopen() {
    let (dir, _tournament) = fixture();
    let store = CsvStore::open(dir.path()).unwrap();

    assert_eq!(store.all_players().unwrap().len(), 7);
    assert_eq!(store.get_player(5).unwrap().name, "P5");
    assert_eq!(store.get_player(5).unwrap().remarks, "rem");
    assert_eq!(store.all_series().unwrap().len(), 2);
    assert_eq!(store.all_results().unwrap().len(), 14);
    assert_eq!(store.tables_for_series(2).unwrap().len(), 2);

    let result = store.get_result(ResultKey::new(1, 6)).unwrap();
    assert_eq!((result.points, result.won, result.lost), (50, 7, 3));
}

#[test]
fn test_result_add_update_remove() {
    let (_dir, mut tournament) = fixture();
    let store = tournament.store_mut();

    let err = store.add_result(GameResult::new(1, 6, 100, 1, 1)).unwrap_err();
    assert!(matches!(err, SkatError::InvalidInput(_)));

    let update = ResultUpdate {
        points: Some(150),
        ..Default::default()
    };
    store.update_result(ResultKey::new(1, 6), update).unwrap();
    let update = ResultUpdate {
        won: Some(1),
        ..Default::default()
    };
    let result = store.update_result(ResultKey::new(1, 6), update).unwrap();
    assert_eq!((result.points, result.won, result.lost), (150, 1, 3));

    assert!(store.remove_result(ResultKey::new(1, 15)).unwrap_err().is_not_found());
    store.remove_result(ResultKey::new(1, 6)).unwrap();
    assert!(store.get_result(ResultKey::new(1, 6)).unwrap_err().is_not_found());
}

#[test]
fn test_opponents_lost() {
    let (_dir, tournament) = fixture();
    assert_eq!(tournament.opponents_lost(1, 2).unwrap(), 6);
    assert_eq!(tournament.opponents_lost(1, 1).unwrap(), 2);
    assert_eq!(tournament.opponents_lost(2, 1).unwrap(), 6);
}

#[test]
fn test_evaluate_results() {
    let (_dir, tournament) = fixture();
    let rows = tournament.evaluate_results().unwrap();

    assert_eq!(rows.len(), 14);
    for row in &rows {
        assert!(row.won_points >= 0 && row.won_points % 50 == 0);
        assert!(row.lost_points <= 0 && row.lost_points % 50 == 0);
        assert_eq!(
            row.score,
            row.points + row.won_points + row.lost_points + row.opponents_lost_points
        );
    }

    let keys: Vec<ResultKey> = rows.iter().map(|r| r.key()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    // 4-seat table: 200 + 3*50 - 4*50 + 6*30
    let row = rows.iter().find(|r| r.key() == ResultKey::new(1, 2)).unwrap();
    assert_eq!(row.table_size, 4);
    assert_eq!(row.score, 330);

    // 3-seat table: 100 + 3*50 - 2*50 + 2*40
    let row = rows.iter().find(|r| r.key() == ResultKey::new(1, 1)).unwrap();
    assert_eq!(row.table_size, 3);
    assert_eq!(row.opponents_lost_points, 80);
    assert_eq!(row.score, 230);
}

#[test]
fn test_evaluate_total() {
    let (_dir, tournament) = fixture();
    let totals = tournament.evaluate_total().unwrap();

    assert_eq!(totals.rows.len(), 7);
    assert_eq!(totals.series_ids, vec![1, 2]);
    for row in &totals.rows {
        assert!(row.total.won_points >= 0 && row.total.won_points % 50 == 0);
        assert!(row.total.lost_points <= 0 && row.total.lost_points % 50 == 0);
    }

    // 230 in series 1, 500 + 50 - 100 + 6*30 = 630 in series 2
    let player1 = totals.get(1).unwrap();
    assert_eq!(player1.per_series.len(), 2);
    assert_eq!(player1.total.score, 860);
}

#[test]
fn test_evaluate_series_ranking() {
    let (_dir, tournament) = fixture();
    let rows = tournament.evaluate_series(1).unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r.series_id == 1));

    let standings = rank_rows(&rows, SortKey::Score, false);
    assert_eq!(standings[0].position, 1);
    assert!(standings.windows(2).all(|w| w[0].row.score >= w[1].row.score));
}

#[test]
fn test_evaluation_needs_seating() {
    let (_dir, mut tournament) = fixture();
    tournament
        .store_mut()
        .remove_table(TableKey::new(1, 2))
        .unwrap();

    let err = tournament.evaluate_results().unwrap_err();
    assert!(matches!(err, SkatError::DataInconsistency(_)));
}

#[test]
fn test_shuffle_roster() {
    let (dir, mut tournament) = fixture();
    let mut rng = StdRng::seed_from_u64(42);

    let err = tournament.shuffle_series_roster(1, &mut rng).unwrap_err();
    assert!(matches!(err, SkatError::InvalidInput(_)));

    tournament.add_all_players_to_series(1).unwrap();
    let tables = tournament.shuffle_series_roster(1, &mut rng).unwrap();
    assert_eq!(tables.len(), 2);

    let store = CsvStore::open(dir.path()).unwrap();
    assert_eq!(store.get_table(TableKey::new(1, 1)).unwrap().size(), 4);
    assert_eq!(store.get_table(TableKey::new(1, 2)).unwrap().size(), 3);
    assert_eq!(store.tables_for_series(1).unwrap(), tables);
    assert_eq!(store.tables_for_series(2).unwrap().len(), 2);
}

#[test]
fn test_remove_series_cascades_on_disk() {
    let (dir, mut tournament) = fixture();
    tournament.remove_series(1).unwrap();

    let store = CsvStore::open(dir.path()).unwrap();
    assert!(store.get_series(1).unwrap_err().is_not_found());
    assert!(store.tables_for_series(1).unwrap().is_empty());
    assert!(store.results_for_series(1).unwrap().is_empty());
    assert_eq!(store.results_for_series(2).unwrap().len(), 7);
}

#[test]
fn test_remove_player_cascade_keeps_evaluation_working() {
    let (dir, mut tournament) = fixture();

    // Player 3 sits at the 3-seat table of series 1
    let err = tournament.remove_player_cascade(3).unwrap_err();
    assert!(matches!(err, SkatError::InvalidInput(_)));
    assert_eq!(tournament.store().all_results().unwrap().len(), 14);

    // Player 7 only sits at 4-seat tables
    tournament.remove_player_cascade(7).unwrap();
    let store = CsvStore::open(dir.path()).unwrap();
    assert!(store.get_player(7).unwrap_err().is_not_found());
    assert_eq!(store.all_results().unwrap().len(), 12);
    assert_eq!(
        store.get_table(TableKey::new(1, 1)).unwrap().player_ids(),
        &[2, 4, 6]
    );
    assert_eq!(
        store.get_table(TableKey::new(2, 1)).unwrap().player_ids(),
        &[1, 3, 4]
    );

    let rows = tournament.evaluate_results().unwrap();
    assert_eq!(rows.len(), 12);

    // Now at a 3-seat table: 200 + 3*50 - 4*50 + (2 + 3)*40
    let row = rows.iter().find(|r| r.key() == ResultKey::new(1, 2)).unwrap();
    assert_eq!(row.table_size, 3);
    assert_eq!(row.score, 350);
}

#[test]
fn test_failed_series_removal_can_be_retried() {
    let (dir, mut tournament) = fixture();

    // A directory in place of results.csv makes saving results fail
    let results_path = dir.path().join("results.csv");
    std::fs::remove_file(&results_path).unwrap();
    std::fs::create_dir(&results_path).unwrap();

    assert!(tournament.remove_series(1).is_err());
    assert!(tournament.store().get_series(1).is_ok());
    let series_file = std::fs::read_to_string(dir.path().join("series.csv")).unwrap();
    assert!(series_file.contains("Nr1"));

    std::fs::remove_dir(&results_path).unwrap();
    tournament.remove_series(1).unwrap();
    assert!(tournament.store().get_series(1).unwrap_err().is_not_found());
    assert!(tournament.store().results_for_series(1).unwrap().is_empty());
}
