use polars::prelude::ChunkAgg;
use referendum_map::charts::MapTable;
use referendum_map::config::{AppConfig, InputConfig, OutputConfig};
use referendum_map::data::columns::*;
use referendum_map::data::{DataLoader, DataProcessor};
use referendum_map::pipeline;
use referendum_map::stats::{RegionResult, ResultAggregator};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str =
    "Department code;Department name;Town code;Town name;Registered;Abstentions;Null;Choice A;Choice B";

const BOUNDARIES: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"code":"01","nom":"Guadeloupe"},
     "geometry":{"type":"Polygon","coordinates":[[[-61.8,16.0],[-61.0,16.0],[-61.0,16.5],[-61.8,16.0]]]}},
    {"type":"Feature","properties":{"code":"11","nom":"Test Region"},
     "geometry":{"type":"Polygon","coordinates":[[[2.0,48.0],[3.0,48.0],[3.0,49.0],[2.0,49.0],[2.0,48.0]]]}}
]}"#;

fn write_fixture(dir: &Path, referendum_rows: &[&str]) -> AppConfig {
    let mut referendum = String::from(HEADER);
    for row in referendum_rows {
        referendum.push('\n');
        referendum.push_str(row);
    }
    referendum.push('\n');

    fs::write(dir.join("referendum.csv"), referendum).unwrap();
    fs::write(dir.join("regions.csv"), "id,code,name,slug\n1,11,TestRegion,test-region\n").unwrap();
    fs::write(
        dir.join("departments.csv"),
        "id,region_code,code,name,slug\n1,11,1,One,one\n2,11,2,Two,two\n3,11,3,Three,three\n",
    )
    .unwrap();
    fs::write(dir.join("regions.geojson"), BOUNDARIES).unwrap();

    AppConfig {
        input: InputConfig {
            referendum: dir.join("referendum.csv"),
            regions: dir.join("regions.csv"),
            departments: dir.join("departments.csv"),
            boundaries: dir.join("regions.geojson"),
            boundary_code_property: "code".to_string(),
        },
        output: OutputConfig {
            map: dir.join("out").join("map.svg"),
            table: Some(dir.join("out").join("regions.csv")),
            title: None,
            legend: false,
            open: false,
            ..OutputConfig::default()
        },
    }
}

#[test]
fn single_region_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(
        dir.path(),
        &[
            "1;One;1;Town;100;0;0;60;40",
            "ZZ;Abroad;1;Consulate;999;9;9;900;90",
        ],
    );

    let table: MapTable = pipeline::run(&config).unwrap();

    assert_eq!(table.rows.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.result.region_code, "11");
    assert_eq!(row.result.region_name.as_deref(), Some("TestRegion"));
    assert_eq!(row.result.registered_count, 100);
    assert_eq!(row.ratio, 0.6);

    let svg = fs::read_to_string(&config.output.map).unwrap();
    assert!(svg.contains("<polygon"));

    let csv = fs::read_to_string(config.output.table.as_ref().unwrap()).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("region_code,region_name,registered_count"));
    assert!(header.ends_with(",ratio"));
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn unmatched_departments_never_reach_the_totals() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(
        dir.path(),
        &[
            "1;One;1;A;100;10;1;50;39",
            "2;Two;1;B;200;20;2;100;78",
            "ZA;Guadeloupe;1;C;5000;0;0;2500;2500",
            "ZZ;Abroad;1;D;7000;0;0;3500;3500",
        ],
    );

    let raw = DataLoader::load_all(&config.input).unwrap();
    let area = DataProcessor::merge_regions_and_departments(&raw.regions, &raw.departments).unwrap();
    assert_eq!(area.height(), raw.departments.height());

    let ballots = DataProcessor::merge_referendum_and_areas(&raw.referendum, &area).unwrap();
    assert_eq!(ballots.height(), 2);

    let by_region = ResultAggregator::by_region(&ballots).unwrap();
    let ballot_total = ballots.column(REGISTERED).unwrap().i64().unwrap().sum();
    let region_total = by_region.column(REGISTERED).unwrap().i64().unwrap().sum();
    assert_eq!(ballot_total, Some(300));
    assert_eq!(region_total, ballot_total);

    let results = RegionResult::from_frame(&by_region).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].choice_a_votes, 150);
    assert_eq!(results[0].choice_b_votes, 117);
}

#[test]
fn region_without_expressed_votes_is_nan_not_fatal() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), &["3;Three;1;Empty;40;40;0;0;0"]);

    let table = pipeline::run(&config).unwrap();

    assert!(table.ratio_of("11").unwrap().is_nan());
}

#[test]
fn missing_input_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), &["1;One;1;Town;100;0;0;60;40"]);
    fs::remove_file(&config.input.departments).unwrap();

    let err = pipeline::run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("departments.csv"));
    assert!(!config.output.map.exists());
}

#[test]
fn short_referendum_rows_abort_the_run() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path(), &["1;One;1;Town;100;0;0;60;40"]);
    fs::write(
        &config.input.referendum,
        "Department code;Department name;Town code;Town name;Registered;Abstentions;Null;Choice A\n\
         1;One;1;Town;100;0;0;60\n",
    )
    .unwrap();

    let err = pipeline::run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("expected 9"));
}
