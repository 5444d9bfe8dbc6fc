//! Engine exports read back from disk

use headmap_core::{
    CategoryMaps, ConditionNames, ConditionsProcessor, CsvTableSource, EngineError, HeadCell,
    HeadType, SiteMap, StaticMapsInitializer, StringTable, SurfacePowerProcessor, TableSource,
};
use std::fs;
use std::path::Path;

const NUMBERS: &str = "\"\",\"V1\",\"V2\"
\"Symptoms\",\"Anxiety\",\"Fatigue\"
\"F3\",\"2.5\",\"4\"
\"Cz\",\"NA\",\"-1\"
\"Symptom category\",\"mood\",\"energy\"
";

const BANDS: &str = "\"\",\"V1\",\"V2\"
\"Symptoms\",\"Anxiety\",\"Fatigue\"
\"F3\",\"T1\",\"\"
\"Cz\",\"NA\",\"A\"
\"Symptom category\",\"mood\",\"energy\"
";

fn write(dir: &Path, function: &str, content: &str) {
    fs::write(dir.join(format!("{function}.csv")), content).unwrap();
}

#[test]
fn test_export_reads_as_data_frame() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "swih.data.numbers", NUMBERS);
    let mut source = CsvTableSource::new(dir.path());

    let raw = source.fetch("swih.data.numbers").unwrap();
    let table = StringTable::from_source(&raw).unwrap();

    assert_eq!(table.column_names(), ["V1", "V2"]);
    assert_eq!(table.row_names(), ["Symptoms", "F3", "Cz", "Symptom category"]);
    assert_eq!(table.value(1, 2).unwrap().as_deref(), Some("-1"));
    assert_eq!(table.value(0, 2).unwrap().as_deref(), Some("NA"));
}

#[test]
fn test_empty_cell_is_missing_value() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "swih.data.bands", BANDS);
    let mut source = CsvTableSource::new(dir.path());

    let table = StringTable::from_source(&source.fetch("swih.data.bands").unwrap()).unwrap();

    assert_eq!(table.value(1, 1).unwrap(), &None);
}

#[test]
fn test_missing_export_is_execution_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = CsvTableSource::new(dir.path());

    match source.fetch("fwih.data.numbers") {
        Err(EngineError::Execution { function, message }) => {
            assert_eq!(function, "fwih.data.numbers");
            assert!(message.contains("fwih.data.numbers.csv"), "{message}");
        }
        other => panic!("expected Execution error, got {other:?}"),
    }
}

#[test]
fn test_missing_directory_is_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = CsvTableSource::new(dir.path().join("nowhere"));

    assert!(matches!(
        source.fetch("swih.data.numbers"),
        Err(EngineError::Startup(_))
    ));
}

#[test]
fn test_slow_waves_from_exports() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "swih.data.numbers", NUMBERS);
    write(dir.path(), "swih.data.bands", BANDS);

    let mut maps = CategoryMaps::default();
    StaticMapsInitializer::new(ConditionNames {
        symptoms: vec!["anxiety".into(), "fatigue".into()],
        ..ConditionNames::default()
    })
    .load_data(&mut maps)
    .unwrap();

    let mut processor =
        SurfacePowerProcessor::new(HeadType::SlowWaves, CsvTableSource::new(dir.path()));
    processor.load_data(&mut maps).unwrap();

    let user = &maps.symptoms["user symptom"];
    assert_eq!(user.cell("F3").and_then(HeadCell::number), Some(4.0));
    assert_eq!(user.cell("F3").and_then(HeadCell::dominant_band), Some(""));
    assert_eq!(user.cell("Cz").and_then(HeadCell::number), Some(-1.0));
    assert_eq!(
        maps.symptoms["anxiety"].cell("F3").and_then(HeadCell::dominant_band),
        Some("T1")
    );
}
