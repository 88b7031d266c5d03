use std::collections::BTreeMap;

use rusqlite::Connection;

use super::*;

pub(crate) const SAMPLE_CSV: &str = "\
ID;Reason for absence;Month of absence;Day of the week;Seasons;Transportation expense;Distance from Residence to Work;Service time;Age;Work load Average/day ;Hit target;Disciplinary failure;Education;Son;Social drinker;Social smoker;Pet;Weight;Height;Body mass index;Absenteeism time in hours
11;26;7;3;1;289;36;13;33;239.554;97;0;1;2;1;0;1;90;172;30;4
36;0;7;3;1;118;13;18;50;239.554;97;1;1;1;1;0;0;98;178;31;0
3;23;7;4;1;179;51;18;38;239.554;97;0;1;0;1;0;0;89;170;31;2
7;7;1;5;2;279;5;14;39;205.917;92;0;1;2;1;1;0;68;168;24;24
11;23;3;5;2;289;36;13;33;222.196;99;0;1;2;1;0;1;90;172;30;8
3;23;3;6;2;179;51;18;38;222.196;99;0;1;0;1;0;0;89;170;31;5
10;22;12;6;4;361;52;3;28;261.306;97;0;3;1;0;0;4;80;172;27;10
20;23;12;6;4;260;50;11;36;261.306;97;0;1;4;1;0;0;65;168;23;3
14;19;1;2;2;155;12;14;34;205.917;92;0;2;2;0;1;0;95;196;25;40
1;22;0;2;1;235;11;14;37;239.554;97;0;3;1;0;0;1;88;172;29;16
20;1;0;2;1;260;50;11;45;239.554;97;0;1;4;1;0;0;65;168;23;32
5;28;3;3;2;235;20;13;43;222.196;99;0;2;1;0;1;2;106;167;38;9
";

pub(crate) fn sample_dataset() -> Dataset {
    Dataset::new(parse_csv(SAMPLE_CSV).expect("sample csv should parse"))
}

#[test]
fn parse_csv_maps_padded_headers_to_canonical_columns() {
    let records = parse_csv(SAMPLE_CSV).expect("sample csv should parse");
    assert_eq!(records.len(), 12);

    let first = &records[0];
    assert_eq!(first.row_id, 1);
    assert_eq!(first.employee_id, 11);
    assert_eq!(first.reason_code, 26);
    assert_eq!(first.value(Column::Workload), 239.554);
    assert_eq!(first.value(Column::AbsenceHours), 4.0);
    assert_eq!(records[11].row_id, 12);
}

#[test]
fn parse_csv_rejects_fractional_integer_codes() {
    let broken = SAMPLE_CSV.replacen("11;26;7;3;1;", "11;26.5;7;3;1;", 1);
    let err = parse_csv(&broken).expect_err("fractional reason code must fail");
    assert!(format!("{err:#}").contains("line 2"));
}

#[test]
fn parse_csv_reports_missing_columns() {
    let header_only = "ID;Age\n1;30\n";
    let err = parse_csv(header_only).expect_err("header without all columns must fail");
    assert!(format!("{err:#}").contains("missing columns"));
}

#[test]
fn parse_csv_rejects_ragged_rows() {
    let ragged = format!("{SAMPLE_CSV}1;2;3\n");
    let err = parse_csv(&ragged).expect_err("short row must fail");
    assert!(format!("{err:#}").contains("expected 21 cells"));
}

#[test]
fn unique_count_counts_distinct_employees() {
    let dataset = sample_dataset();
    assert_eq!(dataset.unique_count(Column::EmployeeId), 9);
    assert_eq!(dataset.values(Column::AbsenceHours).iter().sum::<f64>(), 153.0);
}

#[test]
fn column_lookup_round_trips_labels_and_names() {
    for column in Column::ALL {
        assert_eq!(Column::from_label(column.label()), Some(column));
        assert_eq!(
            serde_json::to_value(column).expect("json"),
            serde_json::Value::from(column.as_str())
        );
    }
    assert_eq!(Column::from_label("Work load Average/day "), Some(Column::Workload));
    assert_eq!(reason_description(23), "Medical consultation");
    assert_eq!(reason_description(99), "Unknown");
    assert_eq!(month_name(0), "Unknown");
    assert_eq!(month_name(12), "December");
}

#[test]
fn store_round_trips_records_and_metadata() {
    let records = parse_csv(SAMPLE_CSV).expect("sample csv should parse");
    let mut connection = Connection::open_in_memory().expect("in-memory db");
    store::ensure_schema(&connection).expect("schema");

    let mut metadata = BTreeMap::new();
    metadata.insert("schema_version".to_string(), store::DB_SCHEMA_VERSION.to_string());
    let inserted = store::replace_records(&mut connection, &records, &metadata).expect("insert");
    assert_eq!(inserted, 12);

    let loaded = store::load_records(&connection).expect("load");
    assert_eq!(loaded, records);
    assert_eq!(
        store::load_metadata(&connection)
            .expect("metadata")
            .get("schema_version")
            .map(String::as_str),
        Some(store::DB_SCHEMA_VERSION)
    );

    let reinserted =
        store::replace_records(&mut connection, &records[..3], &metadata).expect("replace");
    assert_eq!(reinserted, 3);
    assert_eq!(
        store::query_count(&connection, "SELECT COUNT(*) FROM absences").expect("count"),
        3
    );
}

#[tokio::test]
async fn loader_reads_csv_once_and_shares_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absences.csv");
    std::fs::write(&path, SAMPLE_CSV).expect("write csv");

    let loader = DatasetLoader::new(DatasetSource::Csv(path.clone()));
    let first = loader.get().await.expect("first load");
    std::fs::remove_file(&path).expect("remove csv");
    let second = loader.get().await.expect("cached load");

    assert_eq!(first.len(), 12);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn loader_does_not_cache_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("later.csv");

    let loader = DatasetLoader::new(DatasetSource::Csv(path.clone()));
    assert!(loader.get().await.is_err());

    std::fs::write(&path, SAMPLE_CSV).expect("write csv");
    assert_eq!(loader.get().await.expect("retry succeeds").len(), 12);
}
