use attain_core::attainment::aggregate;
use attain_core::model::ScriptMarkRow;
use attain_core::rubric::Rubric;

const RUBRIC_XLSX: &[u8] = include_bytes!("fixtures/rubric.xlsx");

fn rubric() -> Rubric {
    Rubric::load("rubric.xlsx", RUBRIC_XLSX).expect("workbook rubric loads")
}

#[test]
fn workbook_columns_resolve_from_header_row() {
    let r = rubric();
    assert_eq!(r.columns.question, "Q.No");
    assert_eq!(r.columns.co, "CO");
    assert_eq!(r.columns.max_marks, "Max Marks");
    assert_eq!(r.columns.po, vec!["PO1", "PO2"]);
}

#[test]
fn numeric_question_cells_read_as_plain_numbers() {
    let r = rubric();
    let questions = r.rows.iter().map(|row| row.question_no.as_str()).collect::<Vec<_>>();
    // the trailing "Total" row has no question number and is dropped
    assert_eq!(questions, vec!["1", "2", "4a"]);
    assert!(r.row("1").is_some());
    assert!(r.row("1.0").is_none());
}

#[test]
fn max_marks_and_po_flags_come_from_float_cells() {
    let r = rubric();
    let q1 = r.row("1").unwrap();
    assert_eq!(q1.co, "CO1");
    assert_eq!(q1.max_marks, 10.0);
    assert_eq!(q1.po_flags.get("PO1"), Some(&true));
    assert_eq!(q1.po_flags.get("PO2"), Some(&false));

    let q4 = r.row("4a").unwrap();
    assert_eq!(q4.max_marks, 2.5);
    assert_eq!(q4.po_flags.get("PO2"), Some(&false));

    assert_eq!(r.cos_for_po("PO1"), vec!["CO1"]);
    assert_eq!(r.cos_for_po("PO2"), vec!["CO2"]);
}

#[test]
fn workbook_rubric_drives_aggregation() {
    let r = rubric();
    let marks = vec![
        ScriptMarkRow::new("1", "CO1", 5.0),
        ScriptMarkRow::new("2", "CO2", 5.0),
        ScriptMarkRow::new("4a", "CO1", 2.5),
    ];
    let out = aggregate(&r, &marks);
    assert_eq!(out.co.get("CO1"), Some(&60.0));
    assert_eq!(out.po.get("PO1"), Some(&60.0));
    assert_eq!(out.co.get("CO2"), Some(&100.0));
    assert_eq!(out.po.get("PO2"), Some(&100.0));
}
