use nucleus_counter::export::{ExportError, points_from_csv, points_to_csv};
use nucleus_counter::types::Point;

#[test]
fn round_trip_preserves_order_and_values() {
    let points = vec![
        Point::new(10, 10),
        Point::new(100, 100),
        Point::new(200, 200),
    ];
    let csv = points_to_csv(&points);
    assert_eq!(csv, "X,Y\n10,10\n100,100\n200,200\n");
    assert_eq!(points_from_csv(&csv).unwrap(), points);
}

#[test]
fn empty_list_is_header_only() {
    let csv = points_to_csv(&[]);
    assert_eq!(csv, "X,Y\n");
    assert!(points_from_csv(&csv).unwrap().is_empty());
}

#[test]
fn missing_header_is_rejected() {
    let err = points_from_csv("10,10\n20,20\n").unwrap_err();
    assert!(matches!(err, ExportError::MissingHeader));
}

#[test]
fn malformed_row_reports_its_line() {
    let err = points_from_csv("X,Y\n10,10\nbogus\n").unwrap_err();
    match err {
        ExportError::MalformedRow { line, text } => {
            assert_eq!(line, 3);
            assert_eq!(text, "bogus");
        }
        other => panic!("unexpected error: {other}"),
    }
}
