use recordwatch_core::db::open_db_in_memory;
use recordwatch_core::{
    FieldValue, Record, RecordStore, RecordType, RepoError, SqliteRecordStore, SublistLine,
};

fn sales_order() -> Record {
    let mut order = Record::new(RecordType::SalesOrder);
    order.set_value("entity", "1001");
    order.set_value("tranid", "SO100");
    order.add_line(
        "item",
        SublistLine::new()
            .with("item", "101")
            .with("item_display", "Widget")
            .with("quantity", 4_i64)
            .with("rate", 2.5)
            .with("location", "7"),
    );
    order.add_line(
        "item",
        SublistLine::new().with("item", "202").with("quantity", 1_i64),
    );
    order
}

#[test]
fn save_assigns_id_and_load_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let mut order = sales_order();
    let id = store.save(&mut order).unwrap();
    assert_eq!(order.id, Some(id));

    let loaded = store.load(RecordType::SalesOrder, id).unwrap().unwrap();
    assert_eq!(loaded, order);
}

#[test]
fn load_is_scoped_by_record_type() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let mut order = sales_order();
    let id = store.save(&mut order).unwrap();

    assert!(store.load(RecordType::Customer, id).unwrap().is_none());
    assert!(store.load(RecordType::SalesOrder, id + 100).unwrap().is_none());
}

#[test]
fn update_overwrites_body_and_missing_row_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let mut order = sales_order();
    let id = store.save(&mut order).unwrap();
    order.set_value("memo", "rush");
    assert_eq!(store.save(&mut order).unwrap(), id);
    let loaded = store.load(RecordType::SalesOrder, id).unwrap().unwrap();
    assert_eq!(loaded.get_value("memo"), Some(&FieldValue::from("rush")));

    store.delete(RecordType::SalesOrder, id).unwrap();
    let err = store.save(&mut order).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { record_type: RecordType::SalesOrder, id: missing } if missing == id
    ));
}

#[test]
fn transform_copies_item_lines_and_links_source() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let mut order = sales_order();
    let order_id = store.save(&mut order).unwrap();

    let fulfillment = store
        .transform(RecordType::SalesOrder, order_id, RecordType::ItemFulfillment)
        .unwrap();
    assert_eq!(fulfillment.record_type, RecordType::ItemFulfillment);
    assert_eq!(fulfillment.id, None);
    assert_eq!(
        fulfillment.get_value("createdfrom"),
        Some(&FieldValue::from(order_id))
    );
    assert_eq!(fulfillment.get_value("entity"), Some(&FieldValue::from("1001")));

    let lines = fulfillment.lines("item").unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].get("item_display"), Some(&FieldValue::from("Widget")));
    assert_eq!(lines[0].get("orderline"), Some(&FieldValue::from(1_i64)));
    assert_eq!(lines[1].get("quantity"), Some(&FieldValue::from(1_i64)));
    assert_eq!(lines[0].get("rate"), None);
    assert_eq!(lines[0].get("location"), None);
}

#[test]
fn transform_rejects_unknown_source_and_unsupported_pairs() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let err = store
        .transform(RecordType::SalesOrder, 999, RecordType::ItemFulfillment)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 999, .. }));

    let err = store
        .transform(RecordType::Customer, 1, RecordType::SalesOrder)
        .unwrap_err();
    assert!(matches!(err, RepoError::UnsupportedTransform { .. }));
}

#[test]
fn corrupted_body_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO records (record_type, body) VALUES ('salesorder', 'not json');",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();

    let err = SqliteRecordStore::new(&conn)
        .load(RecordType::SalesOrder, id)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
