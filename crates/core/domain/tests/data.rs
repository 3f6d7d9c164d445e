use domain::{CategorizedData, FieldMap, FieldValue, SourceCategory};

#[test]
fn source_names_follow_declaration_order() {
    let mut data = CategorizedData::new();
    let mut erp = FieldMap::new();
    erp.insert("material_number".to_string(), FieldValue::from("MAT-1001"));
    let mut plc = FieldMap::new();
    plc.insert("temperature".to_string(), FieldValue::from(71.2));
    // 插入顺序与类别顺序相反，遍历仍按类别声明顺序输出。
    data.merge_into(SourceCategory::Erp, erp);
    data.merge_into(SourceCategory::Plc, plc);
    assert_eq!(data.source_names(), vec!["plc", "erp"]);
}

#[test]
fn parse_round_trips_all_categories() {
    for category in SourceCategory::ALL {
        assert_eq!(SourceCategory::parse(category.as_str()), Some(category));
    }
    assert_eq!(SourceCategory::parse("unknown"), None);
}
