use chwire_codec::column::{NullableColumn, PrimitiveColumn};
use chwire_codec::reader::{ChunkedReadDriver, read_column};
use chwire_codec::writer::write_column;
use chwire_codec::{AnyColumn, Column, ColumnType, Decimal, SerializationMode, TypeRegistry, Value};
use chwire_testkit::data_gen::{random_null_map, random_values};

fn resolve(name: &str) -> std::sync::Arc<dyn ColumnType> {
    TypeRegistry::default().resolve(name).unwrap()
}

fn round_trip(ty: &dyn ColumnType, column: &AnyColumn) -> AnyColumn {
    let mut writer = ty.create_column_writer("c", column).unwrap();
    let bytes = write_column(writer.as_mut()).unwrap();
    let reader = ty
        .create_column_reader(column.row_count(), SerializationMode::Default)
        .unwrap();
    read_column(reader, &bytes).unwrap()
}

#[test]
fn test_random_nullable_rows() {
    fastrand::seed(3);
    let values = random_values::<i32>(200);
    let nulls = random_null_map(200, 0.3);
    let rows: Vec<Option<i32>> = values
        .iter()
        .zip(&nulls)
        .map(|(&value, &null)| (!null).then_some(value))
        .collect();
    let column = NullableColumn::from_options(rows.clone(), 0).into_any();

    let decoded = round_trip(resolve("Nullable(Int32)").as_ref(), &column);
    let typed = decoded.try_reinterpret_as::<Option<i64>>().unwrap();
    for (row, expected) in rows.iter().enumerate() {
        assert_eq!(typed.value(row).unwrap(), expected.map(i64::from), "row {row}");
        assert_eq!(decoded.is_null(row), expected.is_none());
    }
}

#[test]
fn test_decoded_array_rows() {
    let ty = resolve("Array(UInt16)");
    let mut bytes = Vec::new();
    for end in [3u64, 3, 4] {
        bytes.extend_from_slice(&end.to_le_bytes());
    }
    for value in [1u16, 2, 3, 400] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    let reader = ty.create_column_reader(3, SerializationMode::Default).unwrap();
    let column = read_column(reader, &bytes).unwrap();

    let array = column.as_array().unwrap().typed::<u16>().unwrap();
    assert_eq!(array.len_at(0).unwrap(), 3);
    assert_eq!(array.len_at(1).unwrap(), 0);
    assert_eq!(array.len_at(2).unwrap(), 1);
    assert!(array.len_at(3).is_err());
    assert_eq!(array.value(2).unwrap(), vec![400]);
}

#[test]
fn test_decoded_decimal_values() {
    let ty = resolve("Decimal(9, 2)");
    let reader = ty.create_column_reader(2, SerializationMode::Default).unwrap();
    let bytes: Vec<u8> = [(-150i32).to_le_bytes(), 1i32.to_le_bytes()].concat();
    let column = read_column(reader, &bytes).unwrap();

    let Value::Decimal(first) = column.value(0).unwrap() else {
        panic!("expected a decimal value");
    };
    assert!(first.is_negative());
    assert_eq!(first.to_f64(), -1.5);
    assert_eq!(first, Decimal::from_limbs([150, 0, 0], 2, true).unwrap());
    assert_eq!(
        column.value(1).unwrap(),
        Value::Decimal(Decimal::new(1, 2).unwrap())
    );
    assert!(Decimal::from_limbs([1, 0, 0], 29, false).is_err());
}

#[test]
fn test_driver_hands_back_the_reader() {
    let values = PrimitiveColumn::new(vec![5u64, 6, 7]);
    assert_eq!(values.shared_values().len(), 3);
    let column = values.into_any();
    let ty = resolve("UInt64");
    let mut writer = ty.create_column_writer("c", &column).unwrap();
    let bytes = write_column(writer.as_mut()).unwrap();

    let skipper = ty
        .create_skipping_column_reader(3, SerializationMode::Default)
        .unwrap();
    let mut driver = ChunkedReadDriver::new(skipper);
    let (head, tail) = bytes.split_at(11);
    assert_eq!(driver.push(head).unwrap().elements, 1);
    assert_eq!(driver.pending().len(), 3);
    driver.push(tail).unwrap();
    assert!(driver.is_complete());
    let reader = driver.into_reader();
    assert!(reader.is_complete());
}
