use chwire_codec::column::PrimitiveColumn;
use chwire_codec::column::string::StringColumn;
use chwire_codec::reader::sparse::{CUSTOM_MODE_DEFAULT, CUSTOM_MODE_SPARSE, END_OF_GRANULE_FLAG};
use chwire_codec::reader::{ChunkedReadDriver, read_column};
use chwire_codec::writer::sparse::encode_sparse_offsets;
use chwire_codec::writer::write_column;
use chwire_codec::{
    AnyColumn, ColumnType, ErrorKind, SerializationMode, TypeRegistry, TypeSettings, Value,
};
use chwire_testkit::chunks::random_chunks;
use chwire_testkit::data_gen::random_sparse_offsets;
use integer_encoding::VarInt;

fn resolve(name: &str) -> std::sync::Arc<dyn ColumnType> {
    TypeRegistry::default().resolve(name).unwrap()
}

/// The group stream for `offsets` followed by the explicit values.
fn sparse_bytes(
    ty: &dyn ColumnType,
    offsets: &[usize],
    rows: usize,
    values: AnyColumn,
) -> Vec<u8> {
    let mut bytes = encode_sparse_offsets(offsets, rows).unwrap();
    let (values_type, _) = ty.sparse_values().unwrap();
    let mut writer = values_type.create_column_writer("v", &values).unwrap();
    bytes.extend(write_column(writer.as_mut()).unwrap());
    bytes
}

fn read(ty: &dyn ColumnType, rows: usize, mode: SerializationMode, bytes: &[u8]) -> AnyColumn {
    read_column(ty.create_column_reader(rows, mode).unwrap(), bytes).unwrap()
}

/// Feeds `bytes` to a skipping reader in random chunks and returns the row total
/// it reported.
fn skipped_rows(
    ty: &dyn ColumnType,
    rows: usize,
    mode: SerializationMode,
    bytes: &[u8],
) -> usize {
    let mut reader = ty.create_skipping_column_reader(rows, mode).unwrap();
    let mut pending = Vec::new();
    let mut reported = 0;
    for chunk in random_chunks(bytes, 5) {
        pending.extend_from_slice(chunk);
        while !reader.is_complete() {
            let size = reader.read_next(&pending).unwrap();
            if size.is_empty() {
                break;
            }
            pending.drain(..size.bytes);
            reported += size.elements;
        }
    }
    assert!(reader.is_complete());
    assert!(pending.is_empty());
    reported
}

#[test]
fn test_sparse_lookup() {
    let ty = resolve("UInt32");
    let values = PrimitiveColumn::new(vec![10u32, 20, 30]).into_any();
    let bytes = sparse_bytes(ty.as_ref(), &[2, 5, 9], 12, values);

    let mut driver =
        ChunkedReadDriver::new(ty.create_column_reader(12, SerializationMode::Sparse).unwrap());
    for byte in &bytes {
        driver.push(std::slice::from_ref(byte)).unwrap();
    }
    assert_eq!(driver.elements(), 12);
    let column = driver.finish().unwrap();
    let expected: Vec<Value> = (0..12)
        .map(|row| match row {
            2 => Value::UInt32(10),
            5 => Value::UInt32(20),
            9 => Value::UInt32(30),
            _ => Value::UInt32(0),
        })
        .collect();
    assert_eq!(column.values().unwrap(), expected);
    assert_eq!(column.value(11).unwrap(), Value::UInt32(0));

    let typed = column.try_reinterpret_as::<u64>().unwrap();
    assert_eq!(typed.value(9).unwrap(), 30);
}

#[test]
fn test_custom_mode_prefix() {
    let ty = resolve("Int16");
    let mut plain = vec![CUSTOM_MODE_DEFAULT];
    plain.extend_from_slice(&[1, 0, 2, 0]);
    let column = read(ty.as_ref(), 2, SerializationMode::Custom, &plain);
    assert_eq!(column.values().unwrap(), vec![Value::Int16(1), Value::Int16(2)]);

    let mut sparse = vec![CUSTOM_MODE_SPARSE];
    sparse.extend(sparse_bytes(
        ty.as_ref(),
        &[1],
        3,
        PrimitiveColumn::new(vec![-5i16]).into_any(),
    ));
    let column = read(ty.as_ref(), 3, SerializationMode::Custom, &sparse);
    assert_eq!(
        column.values().unwrap(),
        vec![Value::Int16(0), Value::Int16(-5), Value::Int16(0)]
    );

    let mut reader = ty.create_column_reader(2, SerializationMode::Custom).unwrap();
    let err = reader.read_next(&[2, 0, 0, 0, 0]).unwrap_err();
    assert!(err.is_protocol());
}

#[test]
fn test_serialization_mode_from_settings() {
    let settings = TypeSettings::default().with_sparse_serialization(false);
    assert_eq!(
        settings.serialization_mode(false).unwrap(),
        SerializationMode::Default
    );
    let err = settings.serialization_mode(true).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Protocol { .. }));
}

#[test]
fn test_overrunning_granule_end_is_tolerated() {
    let ty = resolve("UInt8");
    let mut bytes = 1u64.encode_var_vec();
    bytes.extend((END_OF_GRANULE_FLAG | 10).encode_var_vec());
    bytes.push(7);
    let column = read(ty.as_ref(), 4, SerializationMode::Sparse, &bytes);
    assert_eq!(
        column.values().unwrap(),
        vec![Value::UInt8(0), Value::UInt8(7), Value::UInt8(0), Value::UInt8(0)]
    );
}

#[test]
fn test_offset_past_row_count_is_a_protocol_error() {
    let ty = resolve("UInt8");
    let mut reader = ty.create_column_reader(3, SerializationMode::Sparse).unwrap();
    let err = reader.read_next(&5u64.encode_var_vec()).unwrap_err();
    assert!(err.is_protocol());
}

#[test]
fn test_nullable_sparse_defaults_are_null() {
    let ty = resolve("Nullable(String)");
    let values = StringColumn::from_strings(["x", ""]).into_any();
    let bytes = sparse_bytes(ty.as_ref(), &[0, 2], 4, values);
    let column = read(ty.as_ref(), 4, SerializationMode::Sparse, &bytes);
    assert_eq!(
        column.values().unwrap(),
        vec![
            Value::String("x".into()),
            Value::Null,
            Value::String(String::new()),
            Value::Null
        ]
    );
}

#[test]
fn test_skip_accounting() {
    fastrand::seed(42);
    let ty = resolve("Int64");
    for (rows, density) in [(500, 0.0), (500, 1.0), (500, 0.05), (1, 1.0), (1, 0.0)] {
        let offsets = random_sparse_offsets(rows, density);
        let values: Vec<i64> = offsets.iter().map(|&o| o as i64 * 3 + 1).collect();
        let column = PrimitiveColumn::new(values.clone()).into_any();
        let bytes = sparse_bytes(ty.as_ref(), &offsets, rows, column.clone());
        assert_eq!(
            skipped_rows(ty.as_ref(), rows, SerializationMode::Sparse, &bytes),
            rows,
            "{rows} rows at density {density}"
        );

        let decoded = read(ty.as_ref(), rows, SerializationMode::Sparse, &bytes);
        let typed = decoded.try_reinterpret_as::<i64>().unwrap();
        for (&offset, &value) in offsets.iter().zip(&values) {
            assert_eq!(typed.value(offset).unwrap(), value);
        }

        let mut writer = ty.create_column_writer("c", &column).unwrap();
        let plain = write_column(writer.as_mut()).unwrap();
        assert_eq!(
            skipped_rows(ty.as_ref(), offsets.len(), SerializationMode::Default, &plain),
            offsets.len()
        );
    }
}

#[test]
fn test_sparse_enum_exposes_codes() {
    let ty = resolve("Enum8('low' = 1, 'high' = 2)");
    let values = StringColumn::from_strings(["high", "low"]).into_any();
    let bytes = sparse_bytes(ty.as_ref(), &[1, 3], 5, values);
    let sparse = read(ty.as_ref(), 5, SerializationMode::Sparse, &bytes);

    let names = StringColumn::from_strings(["low", "high", "low", "low", "low"]).into_any();
    let mut writer = ty.create_column_writer("e", &names).unwrap();
    let plain = read(
        ty.as_ref(),
        5,
        SerializationMode::Default,
        &write_column(writer.as_mut()).unwrap(),
    );
    assert_eq!(sparse.values().unwrap(), plain.values().unwrap());

    for column in [&sparse, &plain] {
        let codes = column.try_reinterpret_as::<i8>().unwrap();
        let codes: Vec<i8> = (0..5).map(|row| codes.value(row).unwrap()).collect();
        assert_eq!(codes, vec![1, 2, 1, 1, 1]);
        let wide = column.try_reinterpret_as::<i16>().unwrap();
        assert_eq!(wide.value(1).unwrap(), 2);
        assert_eq!(wide.value(4).unwrap(), 1);
    }
}

#[test]
fn test_types_without_sparse_serialization() {
    let ty = resolve("Array(UInt8)");
    let err = ty
        .create_column_reader(3, SerializationMode::Sparse)
        .err()
        .unwrap();
    assert!(matches!(err.kind(), ErrorKind::NotSupported { .. }));
}
