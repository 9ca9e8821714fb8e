use async_compression::tokio::write::GzipEncoder;
use rust_xlsxwriter::Workbook;
use sheet_ingest::{
    Cell, FileStore, IngestionPipeline, KeyValueStore, MemoryStore, Record, UploadError, UploadMeta,
};
use std::fs;
use tokio::io::AsyncWriteExt;

/// Builds an xlsx file with `rows` written as text/number cells.
fn xlsx(rows: &[&[Cell]]) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Cell::Int(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn header() -> Vec<Cell> {
    ["Product Name", "Price", "Quantity", "Stock"]
        .into_iter()
        .map(Cell::text)
        .collect()
}

fn product(name: &str, price: i64, quantity: i64, stock: i64) -> Vec<Cell> {
    vec![
        Cell::text(name),
        Cell::Int(price),
        Cell::Int(quantity),
        Cell::Int(stock),
    ]
}

fn name_of(record: &Record) -> String {
    record.key("Product Name").to_string()
}

#[tokio::test]
async fn xlsx_upload_confirm_then_duplicate_reupload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    // seed the catalog with product A
    let mut seed = IngestionPipeline::new(FileStore::new(dir.path()), "products");
    let first = xlsx(&[&header(), &product("A", 10, 1, 5)])?;
    seed.ingest(first, &UploadMeta::named("a.xlsx")).await?;
    seed.confirm()?;
    drop(seed);

    // restart and upload B
    let mut pipeline = IngestionPipeline::new(FileStore::new(dir.path()), "products");
    assert_eq!(pipeline.collection().len(), 1);

    let upload = xlsx(&[&header(), &product("B", 20, 2, 3)])?;
    let ready = pipeline.ingest(upload.clone(), &UploadMeta::named("b.xlsx")).await?;
    assert_eq!(ready.rows, 1);

    let preview = pipeline.preview().expect("staged preview");
    assert_eq!(name_of(&preview[0]), "B");
    assert_eq!(preview[0].get("Price").map(ToString::to_string).as_deref(), Some("20"));

    assert_eq!(pipeline.confirm()?, 1);
    let names: Vec<String> = pipeline.collection().iter().map(name_of).collect();
    assert_eq!(names, ["A", "B"]);

    // the same file again collides with the stored B
    let err = pipeline
        .ingest(upload, &UploadMeta::named("b.xlsx"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::DuplicateProductName(ref key) if key.to_string() == "B"));
    assert_eq!(pipeline.collection().len(), 2);
    assert!(!pipeline.has_pending());

    // what was last written is what a fresh process sees
    let reopened = IngestionPipeline::new(FileStore::new(dir.path()), "products");
    assert_eq!(reopened.collection(), pipeline.collection());
    Ok(())
}

#[tokio::test]
async fn xlsx_with_extra_column_is_rejected() -> anyhow::Result<()> {
    let mut pipeline = IngestionPipeline::new(MemoryStore::new(), "products");
    let mut wide = header();
    wide.push(Cell::text("Notes"));
    let raw = xlsx(&[&wide, &product("A", 1, 1, 1)])?;

    let err = pipeline
        .ingest(raw, &UploadMeta::named("wide.xlsx"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::ColumnMismatch { .. }));
    assert!(err.user_message().contains("Product Name, Price, Quantity, Stock"));
    Ok(())
}

#[tokio::test]
async fn xlsx_note_beside_data_row_still_matches_header() -> anyhow::Result<()> {
    // header in A1:D1, a stray note in E2 widens the sheet's used range
    let mut row = product("A", 1, 1, 1);
    row.push(Cell::text("note"));
    let raw = xlsx(&[&header(), &row])?;

    let mut pipeline = IngestionPipeline::new(MemoryStore::new(), "products");
    let ready = pipeline.ingest(raw, &UploadMeta::named("notes.xlsx")).await?;
    assert_eq!(ready.rows, 1);

    let preview = pipeline.preview().expect("staged preview");
    assert_eq!(
        preview[0].columns().collect::<Vec<_>>(),
        ["Product Name", "Price", "Quantity", "Stock"]
    );
    Ok(())
}

#[tokio::test]
async fn gzip_csv_upload_is_staged() -> anyhow::Result<()> {
    let mut encoder = GzipEncoder::new(Vec::new());
    encoder
        .write_all(b"Product Name,Price,Quantity,Stock\nWidget,9.99,3,12\nGadget,4,1,0\n")
        .await?;
    encoder.shutdown().await?;
    let raw = encoder.into_inner();

    let mut pipeline = IngestionPipeline::new(MemoryStore::new(), "products");
    let ready = pipeline
        .ingest(raw, &UploadMeta::named("products.csv.gz"))
        .await?;
    assert_eq!(ready.rows, 2);

    let preview = pipeline.preview().expect("staged preview");
    assert_eq!(preview[0].get("Price"), Some(&Cell::text("9.99")));
    Ok(())
}

#[tokio::test]
async fn delete_then_restart_round_trips() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("batch.csv");
    fs::write(
        &csv_path,
        "Product Name,Price,Quantity,Stock\nA,1,1,1\nB,2,2,2\nC,3,3,3\n",
    )?;

    let store_dir = dir.path().join("store");
    let mut pipeline = IngestionPipeline::new(FileStore::new(&store_dir), "products");
    pipeline.ingest_path(&csv_path).await?;
    pipeline.confirm()?;

    let removed = pipeline.remove_at(1)?.expect("record at 1");
    assert_eq!(name_of(&removed), "B");
    assert!(pipeline.remove_at(10)?.is_none());

    let reopened = IngestionPipeline::new(FileStore::new(&store_dir), "products");
    let names: Vec<String> = reopened.collection().iter().map(name_of).collect();
    assert_eq!(names, ["A", "C"]);
    Ok(())
}

#[tokio::test]
async fn corrupt_catalog_starts_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut storage = FileStore::new(dir.path());
    storage.set("products", "[{\"Product Name\":")?;

    let pipeline = IngestionPipeline::new(storage, "products");
    assert!(pipeline.collection().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_file_is_a_decode_error() {
    let mut pipeline = IngestionPipeline::new(MemoryStore::new(), "products");
    let err = pipeline
        .ingest_path(std::path::Path::new("/definitely/not/here.xlsx"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Decode(_)));
}
