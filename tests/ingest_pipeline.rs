//! End-to-end dispatch tests with injected OCR and rasterization.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use docintake::ocr::{OcrBackend, OcrError, OcrResult, PageRasterizer};
use docintake::{
    BatchEntry, Config, IngestError, IngestOutput, Ingestor, InputType, LlmMode, NoiseLevel,
    Reference, TextDensity,
};

/// OCR backend that returns the same text for every image.
struct FixedOcr(String);

impl OcrBackend for FixedOcr {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        assert!(image_path.exists(), "normalized image should be on disk");
        Ok(OcrResult {
            text: self.0.clone(),
            backend: "fixed",
            processing_time_ms: 0,
        })
    }
}

/// Rasterizer that writes `pages` small PNGs instead of rendering a PDF.
struct FakeRasterizer {
    pages: usize,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, _pdf: &Path, _dpi: u32, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        (1..=self.pages)
            .map(|n| -> Result<PathBuf, OcrError> {
                let path = output_dir.join(format!("page-{}.png", n));
                std::fs::write(&path, png_bytes(64, 64))?;
                Ok(path)
            })
            .collect()
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([235, 235, 235])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn clean_text() -> String {
    "The quarterly report describes revenue growth across all regions and notes \
     that operating costs remained flat compared to the previous period. Staffing \
     levels are unchanged and the board approved the proposed budget for next year."
        .to_string()
}

fn ingestor(config: Config, ocr_text: &str, pages: usize) -> Ingestor {
    Ingestor::new(config)
        .unwrap()
        .with_ocr_backend(Arc::new(FixedOcr(ocr_text.to_string())))
        .with_rasterizer(Arc::new(FakeRasterizer { pages }))
}

fn default_ingestor(ocr_text: &str) -> Ingestor {
    ingestor(Config::default(), ocr_text, 1)
}

fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn single(output: IngestOutput) -> docintake::IngestionResult {
    match output {
        IngestOutput::Single(result) => *result,
        IngestOutput::Batch(_) => panic!("expected a single result"),
    }
}

fn batch(output: IngestOutput) -> Vec<BatchEntry> {
    match output {
        IngestOutput::Batch(entries) => entries,
        IngestOutput::Single(_) => panic!("expected a batch"),
    }
}

#[tokio::test]
async fn test_clean_high_resolution_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, png_bytes(1200, 1200)).unwrap();

    let result = single(
        default_ingestor(&clean_text())
            .ingest(&Reference::Path(path))
            .await
            .unwrap(),
    );

    assert!(clean_text().chars().count() >= 200);
    assert_eq!(result.confidence(), 1.0);
    assert!(result.warnings().is_empty());
    assert_eq!(result.meta().input_type, InputType::Image);
    assert_eq!(result.meta().page_count, 1);
    assert_eq!(result.meta().noise_level, NoiseLevel::Low);
    assert_eq!(result.meta().recommended_llm_mode, LlmMode::Creative);
    assert_eq!(result.meta().text_density, TextDensity::Low);
}

#[tokio::test]
async fn test_small_noisy_image_collects_every_penalty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thumb.png");
    std::fs::write(&path, png_bytes(400, 400)).unwrap();

    let noisy = "#$%&*@!~^|#$%&*@!~^|#$%&*@!~^|abcde fghij klmno pq";
    let result = single(default_ingestor(noisy).ingest(&Reference::Path(path)).await.unwrap());

    assert!(result.confidence() <= 0.1);
    assert!(result.confidence() >= 0.0);
    for code in ["short_text", "low_confidence_text", "low_resolution"] {
        assert!(result.warnings().contains(code), "missing {}", code);
    }
    assert_eq!(result.meta().recommended_llm_mode, LlmMode::Strict);
}

#[tokio::test]
async fn test_blank_image_is_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.png");
    std::fs::write(&path, png_bytes(100, 100)).unwrap();

    let result = single(default_ingestor("  \n ").ingest(&Reference::Path(path)).await.unwrap());
    assert!(result.is_empty());
    assert_eq!(result.confidence(), 0.0);
    assert!(result.warnings().contains("no_text_detected"));
}

#[tokio::test]
async fn test_pdf_with_no_text_on_any_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, b"%PDF-1.4\n").unwrap();

    let result = single(
        ingestor(Config::default(), "", 3)
            .ingest(&Reference::Path(path))
            .await
            .unwrap(),
    );

    assert_eq!(result.meta().input_type, InputType::Pdf);
    assert_eq!(result.meta().page_count, 3);
    assert_eq!(result.confidence(), 0.0);
    assert_eq!(result.warnings().iter().collect::<Vec<_>>(), vec!["no_text_detected"]);
}

#[tokio::test]
async fn test_pdf_pages_are_joined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, b"%PDF-1.4\n").unwrap();

    let result = single(
        ingestor(Config::default(), &clean_text(), 2)
            .ingest(&Reference::Path(path))
            .await
            .unwrap(),
    );

    assert_eq!(result.meta().page_count, 2);
    assert_eq!(result.text(), format!("{}\n\n{}", clean_text(), clean_text()));
    assert_eq!(
        result.meta().avg_chars_per_page,
        result.text().chars().count() / 2
    );
}

#[tokio::test]
async fn test_text_file_with_file_meta() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "  # Notes\n\nship it\n").unwrap();

    let result = single(
        default_ingestor("")
            .ingest(&Reference::Path(path.clone()))
            .await
            .unwrap(),
    );

    assert_eq!(result.text(), "# Notes\n\nship it");
    assert_eq!(result.meta().input_type, InputType::Text);
    let meta = result.file_meta().expect("file meta attached");
    assert_eq!(
        meta.origin,
        std::fs::canonicalize(&path).unwrap().display().to_string()
    );
    assert_eq!(meta.file_name, "notes.md");
    assert_eq!(meta.extension.as_deref(), Some("md"));
}

#[tokio::test]
async fn test_file_meta_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    let config = Config {
        attach_file_meta: false,
        ..Config::default()
    };
    let result = single(
        ingestor(config, "", 1)
            .ingest(&Reference::Path(path))
            .await
            .unwrap(),
    );
    assert!(result.file_meta().is_none());
}

#[tokio::test]
async fn test_archive_isolates_member_failures() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("bundle.zip");
    let image = png_bytes(900, 900);
    build_zip(
        &archive,
        &[
            ("a.txt", b"first document".as_slice()),
            ("b.png", image.as_slice()),
            ("c.png", b"this is not a png".as_slice()),
            ("docs/d.csv", b"x,y\n1,2".as_slice()),
        ],
    );

    let entries = batch(
        default_ingestor(&clean_text())
            .ingest(&Reference::Path(archive.clone()))
            .await
            .unwrap(),
    );

    assert_eq!(entries.len(), 4);
    let results: Vec<_> = entries.iter().filter_map(BatchEntry::as_result).collect();
    let errors: Vec<_> = entries.iter().filter_map(BatchEntry::as_error).collect();
    assert_eq!(results.len(), 3);
    assert_eq!(errors.len(), 1);

    let archive_origin = std::fs::canonicalize(&archive).unwrap().display().to_string();
    assert_eq!(errors[0].origin, format!("{}!/c.png", archive_origin));

    let origins: Vec<_> = results
        .iter()
        .map(|r| r.file_meta().unwrap().origin.clone())
        .collect();
    assert_eq!(
        origins,
        vec![
            format!("{}!/a.txt", archive_origin),
            format!("{}!/b.png", archive_origin),
            format!("{}!/docs/d.csv", archive_origin),
        ]
    );
}

#[tokio::test]
async fn test_nested_archives_are_flattened() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("inner.zip");
    build_zip(&inner, &[("deep.txt", b"deep text".as_slice())]);
    let inner_bytes = std::fs::read(&inner).unwrap();

    let outer = dir.path().join("outer.zip");
    build_zip(
        &outer,
        &[
            ("top.txt", b"top text".as_slice()),
            ("inner.zip", inner_bytes.as_slice()),
        ],
    );

    let entries = batch(
        default_ingestor("")
            .ingest(&Reference::Path(outer.clone()))
            .await
            .unwrap(),
    );

    let texts: Vec<_> = entries
        .iter()
        .filter_map(BatchEntry::as_result)
        .map(|r| r.text().to_string())
        .collect();
    assert_eq!(texts, vec!["deep text", "top text"]);

    let outer_origin = std::fs::canonicalize(&outer).unwrap().display().to_string();
    let deep = entries[0].as_result().unwrap().file_meta().unwrap();
    assert_eq!(deep.origin, format!("{}!/inner.zip!/deep.txt", outer_origin));
}

#[tokio::test]
async fn test_nesting_beyond_limit_is_a_member_error() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("inner.zip");
    build_zip(&inner, &[("deep.txt", b"deep text".as_slice())]);
    let inner_bytes = std::fs::read(&inner).unwrap();
    let outer = dir.path().join("outer.zip");
    build_zip(
        &outer,
        &[
            ("top.txt", b"top text".as_slice()),
            ("inner.zip", inner_bytes.as_slice()),
        ],
    );

    let mut config = Config::default();
    config.archive.max_depth = 0;
    let entries = batch(
        ingestor(config, "", 1)
            .ingest(&Reference::Path(outer))
            .await
            .unwrap(),
    );

    assert_eq!(entries.len(), 2);
    let error = entries[0].as_error().expect("nested archive rejected");
    assert!(error.origin.ends_with("!/inner.zip"));
    assert!(error.error.contains("depth"));
    assert_eq!(entries[1].as_result().unwrap().text(), "top text");
}

#[tokio::test]
async fn test_dot_files_in_archives_are_members() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("notes.zip");
    build_zip(
        &archive,
        &[
            ("visible.txt", b"visible text".as_slice()),
            (".notes.txt", b"hidden text".as_slice()),
            ("__MACOSX/._visible.txt", b"resource fork".as_slice()),
        ],
    );

    let entries = batch(
        default_ingestor("")
            .ingest(&Reference::Path(archive.clone()))
            .await
            .unwrap(),
    );

    let archive_origin = std::fs::canonicalize(&archive).unwrap().display().to_string();
    let results: Vec<_> = entries.iter().filter_map(BatchEntry::as_result).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text(), "hidden text");
    assert_eq!(
        results[0].file_meta().unwrap().origin,
        format!("{}!/.notes.txt", archive_origin)
    );
    assert_eq!(results[1].text(), "visible text");
}

#[tokio::test]
async fn test_unextractable_entry_becomes_error_record() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("clash.zip");
    build_zip(
        &archive,
        &[
            ("a.txt", b"alpha".as_slice()),
            ("a.txt/b.txt", b"beta".as_slice()),
        ],
    );

    let entries = batch(
        default_ingestor("")
            .ingest(&Reference::Path(archive.clone()))
            .await
            .unwrap(),
    );

    let archive_origin = std::fs::canonicalize(&archive).unwrap().display().to_string();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].as_result().unwrap().text(), "alpha");
    let error = entries[1].as_error().expect("clashing entry reported");
    assert_eq!(error.origin, format!("{}!/a.txt/b.txt", archive_origin));
    assert!(error.error.starts_with("Failed to extract entry a.txt/b.txt"));
}

/// OCR backend that records how many calls overlap.
#[derive(Default)]
struct CountingOcr {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl OcrBackend for CountingOcr {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    fn ocr_image(&self, _image_path: &Path) -> Result<OcrResult, OcrError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(OcrResult {
            text: clean_text(),
            backend: "counting",
            processing_time_ms: 50,
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_limit_spans_nested_archives() {
    let dir = tempfile::tempdir().unwrap();
    let image = png_bytes(64, 64);
    let inner = dir.path().join("inner.zip");
    build_zip(
        &inner,
        &[
            ("x.png", image.as_slice()),
            ("y.png", image.as_slice()),
            ("z.png", image.as_slice()),
        ],
    );
    let inner_bytes = std::fs::read(&inner).unwrap();
    let outer = dir.path().join("outer.zip");
    build_zip(
        &outer,
        &[
            ("0.zip", inner_bytes.as_slice()),
            ("a.png", image.as_slice()),
            ("b.png", image.as_slice()),
            ("c.png", image.as_slice()),
        ],
    );

    let mut config = Config::default();
    config.archive.workers = 2;
    let ocr = Arc::new(CountingOcr::default());
    let entries = batch(
        Ingestor::new(config)
            .unwrap()
            .with_ocr_backend(ocr.clone())
            .ingest(&Reference::Path(outer))
            .await
            .unwrap(),
    );

    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.as_result().is_some()));
    let peak = ocr.peak.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 2, "peak concurrency was {}", peak);
}

#[test]
fn test_ingestor_exposes_ocr_backend() {
    let ingestor = default_ingestor("text");
    let ocr = ingestor.ocr_backend();
    assert_eq!(ocr.name(), "fixed");
    assert!(ocr.is_available());
}

#[tokio::test]
async fn test_corrupt_archive_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.zip");
    std::fs::write(&path, b"PK not really").unwrap();

    let err = default_ingestor("")
        .ingest(&Reference::Path(path))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Archive(_)));
}

#[tokio::test]
async fn test_office_documents_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.DOCX");
    std::fs::write(&path, b"PK").unwrap();

    let err = default_ingestor("")
        .ingest(&Reference::Path(path))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::ConversionUnavailable(ref ext) if ext == "docx"));
}

#[tokio::test]
async fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.mp3");
    std::fs::write(&path, b"ID3").unwrap();

    let err = default_ingestor("")
        .ingest(&Reference::Path(path))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedKind(ref ext) if ext == "mp3"));
}

#[tokio::test]
async fn test_bytes_without_extension_are_sniffed() {
    let result = single(
        default_ingestor(&clean_text())
            .ingest(&Reference::bytes("upload", png_bytes(850, 850)))
            .await
            .unwrap(),
    );

    assert_eq!(result.meta().input_type, InputType::Image);
    assert_eq!(result.file_meta().unwrap().origin, "upload");
}

#[tokio::test]
async fn test_text_passthrough_is_idempotent() {
    let ingestor = default_ingestor("");
    let first = single(
        ingestor
            .ingest(&Reference::bytes("a.txt", b"  some words \xff here \n".to_vec()))
            .await
            .unwrap(),
    );
    let second = single(
        ingestor
            .ingest(&Reference::bytes("a.txt", first.text().as_bytes().to_vec()))
            .await
            .unwrap(),
    );

    assert_eq!(first.text(), second.text());
    assert_eq!(first.confidence(), second.confidence());
    assert_eq!(first.warnings(), second.warnings());
    assert_eq!(first.meta(), second.meta());
}

#[tokio::test]
async fn test_serialized_result_shape() {
    let result = single(
        default_ingestor("")
            .ingest(&Reference::bytes("empty.txt", Vec::new()))
            .await
            .unwrap(),
    );

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["schema_version"], "1.3");
    assert_eq!(value["overall_confidence"], 0.0);
    assert_eq!(value["warnings"][0], "no_text_detected");
    assert_eq!(value["ingest_meta"]["input_type"], "text");
    assert_eq!(value["ingest_meta"]["recommended_llm_mode"], "strict");
    assert!(value.get("source_meta").is_none());
}
