use std::fs;

use image::GenericImageView;
use ocr_annotate::{Config, run};

fn write_page(path: &std::path::Path, width: u32, height: u32) {
    let mut page = image::RgbaImage::new(width, height);
    for pixel in page.pixels_mut() {
        *pixel = image::Rgba([255, 255, 255, 255]);
    }
    page.save(path).unwrap();
}

#[test]
fn renders_payload_to_annotated_png_and_html() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("page.png");
    let payload_path = dir.path().join("result.json");
    let annotated_path = dir.path().join("annotated.png");
    let text_path = dir.path().join("view.html");

    write_page(&image_path, 80, 60);
    let payload = serde_json::json!({
        "success": true,
        "text": "## Receipt\n\n**total** 42",
        "boxes": [
            {"label": "total", "box": [10, 10, 70, 30]},
            {"label": "", "box": [10, 40, 10, 50]}
        ],
        "image_dims": {"w": 80, "h": 60},
        "metadata": {"mode": "ocr"}
    });
    fs::write(&payload_path, payload.to_string()).unwrap();

    let output = run(Config {
        payload_path: Some(payload_path.display().to_string()),
        image_path: image_path.display().to_string(),
        annotated_out: Some(annotated_path.display().to_string()),
        text_out: Some(text_path.display().to_string()),
        display_width: Some(40),
        show_boxes: true,
        ..Config::default()
    })
    .unwrap();

    assert!(output.contains("image: 80x60 (image/png)"));
    assert!(output.contains("display: 40x30"));
    assert!(output.contains("content: markdown"));
    assert!(output.contains("boxes: 1 drawn, 1 skipped"));
    assert!(output.contains("Box 1: total [10, 10, 70, 30]"));
    assert!(output.contains("Box 2: [10, 40, 10, 50]"));

    let html = fs::read_to_string(&text_path).unwrap();
    assert!(html.contains("<h2>Receipt</h2>"));
    assert!(html.contains("<strong>total</strong>"));

    let annotated = image::open(&annotated_path).unwrap();
    assert_eq!(annotated.dimensions(), (40, 30));
}

#[test]
fn renders_transcript_with_grounding_markers() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("scan.png");
    let transcript_path = dir.path().join("transcript.txt");
    let payload_out = dir.path().join("payload.json");

    write_page(&image_path, 100, 100);
    fs::write(
        &transcript_path,
        "<|grounding|>Invoice\n<|ref|>total<|/ref|><|det|>[[10, 10, 90, 40]]<|/det|>",
    )
    .unwrap();

    let output = run(Config {
        transcript_path: Some(transcript_path.display().to_string()),
        image_path: image_path.display().to_string(),
        payload_out: Some(payload_out.display().to_string()),
        ..Config::default()
    })
    .unwrap();

    assert!(output.contains("display: 100x100"));
    assert!(output.contains("content: plain"));
    assert!(output.contains("boxes: 1 drawn, 0 skipped"));

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&payload_out).unwrap()).unwrap();
    assert_eq!(payload["text"], "Invoice\ntotal");
    assert_eq!(payload["boxes"][0]["label"], "total");
    assert_eq!(payload["boxes"][0]["box"][2], 90.0);
    assert_eq!(payload["image_dims"]["w"], 100.0);
    assert!(
        payload["raw_text"]
            .as_str()
            .unwrap()
            .contains("<|grounding|>")
    );
}

#[test]
fn requires_exactly_one_result_source() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("page.png");
    write_page(&image_path, 10, 10);

    let neither = run(Config {
        image_path: image_path.display().to_string(),
        ..Config::default()
    });
    assert!(neither.is_err());

    let both = run(Config {
        payload_path: Some("a.json".to_string()),
        transcript_path: Some("b.txt".to_string()),
        image_path: image_path.display().to_string(),
        ..Config::default()
    });
    assert!(both.is_err());
}

#[test]
fn rejects_non_image_input() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("page.txt");
    fs::write(&image_path, "not an image").unwrap();

    let outcome = run(Config {
        payload_path: Some("a.json".to_string()),
        image_path: image_path.display().to_string(),
        ..Config::default()
    });
    assert!(outcome.is_err());
}
