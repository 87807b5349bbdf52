use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-annotate",
    version,
    about = "Render OCR results as annotated overlays and classified text views"
)]
struct Cli {
    /// OCR result payload (JSON file)
    #[arg(short = 'p', long = "payload")]
    payload: Option<String>,

    /// Raw model transcript with grounding markers
    #[arg(short = 't', long = "transcript")]
    transcript: Option<String>,

    /// Source image the result refers to
    #[arg(short = 'i', long = "image")]
    image: String,

    /// Write the annotated image (PNG)
    #[arg(short = 'o', long = "annotated-out")]
    annotated_out: Option<String>,

    /// Write the rendered text view (HTML fragment)
    #[arg(long = "text-out")]
    text_out: Option<String>,

    /// Write the parsed result payload (JSON)
    #[arg(long = "payload-out")]
    payload_out: Option<String>,

    /// Display width in pixels (defaults to the image width)
    #[arg(short = 'w', long = "display-width")]
    display_width: Option<u32>,

    /// List parsed boxes in the output
    #[arg(long = "show-boxes")]
    show_boxes: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging (repeat for per-box detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_annotate::logging::init(cli.verbose)?;

    let output = ocr_annotate::run(ocr_annotate::Config {
        payload_path: cli.payload,
        transcript_path: cli.transcript,
        image_path: cli.image,
        annotated_out: cli.annotated_out,
        text_out: cli.text_out,
        payload_out: cli.payload_out,
        display_width: cli.display_width,
        settings_path: cli.read_settings,
        show_boxes: cli.show_boxes,
    })?;
    println!("{}", output);
    Ok(())
}
