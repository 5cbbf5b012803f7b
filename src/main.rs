// Command-line front end: reads a card photo (or a token dump) and prints the
// recovered fields as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;
use serde_json::{json, Value};

use kimlik::processing::{default_recognizer, split_tokens, FieldExtractor};
use kimlik::utils::config::{DEFAULT_MAX_WIDTH, DEFAULT_TARGET_WIDTH};
use kimlik::utils::{NormalizerConfig, ReaderConfig};
use kimlik::validation::CompletenessValidator;
use kimlik::{Extraction, Face, IdCardError, IdCardReader};

const CLEARER_IMAGE: &str = "Please provide a clearer image";
const MISSING_IMAGE: &str = "Please provide an image";

/// Exit code for a readable image that did not yield every required field.
const EXIT_INCOMPLETE: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "kimlik", version, about = "Read identity card fields from a photo")]
struct Cli {
    /// OCR languages, `+`-separated (default: $KIMLIK_OCR_LANG or eng+tur)
    #[arg(long)]
    lang: Option<String>,

    /// Directory containing the tessdata files (default: $TESSDATA_PREFIX)
    #[arg(long)]
    tessdata: Option<String>,

    /// Images wider than this are downscaled before OCR
    #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
    max_width: u32,

    /// Width normalized images are scaled to
    #[arg(long, default_value_t = DEFAULT_TARGET_WIDTH)]
    target_width: u32,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the front face: identity number, names, dates, gender, document number
    Front { image: PathBuf },
    /// Read the back face: mother's and father's names
    Back { image: PathBuf },
    /// Run extraction on an existing token dump, one token per line
    Tokens {
        #[arg(long)]
        face: Face,
        file: PathBuf,
    },
}

impl Cli {
    /// Environment defaults, overridden by whatever was given on the command line.
    fn reader_config(&self) -> ReaderConfig {
        let mut config = ReaderConfig::from_env();
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if let Some(tessdata) = &self.tessdata {
            config.ocr.datapath = Some(tessdata.clone());
        }
        config.normalizer = NormalizerConfig {
            max_width: self.max_width,
            target_width: self.target_width,
        };
        config
    }
}

fn run(cli: &Cli) -> Result<Extraction, IdCardError> {
    let (image, face) = match &cli.command {
        Command::Front { image } => (image, Face::Front),
        Command::Back { image } => (image, Face::Back),
        Command::Tokens { face, file } => {
            let text = std::fs::read_to_string(file)?;
            let tokens = split_tokens(&text);
            let record = FieldExtractor::new().extract(&tokens, *face);
            let complete = CompletenessValidator::is_complete(&record, *face);
            return Ok(Extraction {
                face: *face,
                record,
                complete,
            });
        }
    };

    if !image.exists() {
        return Err(IdCardError::InvalidImage(format!(
            "File not found: {}",
            image.display()
        )));
    }

    let config = cli.reader_config();
    let recognizer = default_recognizer(&config.ocr)?;
    let reader = IdCardReader::with_config(recognizer, config.normalizer);
    reader.extract_file(image, face)
}

/// JSON body and process exit code for the outcome of a run.
fn render(outcome: &Result<Extraction, IdCardError>) -> (Value, u8) {
    match outcome {
        Ok(extraction) if extraction.complete => (json!({ "citizen": extraction.record }), 0),
        Ok(_) => (json!({ "msg": CLEARER_IMAGE }), EXIT_INCOMPLETE),
        Err(err) if err.is_user_error() => (json!({ "msg": MISSING_IMAGE }), EXIT_FAILURE),
        Err(err) => (json!({ "msg": err.to_string() }), EXIT_FAILURE),
    }
}

fn print_json(value: &Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(err) => error!("Failed to render output: {}", err),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = run(&cli);
    if let Err(err) = &outcome {
        error!("{}", err);
    }

    let (body, code) = render(&outcome);
    print_json(&body, cli.pretty);
    ExitCode::from(code)
}
