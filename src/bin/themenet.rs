//! Themenet CLI — theme extraction over semantic graphs.
//!
//! Usage:
//!   themenet process [FILE] [--graph] [--options rdf,themes,semnet]
//!   themenet word-forms <WORD> [--normal]
//!
//! Text input uses the reference markup kernel: entities are declared
//! inline as `[[Name|Type|Role]]`.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use themenet::{
    AttrCoreference, GraphRequest, MarkupKernel, Options, TextProcessor, TextRequest, Worker,
};

#[derive(Parser)]
#[command(name = "themenet", version, about = "Theme and relation extraction engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process text (or a serialized graph) into themes and links
    Process {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
        /// Treat the input as a previously serialized graph
        #[arg(long)]
        graph: bool,
        /// Comma-separated result components: rdf, themes, semnet
        #[arg(long, default_value = "rdf,themes")]
        options: String,
        /// Include entities of nested sub-sentences
        #[arg(long)]
        all_subthemes: bool,
        /// Number of pooled kernel workers
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
    /// Look up word forms through the kernel
    WordForms {
        /// Word to look up
        word: String,
        /// Print only the normal form
        #[arg(long)]
        normal: bool,
    },
}

fn parse_options(spec: &str) -> Result<Options, String> {
    let mut options = Options::NONE;
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token {
            "rdf" => options.insert(Options::RDF),
            "themes" => options.insert(Options::THEME_LIST),
            "semnet" => options.insert(Options::SEM_NET),
            "all" => options.insert(Options::ALL),
            other => return Err(format!("unknown option '{}'", other)),
        }
    }
    Ok(options)
}

fn read_input(file: Option<&PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e)),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

fn build_processor(workers: usize) -> TextProcessor {
    let workers = workers.max(1);
    let pool = (0..workers)
        .map(|_| {
            Worker::new(Box::new(MarkupKernel::new()))
                .with_coreference(Box::new(AttrCoreference::new()))
        })
        .collect();
    TextProcessor::new(pool)
}

async fn cmd_process(
    file: Option<PathBuf>,
    graph: bool,
    options: &str,
    all_subthemes: bool,
    workers: usize,
    compact: bool,
) -> i32 {
    let options = match parse_options(options) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let input = match read_input(file.as_ref()) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let processor = build_processor(workers);
    let result = if graph {
        let request = GraphRequest::new(input)
            .with_options(options)
            .with_all_subthemes(all_subthemes);
        processor.process_graph(&request).await
    } else {
        let request = TextRequest::new(input)
            .with_options(options)
            .with_all_subthemes(all_subthemes);
        processor.process_text(&request).await
    };

    match result {
        Ok(result) => {
            let rendered = if compact {
                serde_json::to_string(&result)
            } else {
                serde_json::to_string_pretty(&result)
            };
            match rendered {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_word_forms(word: &str, normal: bool) -> i32 {
    let processor = build_processor(1);
    if normal {
        match processor.normal_form(word).await {
            Ok(form) => {
                println!("{}", form);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    } else {
        match processor.word_forms(word).await {
            Ok(forms) => {
                for form in forms {
                    println!("{}", form);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Process {
            file,
            graph,
            options,
            all_subthemes,
            workers,
            compact,
        } => cmd_process(file, graph, &options, all_subthemes, workers, compact).await,
        Commands::WordForms { word, normal } => cmd_word_forms(&word, normal).await,
    };
    std::process::exit(code);
}
