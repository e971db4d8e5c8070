use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use textmining::config::Config;
use textmining::corpus::{load_corpus, Corpus, RootNotFound, Selection};
use textmining::db::{self, CacheOutcome, CorpusStore};
use textmining::frequency::{grouped_frequency, FrequencyScope};
use textmining::output::{self, terminal};
use textmining::sentiment::{grouped_sentiment, LexiconScorer, SentimentScope};
use textmining::similarity::{
    similarity_matrices, EmbeddingCosine, SentenceEmbedder, SimilarityMatrix, TfIdfCosine,
};
use textmining::summary::{inspect_text, summarize_documents, TfIdfSummarizer};
use textmining::topics::{
    corpus_topic_table, project_topics, LdaConfig, ProjectedPoint, TopicFit, TsneConfig,
};

/// textmining: corpus analytics for student reflection documents.
///
/// Loads markdown reflections (one file per student per assignment) and
/// reports word frequencies, sentiment, pairwise similarity, topics and
/// summaries.
#[derive(Parser)]
#[command(name = "textmining", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to load documents from and which of them to analyze.
#[derive(Args)]
struct CorpusArgs {
    /// Document roots, comma-separated or repeated (default: TEXTMINING_DIRS)
    #[arg(long = "dir", value_delimiter = ',')]
    dirs: Vec<PathBuf>,

    /// Assignments to analyze (default: all)
    #[arg(long = "assignment", value_delimiter = ',')]
    assignments: Vec<String>,

    /// Restrict to these students
    #[arg(long = "student", value_delimiter = ',')]
    students: Vec<String>,

    /// Restrict question-level analyses to these labels (repeat for several)
    #[arg(long = "question")]
    questions: Vec<String>,

    /// Ignore the cached corpus and re-parse every document
    #[arg(long)]
    refresh: bool,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FrequencyScopeArg {
    Corpus,
    Assignment,
    Student,
    Question,
}

impl From<FrequencyScopeArg> for FrequencyScope {
    fn from(arg: FrequencyScopeArg) -> Self {
        match arg {
            FrequencyScopeArg::Corpus => FrequencyScope::Corpus,
            FrequencyScopeArg::Assignment => FrequencyScope::Assignment,
            FrequencyScopeArg::Student => FrequencyScope::Student,
            FrequencyScopeArg::Question => FrequencyScope::Question,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SentimentScopeArg {
    Document,
    Student,
    Question,
}

impl From<SentimentScopeArg> for SentimentScope {
    fn from(arg: SentimentScopeArg) -> Self {
        match arg {
            SentimentScopeArg::Document => SentimentScope::Document,
            SentimentScopeArg::Student => SentimentScope::Student,
            SentimentScopeArg::Question => SentimentScope::Question,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    /// Lexical overlap (TF-IDF cosine)
    Tfidf,
    /// Semantic overlap (sentence embeddings; needs download-model)
    Embedding,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the corpus and show what was found
    Load {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Most frequent words
    Frequency {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, value_enum, default_value = "corpus")]
        scope: FrequencyScopeArg,

        /// Words per group
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Sentiment polarity per document, student or question
    Sentiment {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, value_enum, default_value = "document")]
        scope: SentimentScopeArg,
    },

    /// Pairwise similarity between students within each assignment
    Similarity {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, value_enum, default_value = "tfidf")]
        metric: MetricArg,
    },

    /// Fit a topic model, optionally projecting documents to 2D
    Topics {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Number of topics
        #[arg(long, default_value = "5")]
        topics: usize,

        /// Terms reported per topic
        #[arg(long, default_value = "5")]
        words: usize,

        #[arg(long, default_value = "500")]
        seed: u64,

        /// Sampling iteration cap (at most 10000)
        #[arg(long, default_value = "1000")]
        iterations: usize,

        /// Also compute the 2D projection
        #[arg(long)]
        project: bool,

        /// Projection accuracy trade-off (0 is exact)
        #[arg(long, default_value = "0.5")]
        angle: f64,

        /// Minimum dominant-topic weight for a document to be projected
        #[arg(long, default_value = "0.35")]
        threshold: f64,
    },

    /// Extractive summary of each document
    Summary {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Sentences kept per summary
        #[arg(long, default_value = "3")]
        sentences: usize,
    },

    /// Tokens, sentiment and summary of a single text (a file path, `-` for
    /// stdin, or the text itself)
    Text {
        input: String,

        #[arg(long, default_value = "3")]
        sentences: usize,

        #[arg(long)]
        json: bool,
    },

    /// Download the sentence embedding model (~90 MB)
    DownloadModel,

    /// Inspect or invalidate the corpus cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show configuration, cache and model status
    Status,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached corpus
    Clear,
    /// Remove the cached corpus for a set of roots
    Forget {
        /// Roots exactly as they were loaded (default: TEXTMINING_DIRS)
        #[arg(value_delimiter = ',')]
        dirs: Vec<PathBuf>,
    },
    /// List cached corpora
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct TopicsReport<'a> {
    #[serde(flatten)]
    fit: &'a TopicFit,
    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<&'a [ProjectedPoint]>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("textmining=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if let Some(not_found) = err.downcast_ref::<RootNotFound>() {
            eprintln!("{} {}\n", "Error:".red().bold(), not_found);
            Cli::command().print_help()?;
            std::process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Load { corpus: args } => {
            let config = Config::load()?;
            let (corpus, outcome) = load(&config, &args)?;
            if args.json {
                output::print_json(&corpus)?;
            } else {
                terminal::display_corpus_overview(&corpus, Some(outcome));
            }
        }

        Commands::Frequency {
            corpus: args,
            scope,
            top,
        } => {
            let config = Config::load()?;
            let (corpus, _) = load(&config, &args)?;
            let selection = selection(&corpus, &args);
            let groups = grouped_frequency(&corpus, &selection, scope.into(), top);
            if args.json {
                output::print_json(&groups)?;
            } else {
                terminal::display_frequency(&groups);
            }
        }

        Commands::Sentiment {
            corpus: args,
            scope,
        } => {
            let config = Config::load()?;
            let (corpus, _) = load(&config, &args)?;
            let selection = selection(&corpus, &args);
            let rows = grouped_sentiment(
                &corpus,
                &selection,
                scope.into(),
                &LexiconScorer::default(),
            );
            if args.json {
                output::print_json(&rows)?;
            } else {
                terminal::display_sentiment(&rows);
            }
        }

        Commands::Similarity {
            corpus: args,
            metric,
        } => {
            let config = Config::load()?;
            let (corpus, _) = load(&config, &args)?;
            let selection = selection(&corpus, &args);
            let matrices = similarity(&config, &corpus, &selection, metric)?;
            if args.json {
                output::print_json(&matrices)?;
            } else {
                terminal::display_similarity(&matrices);
            }
        }

        Commands::Topics {
            corpus: args,
            topics,
            words,
            seed,
            iterations,
            project,
            angle,
            threshold,
        } => {
            let config = Config::load()?;
            let (corpus, _) = load(&config, &args)?;
            let selection = selection(&corpus, &args);

            let lda = LdaConfig {
                num_topics: topics,
                words_per_topic: words,
                max_iterations: iterations,
                seed,
                ..LdaConfig::default()
            };
            let fit = corpus_topic_table(&corpus, &selection, &lda)?;

            let points = project.then(|| {
                let tsne = TsneConfig {
                    seed,
                    angle,
                    confidence_threshold: threshold,
                    ..TsneConfig::default()
                };
                project_topics(&fit, &tsne)
            });

            if args.json {
                output::print_json(&TopicsReport {
                    fit: &fit,
                    projection: points.as_deref(),
                })?;
            } else {
                terminal::display_topics(&fit);
                if let Some(points) = &points {
                    terminal::display_projection(points, &fit);
                }
            }
        }

        Commands::Summary {
            corpus: args,
            sentences,
        } => {
            let config = Config::load()?;
            let (corpus, _) = load(&config, &args)?;
            let selection = selection(&corpus, &args);
            let summarizer = TfIdfSummarizer {
                max_sentences: sentences,
            };
            let rows = summarize_documents(&corpus, &selection, &summarizer)?;
            if args.json {
                output::print_json(&rows)?;
            } else {
                terminal::display_summaries(&rows);
            }
        }

        Commands::Text {
            input,
            sentences,
            json,
        } => {
            let text = read_input(&input)?;
            let summarizer = TfIdfSummarizer {
                max_sentences: sentences,
            };
            let report = inspect_text(&text, &summarizer)?;
            if json {
                output::print_json(&report)?;
            } else {
                terminal::display_inspection(&report);
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading sentence embedding model...");
            println!("  Destination: {}", model_dir.display());

            textmining::similarity::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `textmining similarity --metric embedding`.");
        }

        Commands::Cache { action } => {
            let config = Config::load()?;
            let store = db::open_store(&config.cache_path)?;
            match action {
                CacheAction::Clear => {
                    let removed = store.clear()?;
                    println!("Removed {removed} cached corpora.");
                }
                CacheAction::Forget { dirs } => {
                    let roots = resolve_roots(&config, &dirs)?;
                    if db::forget_roots(&store, &roots)? {
                        println!("Forgot cached corpus.");
                    } else {
                        println!("No cached corpus for those roots.");
                    }
                }
                CacheAction::List { json } => {
                    let entries = store.list()?;
                    if json {
                        output::print_json(&entries)?;
                    } else {
                        terminal::display_cache_entries(&entries);
                    }
                }
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            textmining::status::show(&config)?;
        }
    }

    Ok(())
}

/// Roots from the command line, else from TEXTMINING_DIRS.
fn resolve_roots(config: &Config, dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let roots = if dirs.is_empty() {
        config.default_roots.clone()
    } else {
        dirs.to_vec()
    };
    if roots.is_empty() {
        anyhow::bail!("No document roots given. Pass --dir <path> or set TEXTMINING_DIRS.");
    }
    Ok(roots)
}

/// Load the corpus through the cache unless caching is turned off.
fn load(config: &Config, args: &CorpusArgs) -> Result<(Corpus, CacheOutcome)> {
    let roots = resolve_roots(config, &args.dirs)?;
    if config.no_cache {
        return Ok((load_corpus(&roots)?, CacheOutcome::Bypassed));
    }
    let store = db::open_store(&config.cache_path)?;
    let (corpus, outcome) = db::load_corpus_cached(&store, &roots, args.refresh)?;
    info!(%outcome, documents = corpus.len(), "Corpus ready");
    Ok((corpus, outcome))
}

/// Every assignment unless `--assignment` narrows it.
fn selection(corpus: &Corpus, args: &CorpusArgs) -> Selection {
    let selection = if args.assignments.is_empty() {
        Selection::all(corpus)
    } else {
        Selection::assignments(args.assignments.iter().cloned())
    };
    selection
        .with_students(args.students.iter().cloned())
        .with_questions(args.questions.iter().cloned())
}

/// Semantic similarity when the embedding model is available, lexical
/// otherwise.
fn similarity(
    config: &Config,
    corpus: &Corpus,
    selection: &Selection,
    metric: MetricArg,
) -> Result<Vec<SimilarityMatrix>> {
    if metric == MetricArg::Embedding {
        let embedder = config
            .require_embedder()
            .and_then(|_| SentenceEmbedder::load(&config.embedding_dir()));
        match embedder {
            Ok(embedder) => {
                info!("Loaded sentence embedding model");
                return similarity_matrices(corpus, selection, &EmbeddingCosine::new(embedder));
            }
            Err(e) => {
                warn!(error = %e, "Embedding model unavailable, falling back to TF-IDF");
                eprintln!(
                    "{} embedding model unavailable, using TF-IDF similarity instead.",
                    "Warning:".yellow()
                );
                eprintln!(
                    "{}",
                    "Run `textmining download-model` to enable semantic similarity.".dimmed()
                );
            }
        }
    }
    similarity_matrices(corpus, selection, &TfIdfCosine)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    let path = PathBuf::from(input);
    if path.is_file() {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(input.to_string())
}
