//! Servidor web Axum com WebSocket e console interativo para o etiquetador POS

use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use pos_core::{
    corpus::demo_corpus,
    cross_validation::{CrossValidationReport, CrossValidator, FoldReport},
    tagger::tokenize,
    Corpus, PosError, PosTagger, TaggerConfig, ViterbiStep, DEFAULT_UNKNOWN_VALUE,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pos-web")]
#[command(about = "Etiquetador POS com HMM: servidor, avaliação e console")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    corpus: CorpusArgs,
}

#[derive(Args)]
struct CorpusArgs {
    /// Arquivo de palavras (uma sentença por linha)
    #[arg(long, env = "POS_WORDS", default_value = "inputs/brown-words.txt")]
    words: PathBuf,

    /// Arquivo de tags alinhado ao de palavras
    #[arg(long, env = "POS_TAGS", default_value = "inputs/brown-tags.txt")]
    tags: PathBuf,

    /// Usa o corpus de demonstração embutido em vez dos arquivos
    #[arg(long, env = "POS_DEMO")]
    demo: bool,

    /// Log-probabilidade para palavras desconhecidas
    #[arg(long, env = "POS_UNKNOWN_VALUE", default_value_t = DEFAULT_UNKNOWN_VALUE, allow_hyphen_values = true)]
    unknown_value: f64,

    /// Partições da validação cruzada
    #[arg(long, env = "POS_FOLDS", default_value_t = 5)]
    folds: usize,

    /// Sentenças usadas na validação cruzada
    #[arg(long, env = "POS_LIMIT", default_value_t = 1000)]
    limit: usize,
}

impl CorpusArgs {
    fn config(&self) -> TaggerConfig {
        TaggerConfig {
            unknown_value: self.unknown_value,
            folds: self.folds,
            limit: self.limit,
        }
    }

    fn load(&self) -> Result<Corpus> {
        if self.demo {
            return Ok(demo_corpus());
        }
        Corpus::load(&self.words, &self.tags).with_context(|| {
            format!(
                "failed to load corpus from {} and {}",
                self.words.display(),
                self.tags.display()
            )
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sobe o servidor HTTP/WebSocket
    Serve {
        #[arg(short, long, env = "POS_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },
    /// Roda a validação cruzada e imprime o relatório
    Evaluate,
    /// Etiqueta sentenças digitadas no console ("return" para sair)
    Repl,
}

/// Estado compartilhado da aplicação
struct AppState {
    tagger: PosTagger,
    corpus: Corpus,
}

#[derive(Deserialize)]
struct TagRequest {
    text: String,
}

#[derive(Serialize)]
struct TagResponse {
    tokens: Vec<String>,
    tags: Vec<String>,
    best_score: f64,
    steps: Vec<ViterbiStep>,
}

#[derive(Deserialize)]
struct CrossValidateParams {
    folds: Option<usize>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct CrossValidateResponse {
    average_accuracy: Option<f64>,
    skipped_folds: Vec<usize>,
    folds: Vec<FoldReport>,
}

impl From<CrossValidationReport> for CrossValidateResponse {
    fn from(report: CrossValidationReport) -> Self {
        Self {
            average_accuracy: report.average_accuracy().ok(),
            skipped_folds: report.skipped_folds().iter().map(|f| f.fold).collect(),
            folds: report.folds,
        }
    }
}

#[derive(Serialize)]
struct ModelSummary {
    tags: Vec<String>,
    vocabulary_size: usize,
    unknown_value: f64,
    training_sentences: usize,
}

/// Eventos enviados pelo WebSocket durante a decodificação
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum WsEvent {
    ViterbiStep(ViterbiStep),
    Done { tags: Vec<String>, best_score: f64 },
    Error { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.corpus.config();
    let corpus = cli.corpus.load()?;
    info!(sentences = corpus.len(), "corpus ready");

    match cli.command {
        Commands::Serve { bind } => serve(corpus, config, bind).await,
        Commands::Evaluate => evaluate(&corpus, &config),
        Commands::Repl => repl(&corpus, config),
    }
}

fn build_tagger(corpus: &Corpus, config: TaggerConfig) -> PosTagger {
    let mut tagger = PosTagger::new(config);
    tagger.train(&corpus.sentences, corpus.len());
    tagger
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/tag", post(tag_handler))
        .route("/cross-validate", get(cross_validate_handler))
        .route("/model", get(model_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

async fn serve(corpus: Corpus, config: TaggerConfig, bind: SocketAddr) -> Result<()> {
    let tagger = build_tagger(&corpus, config);
    let state = Arc::new(AppState { tagger, corpus });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("🚀 Servidor POS iniciado em http://{bind}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn evaluate(corpus: &Corpus, config: &TaggerConfig) -> Result<()> {
    let report = CrossValidator::from_config(config).run(&corpus.sentences)?;

    for fold in &report.folds {
        match fold.accuracy() {
            Some(accuracy) => println!(
                "fold {}: {:.2}% ({} train / {} test)",
                fold.fold, accuracy, fold.train_sentences, fold.test_sentences
            ),
            None => println!("fold {}: skipped", fold.fold),
        }
    }
    let skipped = report.skipped_folds();
    if !skipped.is_empty() {
        warn!(count = skipped.len(), "some folds were skipped");
    }
    println!("Average accuracy is {:.2}%", report.average_accuracy()?);
    Ok(())
}

fn repl(corpus: &Corpus, config: TaggerConfig) -> Result<()> {
    let tagger = build_tagger(corpus, config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("To quit the program, type return in answer to a question");
    loop {
        print!("\nPlease enter a sentence: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let sentence = line.trim();
        if sentence == "return" {
            println!("\nBye!");
            break;
        }

        println!("\n{sentence}");
        match tagger.tag(sentence) {
            Ok(tags) => println!("{tags:?}"),
            Err(err) => println!("could not tag sentence: {err}"),
        }
    }
    Ok(())
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Etiquetagem via HTTP POST
async fn tag_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TagRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Texto vazio"})),
        )
            .into_response();
    }

    match state.tagger.tag_with_trace(&req.text) {
        Ok(result) => Json(TagResponse {
            tokens: tokenize(&req.text),
            tags: result.best_sequence,
            best_score: result.best_score,
            steps: result.steps,
        })
        .into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
    }
}

/// Validação cruzada sob demanda (roda fora do runtime async)
async fn cross_validate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CrossValidateParams>,
) -> impl IntoResponse {
    let defaults = *state.tagger.config();
    let config = TaggerConfig {
        folds: params.folds.unwrap_or(defaults.folds),
        limit: params.limit.unwrap_or(defaults.limit),
        ..defaults
    };

    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        CrossValidator::from_config(&config).run(&worker.corpus.sentences)
    })
    .await;

    match result {
        Ok(Ok(report)) => Json(CrossValidateResponse::from(report)).into_response(),
        Ok(Err(err @ PosError::InvalidFoldCount)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        Ok(Err(err)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        Err(join_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": join_err.to_string()})),
        )
            .into_response(),
    }
}

/// Resumo do modelo treinado
async fn model_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.tagger.model();
    Json(ModelSummary {
        tags: model.tags().into_iter().map(str::to_string).collect(),
        vocabulary_size: model.vocabulary_size(),
        unknown_value: model.unknown_value(),
        training_sentences: state.corpus.len(),
    })
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Recebe texto, decodifica e envia cada passo do Viterbi como evento
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // Aceita {"text": "..."} ou o texto puro
                let text = serde_json::from_str::<TagRequest>(&text)
                    .map(|req| req.text)
                    .unwrap_or_else(|_| text.to_string());
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                for event in decode_events(&state.tagger, text) {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        return; // cliente desconectou
                    }
                    // Pequena pausa para animação visual (passo a passo)
                    tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

fn decode_events(tagger: &PosTagger, text: &str) -> Vec<WsEvent> {
    match tagger.tag_with_trace(text) {
        Ok(result) => {
            let mut events: Vec<WsEvent> = result.steps.into_iter().map(WsEvent::ViterbiStep).collect();
            events.push(WsEvent::Done {
                tags: result.best_sequence,
                best_score: result.best_score,
            });
            events
        }
        Err(err) => vec![WsEvent::Error {
            message: err.to_string(),
        }],
    }
}
