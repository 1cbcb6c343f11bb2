use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, put, web};
use log::{info, warn};
use serde::Deserialize;

use markov_gen_core::MarkovError;
use markov_gen_core::io::{CORPUS_EXTENSIONS, find_corpus, list_files};
use markov_gen_core::model::generation_input::{GenerationInput, Policy};
use markov_gen_core::model::generator::StartSeed;
use markov_gen_core::model::markov_model::MarkovModel;
use markov_gen_core::model::tokenizer::TokenizerMode;

mod config;

use config::ServerConfig;

/// Query parameters shared by `/v1/generate` and `/v1/batch`
#[derive(Deserialize)]
struct GenerateParams {
	policy: Option<Policy>,
	max_steps: Option<usize>,
	mode: Option<TokenizerMode>,
	extend: Option<bool>,
	compact: Option<bool>,
	seed: Option<String> // -> none / start, starter:<word> or context:<w1 w2 ..>
}

#[derive(Deserialize)]
struct BatchQuery {
	count: Option<usize>
}

#[derive(Deserialize)]
struct SimilarQuery {
	sentence: String
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
	order: Option<usize>
}

struct SharedData {
	model: MarkovModel
}

impl GenerateParams {
	/// Determines the starting seed strategy for the extendable policy.
	fn start_seed(&self) -> Result<StartSeed, String> {
		match &self.seed {
			None => Ok(StartSeed::SentenceStart),
			Some(s) if s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("start") => Ok(StartSeed::SentenceStart),
			Some(s) if s.to_lowercase().starts_with("starter:") => {
				Ok(StartSeed::Starter(s["starter:".len()..].to_owned()))
			}
			Some(s) if s.to_lowercase().starts_with("context:") => {
				let context: Vec<String> = s["context:".len()..]
					.split_whitespace()
					.map(str::to_owned)
					.collect();
				Ok(StartSeed::Context(context))
			}
			Some(_) => Err("Seed must start with 'starter:' or 'context:' or be 'none'".into()),
		}
	}

	fn generation_input(&self) -> Result<GenerationInput, String> {
		let mut input = GenerationInput::default();
		if let Some(policy) = self.policy { input.policy = policy; }
		if let Some(max_steps) = self.max_steps { input.max_steps = max_steps; }
		if let Some(mode) = self.mode { input.mode = mode; }
		input.extend = self.extend.unwrap_or(false);
		input.compact = self.compact.unwrap_or(false);
		input.set_start_seed(self.start_seed()?).map_err(|e| e.to_string())?;
		Ok(input)
	}
}

/// Maps core failures to HTTP statuses.
fn error_response(e: &MarkovError) -> HttpResponse {
	match e {
		MarkovError::StarterNotFound { .. } | MarkovError::StarterCannotLead { .. } => {
			HttpResponse::NotFound().body(e.to_string())
		}
		MarkovError::InvalidInput(_) | MarkovError::OrderMismatch { .. } => HttpResponse::BadRequest().body(e.to_string()),
		MarkovError::EmptyCorpus => HttpResponse::Conflict().body(e.to_string()),
		MarkovError::Io(_) | MarkovError::Json { .. } => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates one sentence from the loaded model.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = match query.generation_input() {
		Ok(input) => input,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	if shared_data.model.is_empty() {
		return HttpResponse::Conflict().body("No corpus loaded");
	}

	match shared_data.model.generate(&input, &mut rand::rng()) {
		Ok(sentence) => HttpResponse::Ok().body(sentence.render(input.compact)),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/batch`
///
/// Generates `count` sentences in parallel, one per line.
#[get("/v1/batch")]
async fn get_batch(
	data: web::Data<Mutex<SharedData>>,
	config: web::Data<ServerConfig>,
	query: web::Query<GenerateParams>,
	batch: web::Query<BatchQuery>,
) -> impl Responder {
	let count = batch.count.unwrap_or(10);
	if count > config.max_batch {
		return HttpResponse::BadRequest().body(format!("count must be <= {}", config.max_batch));
	}
	let input = match query.generation_input() {
		Ok(input) => input,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	if shared_data.model.is_empty() {
		return HttpResponse::Conflict().body("No corpus loaded");
	}

	match shared_data.model.generate_many(count, &input, &mut rand::rng()) {
		Ok(sentences) => HttpResponse::Ok().body(
			sentences.iter().map(|s| s.render(input.compact)).collect::<Vec<_>>().join("\n")
		),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/similar`
///
/// Returns the closest corpus sentence as JSON.
#[get("/v1/similar")]
async fn get_similar(data: web::Data<Mutex<SharedData>>, query: web::Query<SimilarQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.most_similar_sentence(&query.sentence) {
		Ok(result) => HttpResponse::Ok().json(result),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(config: web::Data<ServerConfig>) -> impl Responder {
	match list_files(&config.data_dir, &CORPUS_EXTENSIONS) {
		Ok(files) => HttpResponse::Ok().body(files.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora")
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model.corpus_names().join("\n"))
}

/// HTTP PUT endpoint `/v1/load_corpora`
///
/// Replaces the loaded model with one built from the named corpora.
#[put("/v1/load_corpora")]
async fn put_corpora(
	data: web::Data<Mutex<SharedData>>,
	config: web::Data<ServerConfig>,
	query: web::Query<CorpusQuery>,
) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	let order = query.order.unwrap_or(config.order);
	if order < 1 {
		return HttpResponse::BadRequest().body("order must be >= 1");
	}

	let corpus_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();
	if corpus_names.is_empty() {
		return HttpResponse::BadRequest().body("No corpus name in the list");
	}

	let mut model = MarkovModel::empty(order);
	for name in corpus_names {
		let corpus_path = match find_corpus(&config.data_dir, name) {
			Ok(path) => path,
			Err(e) => return HttpResponse::NotFound().body(format!("Failed to find corpus: {e}"))
		};
		let partial_model = match MarkovModel::from_file(&corpus_path, order) {
			Ok(m) => m,
			Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}"))
		};
		if let Err(e) = model.merge(&partial_model) {
			return HttpResponse::InternalServerError().body(format!("Failed to merge corpus: {e}"));
		}
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	info!("loaded corpora {:?} with order {}", model.corpus_names(), order);
	shared_data.model = model;

	HttpResponse::Ok().body("Corpora loaded successfully")
}

/// Main entry point for the server.
///
/// Reads the config (see `ServerConfig::from_env`), starts with an empty
/// model and serves the endpoints until stopped. Corpora are loaded with
/// `PUT /v1/load_corpora`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = match ServerConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			warn!("{e}, falling back to defaults");
			ServerConfig::default()
		}
	};
	let bind = (config.host.clone(), config.port);

	let shared_model = web::Data::new(Mutex::new(SharedData {
		model: MarkovModel::empty(config.order),
	}));
	let shared_config = web::Data::new(config);

	info!("listening on {}:{}", bind.0, bind.1);
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.app_data(shared_config.clone())
			.service(get_generated)
			.service(get_batch)
			.service(get_similar)
			.service(get_corpora)
			.service(get_loaded_corpora)
			.service(put_corpora)
	})
		.bind(bind)?
		.run()
		.await
}
