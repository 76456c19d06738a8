use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use log::info;
use serde::{Deserialize, Serialize};

use lyrics_gen_core::corpus::{list_corpus_files, read_corpus};
use lyrics_gen_core::model::prediction_input::{OutputMode, PredictionInput};
use lyrics_gen_core::model::sampler::Flatten;
use lyrics_gen_core::{Generator, GeneratorConfig, ModelError};

mod config;

use config::{ServerConfig, load_config};

/// Extension of saved model files.
const MODEL_EXTENSION: &str = "lgm";

const MAX_COUNT: usize = 50;
const MAX_LENGTH: usize = 500;
const MAX_LINES: usize = 50;
const MAX_ORDER: usize = 5;

/// Query parameters of the `/v1/generate` endpoint
#[derive(Deserialize, Default)]
struct GenerateParams {
	seed: Option<String>,
	count: Option<usize>,
	max_length: Option<usize>,
	temperature: Option<f64>,
	flatten: Option<String>, // "distinct" or "power_law"
	lines: Option<usize>,    // verse mode if set
}

#[derive(Deserialize)]
struct TrainQuery {
	names: Option<String>,
	order: Option<usize>,
	backoff: Option<bool>,
}

#[derive(Deserialize)]
struct NameQuery {
	name: Option<String>,
}

#[derive(Serialize)]
struct Status {
	order: usize,
	orders: Vec<usize>,
	backoff: bool,
	contexts: usize,
	starts: usize,
}

struct SharedData {
	config: ServerConfig,
	generator: Option<Generator>,
}

impl GenerateParams {
	/// Validates the parameters and builds the generation input.
	fn prediction_input(&self) -> Result<PredictionInput, String> {
		let mut input = PredictionInput::default();

		if let Some(count) = self.count {
			if !(1..=MAX_COUNT).contains(&count) {
				return Err(format!("count must be between 1 and {MAX_COUNT}"));
			}
			input.count = count;
		}
		if let Some(max_length) = self.max_length {
			if !(1..=MAX_LENGTH).contains(&max_length) {
				return Err(format!("max_length must be between 1 and {MAX_LENGTH}"));
			}
			input.max_length = max_length;
		}
		if let Some(temperature) = self.temperature {
			input.set_temperature(temperature).map_err(|e| e.to_string())?;
		}
		input.flatten = match self.flatten.as_deref().map(str::to_lowercase).as_deref() {
			None | Some("distinct") => Flatten::Distinct,
			Some("power_law") => Flatten::PowerLaw,
			Some(other) => return Err(format!("unknown flatten policy '{other}'")),
		};
		if let Some(lines) = self.lines {
			if !(1..=MAX_LINES).contains(&lines) {
				return Err(format!("lines must be between 1 and {MAX_LINES}"));
			}
			input.mode = OutputMode::verse(lines);
		}
		if let Some(seed) = &self.seed {
			input.set_seed(seed);
		}

		Ok(input)
	}
}

/// Rejects names that could escape the configured folders.
fn checked_name(name: &str) -> Result<&str, String> {
	let name = name.trim();
	if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
		return Err(format!("invalid name '{name}'"));
	}
	Ok(name)
}

fn model_file(config: &ServerConfig, name: &str) -> PathBuf {
	config.model_path().join(format!("{name}.{MODEL_EXTENSION}"))
}

/// Maps core errors to HTTP responses.
fn error_response(error: ModelError) -> HttpResponse {
	match error {
		ModelError::Untrained => HttpResponse::Conflict().body(error.to_string()),
		ModelError::Corrupt(_) => HttpResponse::UnprocessableEntity().body(error.to_string()),
		ModelError::InvalidOrder(_) | ModelError::InvalidTemperature(_) | ModelError::OrderMismatch { .. } => {
			HttpResponse::BadRequest().body(error.to_string())
		}
		ModelError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
			HttpResponse::NotFound().body(error.to_string())
		}
		ModelError::Io(_) => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates lyrics with the current model based on query parameters.
/// Returns a JSON array of strings.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = match query.prediction_input() {
		Ok(input) => input,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let Some(generator) = &shared_data.generator else {
		return HttpResponse::Conflict().body("No model loaded, train or load one first");
	};

	match generator.generate(&input) {
		Ok(lines) => HttpResponse::Ok().json(lines),
		Err(e) => error_response(e),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let config = &shared_data.config;

	let names: Vec<String> = list_corpus_files(config.data_path(), &config.generator.corpus)
		.iter()
		.filter_map(|path| path.file_name())
		.map(|name| name.to_string_lossy().to_string())
		.collect();
	HttpResponse::Ok().json(names)
}

#[get("/v1/status")]
async fn get_status(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match &shared_data.generator {
		Some(generator) => {
			let model = generator.model();
			HttpResponse::Ok().json(Status {
				order: model.max_order(),
				orders: model.orders(),
				backoff: model.has_backoff(),
				contexts: model.primary().len(),
				starts: model.primary().starts().len(),
			})
		}
		None => HttpResponse::NotFound().body("No model loaded"),
	}
}

/// HTTP PUT endpoint `/v1/train`
///
/// Replaces the current model by one trained on the named corpus files.
#[put("/v1/train")]
async fn put_train(data: web::Data<Mutex<SharedData>>, query: web::Query<TrainQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let mut generator_config: GeneratorConfig = shared_data.config.generator.clone();
	if let Some(order) = query.order {
		if !(1..=MAX_ORDER).contains(&order) {
			return HttpResponse::BadRequest().body(format!("order must be between 1 and {MAX_ORDER}"));
		}
		generator_config.order = order;
	}
	if let Some(backoff) = query.backoff {
		generator_config.backoff = backoff;
	}

	let data_path = shared_data.config.data_path();
	let mut sentences = Vec::new();
	for name in query_names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
		let name = match checked_name(name) {
			Ok(name) => name,
			Err(e) => return HttpResponse::BadRequest().body(e),
		};
		sentences.extend(read_corpus(data_path.join(name), &generator_config.corpus));
	}

	if sentences.is_empty() {
		return HttpResponse::UnprocessableEntity().body("Nothing to train on");
	}

	let mut generator = match Generator::new(&generator_config) {
		Ok(generator) => generator,
		Err(e) => return error_response(e),
	};
	generator.train(&sentences);
	info!("trained order {} generator on {} sentences", generator_config.order, sentences.len());

	shared_data.generator = Some(generator);
	HttpResponse::Ok().body(format!("Model trained on {} sentences", sentences.len()))
}

#[put("/v1/save")]
async fn put_save(data: web::Data<Mutex<SharedData>>, query: web::Query<NameQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let name = match checked_name(query.name.as_deref().unwrap_or_default()) {
		Ok(name) => name,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let Some(generator) = &shared_data.generator else {
		return HttpResponse::Conflict().body("No model loaded");
	};

	match generator.save(model_file(&shared_data.config, name)) {
		Ok(()) => HttpResponse::Ok().body("Model saved successfully"),
		Err(e) => error_response(e),
	}
}

#[put("/v1/load")]
async fn put_load(data: web::Data<Mutex<SharedData>>, query: web::Query<NameQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let name = match checked_name(query.name.as_deref().unwrap_or_default()) {
		Ok(name) => name,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let path = model_file(&shared_data.config, name);
	match Generator::load(path, shared_data.config.generator.tokenizer) {
		Ok(generator) => {
			shared_data.generator = Some(generator);
			HttpResponse::Ok().body("Model loaded successfully")
		}
		Err(e) => error_response(e),
	}
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_corpora)
		.service(get_status)
		.service(put_train)
		.service(put_save)
		.service(put_load);
}

/// Main entry point for the server.
///
/// Reads the configuration, wraps the shared generator in a `Mutex` and
/// starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = load_config();
	let address = (config.host.clone(), config.port);
	info!("serving corpora from {} on {}:{}", config.data_path().display(), address.0, address.1);

	let shared_data = SharedData { config, generator: None };
	let shared_model = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_model.clone())
			.configure(configure)
	})
		.bind(address)?
		.run()
		.await
}
