use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::rt::time::timeout;
use actix_web::{delete, get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info, warn};
use serde::Deserialize;

use markov_core::model::chain_store::MemoryChainStore;
use markov_core::model::exclusions::{ExclusionKind, Exclusions};
use markov_core::{CommunityId, GENERIC_FAILURE_MESSAGE, GenerationError, MarkovEngine, Scope, StoreError};

mod config;

use config::ServerConfig;

/// Required value of `confirm` for a community erase.
const ERASE_CONFIRMATION: &str = "YES_DELETE_IT_ALL";

#[derive(Deserialize)]
struct MessageQuery {
	author: u64,
}

#[derive(Deserialize)]
struct GenerateQuery {
	author: Option<u64>,
}

#[derive(Deserialize)]
struct EraseQuery {
	confirm: Option<String>,
}

struct SharedData {
	engine: MarkovEngine<MemoryChainStore>,
	/// Exclusion lists per community, standing in for preference storage.
	exclusions: Mutex<HashMap<CommunityId, Exclusions>>,
	max_exclusions: usize,
	/// Overall bound of one generation request.
	generation_timeout: Duration,
}

impl SharedData {
	fn new(engine: MarkovEngine<MemoryChainStore>, generation_timeout: Duration) -> Self {
		let max_exclusions = engine.config().max_exclusions;
		Self { engine, exclusions: Mutex::new(HashMap::new()), max_exclusions, generation_timeout }
	}

	/// Copy of the community's lists, so the lock is not held during ingest.
	fn exclusions_of(&self, community: CommunityId) -> Result<Exclusions, HttpResponse> {
		let exclusions = self.exclusions.lock().map_err(|_| lock_failed())?;
		Ok(exclusions
			.get(&community)
			.cloned()
			.unwrap_or_else(|| Exclusions::with_limit(self.max_exclusions)))
	}
}

fn lock_failed() -> HttpResponse {
	HttpResponse::InternalServerError().body("Exclusion lock failed")
}

fn storage_failed(err: StoreError) -> HttpResponse {
	error!("Chain store failure: {err}");
	HttpResponse::InternalServerError().body("Error: storage failure.")
}

/// Runs `job` on the blocking thread pool and gives up after `limit`.
///
/// Returns `None` on timeout or if the job panicked. A timed-out job keeps
/// its blocking thread until it returns.
async fn run_bounded<F, R>(limit: Duration, job: F) -> Option<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	match timeout(limit, web::block(job)).await {
		Ok(Ok(result)) => Some(result),
		Ok(Err(e)) => {
			error!("Generation job failed: {e}");
			None
		}
		Err(_) => {
			warn!("Generation gave up after {} ms", limit.as_millis());
			None
		}
	}
}

/// HTTP PUT endpoint `/v1/communities/{community}/messages?author=ID`
///
/// Ingests the request body as a message of `author`.
/// Responds `true` if the message was processed, `false` if it was filtered out.
#[put("/v1/communities/{community}/messages")]
async fn put_message(
	data: web::Data<SharedData>,
	path: web::Path<CommunityId>,
	query: web::Query<MessageQuery>,
	body: String,
) -> impl Responder {
	let community = path.into_inner();
	let exclusions = match data.exclusions_of(community) {
		Ok(e) => e,
		Err(response) => return response,
	};

	// Each committed pair is synced to the journal, so keep it off the async workers.
	let author = query.author;
	let shared = data.clone();
	match web::block(move || shared.engine.ingest(&body, community, author, &exclusions)).await {
		Ok(Ok(processed)) => HttpResponse::Ok().body(processed.to_string()),
		Ok(Err(e)) => storage_failed(e),
		Err(e) => {
			error!("Ingest job failed: {e}");
			HttpResponse::InternalServerError().body("Error: storage failure.")
		}
	}
}

/// HTTP GET endpoint `/v1/communities/{community}/generate[?author=ID]`
///
/// Generates a message from the community chain, or from the author chain
/// when `author` is given. The walk runs off the async workers, bounded by
/// `generation_timeout_ms`.
#[get("/v1/communities/{community}/generate")]
async fn get_generated(
	data: web::Data<SharedData>,
	path: web::Path<CommunityId>,
	query: web::Query<GenerateQuery>,
) -> impl Responder {
	let scope = Scope::for_member(path.into_inner(), query.author);

	let shared = data.clone();
	let Some(result) = run_bounded(data.generation_timeout, move || shared.engine.generate(scope)).await else {
		return HttpResponse::InternalServerError().body(GENERIC_FAILURE_MESSAGE);
	};
	match result {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e @ GenerationError::EmptyCorpus(_)) => HttpResponse::NotFound().body(e.user_message()),
		Err(e) => {
			// Consistency violations are already logged by the engine.
			if let GenerationError::Store(store_error) = &e {
				error!("Chain store failure while generating for {scope}: {store_error}");
			}
			HttpResponse::InternalServerError().body(e.user_message())
		}
	}
}

/// HTTP DELETE endpoint `/v1/communities/{community}?confirm=YES_DELETE_IT_ALL`
///
/// Erases every chain of the community, then compacts the journal into the snapshot.
#[delete("/v1/communities/{community}")]
async fn delete_community(
	data: web::Data<SharedData>,
	path: web::Path<CommunityId>,
	query: web::Query<EraseQuery>,
) -> impl Responder {
	if query.confirm.as_deref() != Some(ERASE_CONFIRMATION) {
		return HttpResponse::BadRequest().body(format!(
			"This will delete all markov data for this community. Repeat with ?confirm={ERASE_CONFIRMATION} if you are sure."
		));
	}

	let community = path.into_inner();
	if let Err(e) = data.engine.erase_scope_data(community) {
		return storage_failed(e);
	}
	// Already durable through the journal.
	if let Err(e) = data.engine.store().flush() {
		warn!("Snapshot after erasing community {community} failed: {e}");
	}
	HttpResponse::Ok().body("All markov data for this community has been deleted.")
}

/// HTTP GET endpoint `/v1/communities/{community}/exclusions/{kind}`
///
/// Lists the strings as `id. "string"` lines, ids starting at 1.
#[get("/v1/communities/{community}/exclusions/{kind}")]
async fn get_exclusions(data: web::Data<SharedData>, path: web::Path<(CommunityId, ExclusionKind)>) -> impl Responder {
	let (community, kind) = path.into_inner();
	let exclusions = match data.exclusions_of(community) {
		Ok(e) => e,
		Err(response) => return response,
	};

	let list = exclusions.list(kind);
	if list.is_empty() {
		return HttpResponse::Ok().body("No results.");
	}
	let text: String = list.list().iter().map(|(id, string)| format!("{id}. {string:?}\n")).collect();
	HttpResponse::Ok().body(text)
}

/// HTTP PUT endpoint `/v1/communities/{community}/exclusions/{kind}`
///
/// Appends the request body to the list.
#[put("/v1/communities/{community}/exclusions/{kind}")]
async fn put_exclusion(
	data: web::Data<SharedData>,
	path: web::Path<(CommunityId, ExclusionKind)>,
	body: String,
) -> impl Responder {
	let (community, kind) = path.into_inner();
	let mut exclusions = match data.exclusions.lock() {
		Ok(m) => m,
		Err(_) => return lock_failed(),
	};

	let max_exclusions = data.max_exclusions;
	let lists = exclusions.entry(community).or_insert_with(|| Exclusions::with_limit(max_exclusions));
	let list = lists.list_mut(kind);
	match list.add(&body) {
		Ok(()) => HttpResponse::Ok().body(format!("Added to the {kind} list ({}/{}).", list.len(), list.limit())),
		Err(e) => HttpResponse::BadRequest().body(format!("Error: {e}.")),
	}
}

/// HTTP DELETE endpoint `/v1/communities/{community}/exclusions/{kind}/{id}`
#[delete("/v1/communities/{community}/exclusions/{kind}/{id}")]
async fn delete_exclusion(
	data: web::Data<SharedData>,
	path: web::Path<(CommunityId, ExclusionKind, usize)>,
) -> impl Responder {
	let (community, kind, id) = path.into_inner();
	let mut exclusions = match data.exclusions.lock() {
		Ok(m) => m,
		Err(_) => return lock_failed(),
	};

	let removed = match exclusions.get_mut(&community) {
		Some(lists) => lists.list_mut(kind).remove(id),
		None => Err(markov_core::ExclusionError::InvalidId(id)),
	};
	match removed {
		Ok(string) => HttpResponse::Ok().body(format!("Removed {string:?} from the {kind} list.")),
		Err(e) => HttpResponse::BadRequest().body(format!("Error: {e}.")),
	}
}

/// HTTP PUT endpoint `/v1/snapshot`
///
/// Saves the chain store to its snapshot file now and empties the journal.
#[put("/v1/snapshot")]
async fn put_snapshot(data: web::Data<SharedData>) -> impl Responder {
	match data.engine.store().flush() {
		Ok(()) => HttpResponse::Ok().body("Snapshot saved"),
		Err(e) => storage_failed(e),
	}
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(put_message)
		.service(get_generated)
		.service(delete_community)
		.service(get_exclusions)
		.service(put_exclusion)
		.service(delete_exclusion)
		.service(put_snapshot);
}

/// Main entry point for the server.
///
/// Loads the configuration from `MARKOV_CONFIG`, opens the chain snapshot
/// and journal, serves until interrupted, then saves the snapshot.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env().map_err(|e| std::io::Error::other(format!("Invalid configuration: {e}")))?;
	let engine = match &config.snapshot_path {
		Some(path) => MarkovEngine::open(path, config.chain.clone()).map_err(std::io::Error::other)?,
		None => MarkovEngine::in_memory(config.chain.clone()),
	};

	let generation_timeout = Duration::from_millis(config.generation_timeout_ms);
	let shared_data = web::Data::new(SharedData::new(engine, generation_timeout));
	let app_data = shared_data.clone();
	let permissive_cors = config.permissive_cors;

	info!("Listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		let cors = if permissive_cors { Cors::permissive() } else { Cors::default() };
		App::new().wrap(cors).app_data(app_data.clone()).configure(configure)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await?;

	if let Err(e) = shared_data.engine.store().flush() {
		error!("Failed to save chain snapshot on shutdown: {e}");
	}
	Ok(())
}
