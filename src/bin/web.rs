//! Single binary web server: JSON REST API over the tournament engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Admin routes accept actors listed in ADMIN_ACTORS (comma separated); the
//! acting identity comes from the X-Actor header.

use actix_web::{
    delete, get, post, put,
    web::{Bytes, Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use dart_tournament_engine::{
    adjust_legs, authorize, complete_match, correct_score, edit_tournament, force_complete_match,
    record_legs, reset_match, select_qualifiers, start_match, start_playoffs, start_tournament,
    tournament_standings, MatchId, MatchResult, PlayerId, Side, StaticAdmins, TournamentConfig,
    TournamentEdit, TournamentError, TournamentId, TournamentStore,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

struct AppState {
    store: TournamentStore,
    admins: StaticAdmins,
}

type State = Data<AppState>;

/// Default inactivity threshold: tournaments not accessed for this long are removed.
const DEFAULT_INACTIVITY_HOURS: u64 = 12;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    config: TournamentConfig,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct LegsBody {
    legs_1: u32,
    legs_2: u32,
}

#[derive(Deserialize)]
struct AdjustLegsBody {
    side: Side,
    delta: i32,
}

#[derive(Deserialize)]
struct ForceCompleteBody {
    winner: Side,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and player id
#[derive(Deserialize)]
struct TournamentPlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

/// Path segments: tournament id and match id
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Unauthorized { .. } => HttpResponse::Forbidden().json(body),
        TournamentError::TournamentNotFound(_)
        | TournamentError::MatchNotFound(_)
        | TournamentError::PlayerNotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::Conflict(_) | TournamentError::DuplicatePlayerName(_) => {
            HttpResponse::Conflict().json(body)
        }
        TournamentError::LockPoisoned => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn actor(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Actor")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "dart-tournament-engine",
    })
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: State, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(state.store.create(body.name, body.config))
}

/// Get a tournament by id (404 if not found). Touching it refreshes last activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.store.snapshot(path.id))
}

/// Add a player (tournament must be in Registration).
#[post("/api/tournaments/{id}/players")]
async fn api_add_player(state: State, path: Path<TournamentPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        e.tournament.add_player(body.name.trim())?;
        Ok(e.tournament.clone())
    }))
}

/// Register players from a CSV body with a `name` column.
#[post("/api/tournaments/{id}/players/import")]
async fn api_import_players(state: State, path: Path<TournamentPath>, body: Bytes) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        e.tournament.import_players_csv(body.as_ref())?;
        Ok(e.tournament.clone())
    }))
}

/// Remove a player by id (tournament must be in Registration).
#[delete("/api/tournaments/{id}/players/{player_id}")]
async fn api_remove_player(state: State, path: Path<TournamentPlayerPath>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        e.tournament.remove_player(path.player_id)?;
        Ok(e.tournament.clone())
    }))
}

/// Start the tournament (Registration -> Active, groups and schedules created).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        start_tournament(&mut e.tournament)?;
        Ok(e.tournament.clone())
    }))
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.store.read(path.id, |e| tournament_standings(&e.tournament)))
}

#[get("/api/tournaments/{id}/qualifiers")]
async fn api_qualifiers(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.store.read(path.id, |e| select_qualifiers(&e.tournament)).and_then(|r| r))
}

#[post("/api/tournaments/{id}/matches/{match_id}/start")]
async fn api_start_match(state: State, path: Path<TournamentMatchPath>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        start_match(&mut e.tournament, path.match_id)?;
        Ok(e.tournament.clone())
    }))
}

/// Live leg count; reaching the target completes the match.
#[put("/api/tournaments/{id}/matches/{match_id}/legs")]
async fn api_record_legs(state: State, path: Path<TournamentMatchPath>, body: Json<LegsBody>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        record_legs(&mut e.tournament, path.match_id, body.legs_1, body.legs_2)?;
        Ok(e.tournament.clone())
    }))
}

/// Submit a final result. Re-sending the same result is harmless.
#[post("/api/tournaments/{id}/matches/{match_id}/complete")]
async fn api_complete_match(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<MatchResult>,
) -> HttpResponse {
    let result = body.into_inner();
    respond(state.store.mutate(path.id, |e| {
        let outcome = complete_match(&mut e.tournament, path.match_id, result)?;
        Ok(serde_json::json!({ "outcome": outcome, "tournament": e.tournament }))
    }))
}

/// Seed the playoff bracket from the final group standings (once).
#[post("/api/tournaments/{id}/playoffs/start")]
async fn api_start_playoffs(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.store.mutate(path.id, |e| {
        start_playoffs(&mut e.tournament)?;
        Ok(e.tournament.clone())
    }))
}

#[post("/api/admin/tournaments/{id}/matches/{match_id}/reset")]
async fn api_admin_reset_match(state: State, req: HttpRequest, path: Path<TournamentMatchPath>) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    respond(state.store.mutate(path.id, |e| {
        reset_match(&mut e.tournament, &capability, &mut e.audit, path.match_id)
    }))
}

#[put("/api/admin/tournaments/{id}/matches/{match_id}/score")]
async fn api_admin_correct_score(
    state: State,
    req: HttpRequest,
    path: Path<TournamentMatchPath>,
    body: Json<LegsBody>,
) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    respond(state.store.mutate(path.id, |e| {
        correct_score(
            &mut e.tournament,
            &capability,
            &mut e.audit,
            path.match_id,
            body.legs_1,
            body.legs_2,
        )
    }))
}

#[post("/api/admin/tournaments/{id}/matches/{match_id}/adjust")]
async fn api_admin_adjust_legs(
    state: State,
    req: HttpRequest,
    path: Path<TournamentMatchPath>,
    body: Json<AdjustLegsBody>,
) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    respond(state.store.mutate(path.id, |e| {
        adjust_legs(
            &mut e.tournament,
            &capability,
            &mut e.audit,
            path.match_id,
            body.side,
            body.delta,
        )
    }))
}

#[post("/api/admin/tournaments/{id}/matches/{match_id}/force-complete")]
async fn api_admin_force_complete(
    state: State,
    req: HttpRequest,
    path: Path<TournamentMatchPath>,
    body: Json<ForceCompleteBody>,
) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    respond(state.store.mutate(path.id, |e| {
        force_complete_match(&mut e.tournament, &capability, &mut e.audit, path.match_id, body.winner)
    }))
}

#[put("/api/admin/tournaments/{id}")]
async fn api_admin_edit_tournament(
    state: State,
    req: HttpRequest,
    path: Path<TournamentPath>,
    body: Json<TournamentEdit>,
) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    let edit = body.into_inner();
    respond(state.store.mutate(path.id, |e| {
        edit_tournament(&mut e.tournament, &capability, &mut e.audit, edit)
    }))
}

#[delete("/api/admin/tournaments/{id}")]
async fn api_admin_delete_tournament(state: State, req: HttpRequest, path: Path<TournamentPath>) -> HttpResponse {
    let capability = match authorize(&state.admins, &actor(&req)) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    respond(state.store.delete(path.id, &capability))
}

#[get("/api/admin/tournaments/{id}/audit")]
async fn api_admin_audit(state: State, req: HttpRequest, path: Path<TournamentPath>) -> HttpResponse {
    if let Err(e) = authorize(&state.admins, &actor(&req)) {
        return error_response(&e);
    }
    respond(state.store.read(path.id, |e| e.audit.entries().to_vec()))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let inactivity_hours: u64 = std::env::var("INACTIVITY_TIMEOUT_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or(DEFAULT_INACTIVITY_HOURS);
    let admins = StaticAdmins::from_list(&std::env::var("ADMIN_ACTORS").unwrap_or_default());
    if admins.is_empty() {
        log::warn!("ADMIN_ACTORS is empty; admin routes will reject every request");
    }

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(AppState {
        store: TournamentStore::new(),
        admins,
    });

    // Background task: every 30 minutes, remove tournaments inactive for too long
    let state_cleanup = state.clone();
    let inactivity = Duration::from_secs(inactivity_hours * 3600);
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let removed = state_cleanup.store.purge_inactive(inactivity);
            if removed > 0 {
                log::info!(
                    "Cleaned up {} inactive tournament(s) (no activity for {}h)",
                    removed,
                    inactivity_hours
                );
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_player)
            .service(api_import_players)
            .service(api_remove_player)
            .service(api_start_tournament)
            .service(api_standings)
            .service(api_qualifiers)
            .service(api_start_match)
            .service(api_record_legs)
            .service(api_complete_match)
            .service(api_start_playoffs)
            .service(api_admin_reset_match)
            .service(api_admin_correct_score)
            .service(api_admin_adjust_legs)
            .service(api_admin_force_complete)
            .service(api_admin_edit_tournament)
            .service(api_admin_delete_tournament)
            .service(api_admin_audit)
    })
    .bind(bind)?
    .run()
    .await
}
